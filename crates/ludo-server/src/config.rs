use std::time::Duration;

/// §6 environment variables, collected into one fallible-at-startup struct:
/// one constructor, defaults applied here rather than scattered across
/// call sites.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_expiry_secs: i64,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub redis_url: Option<String>,
    pub flush_interval: Duration,
    pub cache_ttl: Duration,
    pub move_log_ttl: Duration,
    pub move_log_max_items: usize,
    pub engagement_dice_enabled: bool,
    pub taunt_system_enabled: bool,
    pub taunt_cooldown_ms: u64,
    pub taunt_limit_per_min: u32,
    pub taunt_auto_burst_limit: u32,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env_parsed("PORT", 8080),
            cors_origins: env_or("CORS_ORIGIN", "*").split(',').map(|s| s.trim().to_string()).collect(),
            jwt_secret: env_or("JWT_SECRET", ""),
            jwt_expiry_secs: env_parsed("JWT_EXPIRY", 900),
            mongodb_uri: env_or("MONGODB_URI", "mongodb://localhost:27017"),
            mongodb_database: env_or("MONGODB_DATABASE", "ludo"),
            redis_url: std::env::var("REDIS_URL").ok(),
            flush_interval: Duration::from_millis(env_parsed("GAME_STATE_FLUSH_INTERVAL_MS", 2000)),
            cache_ttl: Duration::from_secs(env_parsed("GAME_STATE_CACHE_TTL_SECONDS", 3600)),
            move_log_ttl: Duration::from_secs(env_parsed("GAME_MOVE_LOG_TTL_SECONDS", 86_400)),
            move_log_max_items: env_parsed("GAME_MOVE_LOG_MAX_ITEMS", 300),
            engagement_dice_enabled: env_parsed("ENGAGEMENT_DICE_ENABLED", true),
            taunt_system_enabled: env_parsed("TAUNT_SYSTEM_ENABLED", true),
            taunt_cooldown_ms: env_parsed("TAUNT_COOLDOWN_MS", 5000),
            taunt_limit_per_min: env_parsed("TAUNT_LIMIT_PER_MIN", 6),
            taunt_auto_burst_limit: env_parsed("TAUNT_AUTO_BURST_LIMIT", 2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_when_unset() {
        for key in [
            "PORT", "CORS_ORIGIN", "JWT_SECRET", "JWT_EXPIRY", "MONGODB_URI", "REDIS_URL",
            "GAME_STATE_FLUSH_INTERVAL_MS", "GAME_STATE_CACHE_TTL_SECONDS",
            "GAME_MOVE_LOG_TTL_SECONDS", "GAME_MOVE_LOG_MAX_ITEMS", "ENGAGEMENT_DICE_ENABLED",
            "TAUNT_SYSTEM_ENABLED", "TAUNT_COOLDOWN_MS", "TAUNT_LIMIT_PER_MIN",
            "TAUNT_AUTO_BURST_LIMIT",
        ] {
            std::env::remove_var(key);
        }
        let config = Config::from_env();
        assert_eq!(config.port, 8080);
        assert_eq!(config.flush_interval, Duration::from_secs(2));
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.move_log_max_items, 300);
        assert!(config.engagement_dice_enabled);
        assert!(config.taunt_system_enabled);
        assert!(config.redis_url.is_none());
    }
}
