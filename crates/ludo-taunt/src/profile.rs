use std::time::Duration;

/// Rate-limit knobs from §6 environment variables, with their defaults.
#[derive(Debug, Clone, Copy)]
pub struct TauntProfile {
    pub cooldown: Duration,
    pub limit_per_minute: u32,
    pub auto_burst_limit: u32,
    pub auto_burst_window: Duration,
    pub revenge_window: Duration,
}

impl Default for TauntProfile {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_millis(5000),
            limit_per_minute: 6,
            auto_burst_limit: 2,
            auto_burst_window: Duration::from_secs(3),
            revenge_window: Duration::from_secs(4 * 60),
        }
    }
}
