//! Static board geometry and per-player-count color tables (§4.1).
//!
//! Nothing in this crate depends on runtime state; every function is a pure
//! lookup over compile-time constants.
mod color;
mod config;

pub use color::Color;
pub use color::color_order;
pub use config::BASE;
pub use config::BoardConfig;
pub use config::FINISHED;
pub use config::HOME_RUN_LEN;
pub use config::HOME_RUN_START;
pub use config::MAIN_TRACK_LEN;
pub use config::SAFE_INDICES;
pub use config::rem_euclid52;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_order_sizes_match_player_counts() {
        for n in 2..=6 {
            assert_eq!(color_order(n).len(), n);
        }
    }

    #[test]
    fn home_starts_are_all_distinct_and_safe() {
        let mut seen = std::collections::HashSet::new();
        for color in Color::ALL {
            let start = BoardConfig::home_start(color);
            assert!(BoardConfig::is_safe_index(start));
            assert!(seen.insert(start), "duplicate home start for {color}");
        }
    }

    #[test]
    fn entry_index_adjusted_wraps_correctly() {
        // Red's home start is 0; adjusted must wrap into [0, 52).
        let adjusted = BoardConfig::entry_index_adjusted(Color::Red);
        assert!((0..MAIN_TRACK_LEN).contains(&adjusted));
        assert_eq!(adjusted, 50);
    }
}
