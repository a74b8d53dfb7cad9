//! Shared opaque key-value cache (§6): Redis when configured, an in-memory
//! map otherwise. Every method is namespaced by the caller-supplied key —
//! this crate holds no knowledge of rooms, engagement, or taunts.
mod error;
mod memory;
mod redis_cache;
mod trait_def;

pub use error::CacheError;
pub use memory::MemoryCache;
pub use redis_cache::RedisCache;
pub use trait_def::{Cache, CacheExt};

pub mod keys {
    pub fn room_state(room_id: &str) -> String {
        format!("room:{room_id}:state")
    }

    pub fn room_moves(room_id: &str) -> String {
        format!("room:{room_id}:moves")
    }

    pub fn engagement_momentum(room_id: &str, player_id: &str) -> String {
        format!("engagement:{room_id}:player:{player_id}:momentum")
    }

    pub fn engagement_force_state(room_id: &str) -> String {
        format!("engagement:{room_id}:force-state")
    }

    pub fn engagement_story_director(room_id: &str) -> String {
        format!("engagement:{room_id}:story-director")
    }

    pub fn taunt_state(room_id: &str) -> String {
        format!("taunt:{room_id}:state")
    }
}
