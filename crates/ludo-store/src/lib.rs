//! Write-behind game state cache and the durable-store repository (§4.5, §6).
mod cache_state;
mod error;
mod event;
mod records;
mod repository;

pub use cache_state::GameStateCache;
pub use error::StoreError;
pub use event::GameEvent;
pub use records::{RoomDocument, RoomStatePatch, SeatDocument, TeamDocument, UserDocument};
pub use repository::{connect, Repository, GAME_EVENTS, ROOMS, ROOM_PLAYERS, ROOM_TEAMS, USERS};
