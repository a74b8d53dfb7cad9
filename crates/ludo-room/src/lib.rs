//! Room Coordinator (§4.6): lifecycle and in-game operations composing the
//! pure rule engine, the engagement dice engine, the taunt director, the
//! write-behind cache, and the realtime broadcaster under per-room mutual
//! exclusion (§5).
mod coordinator;
mod engagement;
mod error;
mod model;
mod runtime;

pub use coordinator::{
    Coordinator, CoordinatorSettings, CreateRoomRequest, JoinRoomRequest, MoveRequest,
    RollResponse, RoomSummary, TeamNamesRequest,
};
pub use error::CoordinatorError;
pub use model::{
    GameBoard, RoomSettings, RoomState, RoomStatus, Seat, SeatStatus, TauntMode, Visibility,
    WinnerEntry,
};
pub use runtime::RoomRuntime;
