//! Pure, deterministic Ludo rule engine (§4.2).
//!
//! Every function here takes and returns plain values — no I/O, no shared
//! mutable state. Illegal inputs never panic or error: `find_valid_moves`
//! simply omits them, and callers (the room coordinator) are responsible for
//! turning an empty result or a rejected move into a §7 error kind.
mod engine;
mod mode;
mod team;
mod token;

pub use engine::MoveKey;
pub use engine::MoveOutcome;
pub use engine::advance_turn;
pub use engine::apply_move;
pub use engine::check_win;
pub use engine::find_valid_moves;
pub use engine::legal_move_effective_dice;
pub use engine::retains_turn;
pub use engine::send_to_base;
pub use mode::RoomMode;
pub use team::controllable_colors;
pub use team::team_of;
pub use token::Token;
pub use token::TokenStatus;
pub use token::Tokens;
pub use token::fresh_tokens;
