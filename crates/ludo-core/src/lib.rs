//! Core type aliases, identifiers, and error kinds for the ludo workspace.
//!
//! This crate has no I/O and no async runtime dependency — every other crate
//! in the workspace depends on it.
mod error;
mod id;

pub use error::Kind;
pub use id::ID;
pub use id::Unique;

/// Revision counter, strictly increasing per room (§3, §5, §8).
pub type Revision = u64;
/// Absolute track index (0..51) or the extended range used for tokens (§3).
pub type Position = i8;
/// Slot index within a room (0..maxPlayers-1).
pub type Seat = usize;
/// A rolled face, 1..=6.
pub type Dice = u8;
