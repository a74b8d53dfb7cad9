use ludo_core::Kind;

/// Concrete §7 error surface for every coordinator operation. Each variant
/// maps to exactly one `Kind`; `ludo-server` serializes `{success:false,
/// error: <message>}` with the mapped HTTP status.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CoordinatorError {
    #[error("missing or invalid bearer token")]
    Unauthorized,
    #[error("{0}")]
    Validation(String),
    #[error("room not found")]
    RoomNotFound,
    #[error("seat not found")]
    SeatNotFound,
    #[error("token not found")]
    TokenNotFound,
    #[error("not host")]
    NotHost,
    #[error("not your turn")]
    NotYourTurn,
    #[error("winner cannot roll")]
    WinnerCannotRoll,
    #[error("winner cannot move")]
    WinnerCannotMove,
    #[error("invalid team color")]
    InvalidTeamColor,
    #[error("dice already outstanding")]
    AlreadyRolled,
    #[error("dice value does not match a valid move")]
    DiceMismatch,
    #[error("move is not in the current valid-move set")]
    InvalidMove,
    #[error("room is not joinable")]
    RoomNotJoinable,
    #[error("room is full")]
    RoomFull,
    #[error("move grace period has not expired")]
    MoveTimeNotExpired,
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoordinatorError {
    pub const fn kind(&self) -> Kind {
        match self {
            CoordinatorError::Unauthorized => Kind::Unauthorized,
            CoordinatorError::Validation(_) => Kind::Validation,
            CoordinatorError::RoomNotFound
            | CoordinatorError::SeatNotFound
            | CoordinatorError::TokenNotFound => Kind::NotFound,
            CoordinatorError::NotHost
            | CoordinatorError::NotYourTurn
            | CoordinatorError::WinnerCannotRoll
            | CoordinatorError::WinnerCannotMove
            | CoordinatorError::InvalidTeamColor => Kind::Forbidden,
            CoordinatorError::AlreadyRolled
            | CoordinatorError::DiceMismatch
            | CoordinatorError::InvalidMove
            | CoordinatorError::RoomNotJoinable
            | CoordinatorError::RoomFull
            | CoordinatorError::MoveTimeNotExpired => Kind::Conflict,
            CoordinatorError::Internal(_) => Kind::Internal,
        }
    }

    pub const fn status(&self) -> u16 {
        self.kind().status()
    }
}

impl From<ludo_store::StoreError> for CoordinatorError {
    fn from(err: ludo_store::StoreError) -> Self {
        CoordinatorError::Internal(err.to_string())
    }
}
