use holdem_core::{EngineError, PlayerId, Seat};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("seat {0} is taken")]
    SeatTaken(Seat),

    #[error("seat {0} does not exist at this table")]
    InvalidSeat(Seat),

    #[error("player {0} is already seated")]
    AlreadySeated(PlayerId),

    #[error("the table is full")]
    TableFull,

    #[error("player {0} is not seated at this table")]
    UnknownPlayer(PlayerId),

    #[error("a hand is already in progress")]
    HandInProgress,

    #[error("no hand is in progress")]
    NoHandInProgress,

    #[error("the room has shut down")]
    RoomClosed,

    #[error("invalid table configuration: {0}")]
    Config(String),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),
}
