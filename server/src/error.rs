use common::RoomId;
use common::games::side_stacker::InvalidMove;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("room {0} is not in the store")]
    MissingRoom(RoomId),
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Failures reported back to a client as `game_error`.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("Room not found")]
    RoomNotFound(RoomId),
    #[error("Game is not finished yet")]
    NotFinished,
    #[error("Replay diverged at move {sequence}: {reason}")]
    ReplayDivergence { sequence: usize, reason: InvalidMove },
    #[error("Recorded history ends before the game does")]
    IncompleteHistory,
    #[error(transparent)]
    Store(#[from] StoreError),
}
