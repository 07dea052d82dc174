use crate::storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("round {round_id} already has a score for hole {hole_number} (golfer {golfer_id})")]
    DuplicateHole {
        round_id: i64,
        hole_number: u8,
        golfer_id: i64,
    },
    #[error("round {0} was already completed")]
    RoundAlreadyCompleted(i64),
    #[error("unknown game type: {0}")]
    UnknownGameType(String),
    #[error("db error: {0}")]
    Storage(String),
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => Self::NotFound(what),
            StorageError::DuplicateHole {
                round_id,
                hole_number,
                golfer_id,
            } => Self::DuplicateHole {
                round_id,
                hole_number,
                golfer_id,
            },
            StorageError::RoundAlreadyCompleted(round_id) => Self::RoundAlreadyCompleted(round_id),
            StorageError::Backend(msg) => Self::Storage(msg),
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
