use thiserror::Error;

use crate::types::BodyId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
    #[error("level {world}:{level} is outside the playable grid")]
    InvalidLevelIndex { world: i32, level: i32 },
    #[error("a screen transition is already pending")]
    DoubleTransition,
    #[error("no such body: {0}")]
    UnknownBody(BodyId),
}

#[derive(Error, Debug)]
pub enum ProgressError {
    #[error("progress file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("progress file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
