use thiserror::Error;

/// Errors raised when a session cannot be started.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("curriculum has no entries")]
    EmptyCurriculum,
}

/// Errors raised while building or loading a curriculum.
#[derive(Debug, Error)]
pub enum CurriculumError {
    #[error("level must be >= 1, got {0}")]
    InvalidLevel(u32),

    #[error("entry text cannot be empty")]
    EmptyText,

    #[error("built-in curriculum {0} not found")]
    MissingBuiltin(String),

    #[error("unable to parse curriculum json: {0}")]
    Parse(#[from] serde_json::Error),
}
