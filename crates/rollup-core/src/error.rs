use thiserror::Error;

#[derive(Debug, Error)]
pub enum RollupError {
    #[error("record store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("query cancelled")]
    Cancelled,

    #[error("rollup deadline of {0}ms exceeded")]
    DeadlineExceeded(u64),

    #[error("malformed {record}: {reason}")]
    MalformedRow { record: String, reason: String },

    #[error("invalid filter {field}='{value}': {reason}")]
    InvalidFilter {
        field: String,
        value: String,
        reason: String,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("task join error: {0}")]
    Join(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RollupError {
    /// True for failures of the backing store that a caller should absorb
    /// rather than surface.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RollupError::StoreUnavailable(_)
                | RollupError::Cancelled
                | RollupError::DeadlineExceeded(_)
                | RollupError::Sqlite(_)
                | RollupError::Join(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RollupError>;
