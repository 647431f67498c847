use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Bad upload metadata or report fields. The caller must fix and
    /// resubmit; nothing is retried automatically.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Unparseable or empty CSV. Surfaced verbatim to the caller.
    #[error("CSV parse failed: {0}")]
    Parse(String),

    /// Aggregation failure over stored rows. The report keeps its prior
    /// status; an explicit recompute may retry.
    #[error("Summary computation failed: {0}")]
    Compute(String),

    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DashResult<T> = Result<T, DashError>;
