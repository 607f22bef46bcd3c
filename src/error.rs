use thiserror::Error;

/// Errors raised by the rollup library.
///
/// Data-shape issues (bad numbers, unknown months, missing weeks) never end
/// up here; they degrade to zero or empty values instead.
#[derive(Debug, Error)]
pub enum RollupError {
    /// The caller handed over something that is not an array or an object.
    #[error("contract violation: {0}")]
    Contract(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A detail source could not produce a payload for a zone.
    #[error("fetch failed for zone {zone}: {reason}")]
    Fetch { zone: String, reason: String },
}

pub type Result<T> = std::result::Result<T, RollupError>;
