use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecompError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Date error: {0}")]
    DateError(String),

    #[error(
        "Alignment mismatch: engine year {engine_year} paired with reference period \
         {reference_period} under an offset of {offset} year(s)"
    )]
    AlignmentMismatch {
        engine_year: i32,
        reference_period: i32,
        offset: i32,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for DecompError {
    fn from(e: serde_json::Error) -> Self {
        DecompError::SerializationError(e.to_string())
    }
}
