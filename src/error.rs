use thiserror::Error;

/// Errors produced while loading data or classifying observations.
#[derive(Debug, Error)]
pub enum KnnError {
    /// A field could not be turned into a feature value or a label.
    #[error("line {line}, field {field}: cannot parse {token:?}: {reason}")]
    Parse {
        line: usize,
        field: usize,
        token: String,
        reason: String,
    },

    /// Two feature vectors that must agree in length do not.
    #[error("dimension mismatch: expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The operation needs at least one row.
    #[error("dataset is empty")]
    EmptyDataset,

    /// Strict mode only: fewer rows than requested neighbors.
    #[error("k = {k} exceeds the {available} available rows")]
    InsufficientData { k: usize, available: usize },

    #[error("k must be at least 1, got {0}")]
    InvalidK(usize),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KnnError>;
