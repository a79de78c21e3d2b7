use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid subject id: {0:?}")]
    InvalidSubject(String),

    #[error("record for subject {record:?} saved under {subject:?}")]
    SubjectMismatch { subject: String, record: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[cfg(feature = "parquet")]
    #[error("parquet error: {0}")]
    Parquet(#[from] ::parquet::errors::ParquetError),

    #[error("{0}")]
    Other(String),
}
