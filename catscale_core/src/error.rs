use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("serialized record of {actual} bytes exceeds the {limit} byte buffer")]
    SerializationOverflow { limit: usize, actual: usize },
    #[error("serialization failed: {0}")]
    Serialization(String),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
