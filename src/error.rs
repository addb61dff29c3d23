use thiserror::Error;

/// Failure kinds surfaced across the crate's public boundary (spec.md §7).
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("initialization failed: {0}")]
    Initialization(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;
