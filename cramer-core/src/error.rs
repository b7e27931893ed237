use thiserror::Error;

#[derive(Error, Debug)]
pub enum CramerCoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid matrix dimensions: {0}")]
    InvalidDimensions(String),

    /// Allocation of a matrix/vector failed, or the OS refused a pipe or a
    /// worker process. Fatal to the current solve.
    #[error("Resource exhaustion: {0}")]
    ResourceExhaustion(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = core::result::Result<T, CramerCoreError>;
