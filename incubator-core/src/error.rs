#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChunkError {
    /// Malformed line image or mask geometry.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Invalid tunable parameters.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, ChunkError>;
