use thiserror::Error;

pub type Result<T> = std::result::Result<T, GenerateError>;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("parameter '{name}' expects {expected}, got {value}")]
    Coercion {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("parameters must be a JSON object, got {0}")]
    InvalidParameters(String),

    #[error("{axis} would produce {count} bin boundaries, over the server-side cap of {limit}")]
    TooManyBins {
        axis: &'static str,
        count: u64,
        limit: u64,
    },

    #[error("Configuration file {0} not found")]
    UnknownArtifact(String),

    #[error("Configuration not found")]
    ConfigNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}
