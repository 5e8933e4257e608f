// Error types shared by image parsing and Dockerfile editing

/// Errors raised while parsing references or editing a manifest
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A reference string does not match the image grammar
    #[error("{reference} is not a valid image")]
    Syntax { reference: String },
    /// No artifact is registered under the requested name
    #[error("could not find image {name:?}")]
    NotFound { name: String },
    /// Failure reported by the underlying reader or writer
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
