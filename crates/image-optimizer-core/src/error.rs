use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Custom error types for the image-optimizer library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration error
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Source image has a zero-sized axis
    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Unsupported image format
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// Image bytes failed structural validation during decode
    #[error("Corrupt image data: {0}")]
    CorruptImage(String),

    /// Codec failed while producing the output buffer
    #[error("Encoding failed: {0}")]
    EncodeFailure(String),

    /// An operation exceeded its deadline
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// A worker terminated without reporting a result
    #[error("Unknown error: {0}")]
    Unknown(String),

    /// Enhancement service could not be reached or returned a server error
    #[error("Enhancement service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Enhancement service responded without a usable image payload
    #[error("Invalid enhancement response: {0}")]
    InvalidResponse(String),

    /// Enhancement service rejected the request for rate-limiting reasons
    #[error("Enhancement service rate limit exceeded")]
    RateLimited,

    /// Enhancement service rejected the API key
    #[error("Enhancement service rejected credentials")]
    Unauthorized,
}
