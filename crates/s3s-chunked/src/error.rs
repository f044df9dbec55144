use std::io;
use std::sync::Arc;

/// Errors produced while decoding an aws-chunked body.
///
/// The error is `Clone` so that a failed [`AwsChunkedReader`](crate::AwsChunkedReader)
/// can hand out the same error on every read after the failure.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum AwsChunkedError {
    /// Underlying error
    #[error("AwsChunkedError: Underlying: {0}")]
    Underlying(Arc<io::Error>),
    /// Format error
    #[error("AwsChunkedError: FormatError: {0}")]
    FormatError(FormatError),
    /// The source ended inside a chunk payload
    #[error("AwsChunkedError: Truncated: {missing} payload bytes missing")]
    Truncated { missing: u64 },
    /// Chunk metadata too large
    #[error("AwsChunkedError: ChunkMetaTooLarge: size {0} exceeds limit {1}")]
    ChunkMetaTooLarge(usize, usize),
    /// Trailers too large
    #[error("AwsChunkedError: TrailersTooLarge: size {0} exceeds limit {1}")]
    TrailersTooLarge(usize, usize),
    /// Too many trailer headers
    #[error("AwsChunkedError: TooManyTrailerHeaders: count {0} exceeds limit {1}")]
    TooManyTrailerHeaders(usize, usize),
    /// Decoded bytes disagree with the declared decoded content length
    #[error("AwsChunkedError: LengthMismatch: expected {expected} decoded bytes, got {actual}")]
    LengthMismatch { expected: u64, actual: u64 },
    /// The reader was closed before the body was fully decoded
    #[error("AwsChunkedError: Closed")]
    Closed,
}

/// The specific framing violation behind [`AwsChunkedError::FormatError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum FormatError {
    #[error("invalid chunk size")]
    InvalidChunkSize,
    #[error("missing chunk signature")]
    MissingChunkSignature,
    #[error("invalid chunk signature")]
    InvalidChunkSignature,
    #[error("line is not terminated by CRLF")]
    MissingLineTerminator,
    #[error("chunk payload is not followed by CRLF")]
    MissingChunkTerminator,
    #[error("invalid trailer line")]
    InvalidTrailerLine,
    #[error("unexpected end of stream")]
    UnexpectedEof,
}

/// Errors detected when constructing a decoder.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("ConfigError: UnknownChecksumAlgorithm: {0:?}")]
    UnknownChecksumAlgorithm(String),
    #[error("ConfigError: InvalidHeaderName: {0:?}")]
    InvalidHeaderName(String),
    #[error("ConfigError: ZeroLimit: {0} must be greater than zero")]
    ZeroLimit(&'static str),
}

impl From<FormatError> for AwsChunkedError {
    fn from(e: FormatError) -> Self {
        Self::FormatError(e)
    }
}

impl From<io::Error> for AwsChunkedError {
    fn from(e: io::Error) -> Self {
        Self::Underlying(Arc::new(e))
    }
}

impl From<AwsChunkedError> for io::Error {
    fn from(e: AwsChunkedError) -> Self {
        let kind = match &e {
            AwsChunkedError::Underlying(inner) => inner.kind(),
            AwsChunkedError::Truncated { .. } => io::ErrorKind::UnexpectedEof,
            AwsChunkedError::Closed => io::ErrorKind::NotConnected,
            _ => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_kinds() {
        let e: io::Error = AwsChunkedError::Truncated { missing: 3 }.into();
        assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof);

        let e: io::Error = AwsChunkedError::from(FormatError::InvalidChunkSize).into();
        assert_eq!(e.kind(), io::ErrorKind::InvalidData);

        let e: io::Error = AwsChunkedError::from(io::Error::from(io::ErrorKind::ConnectionReset)).into();
        assert_eq!(e.kind(), io::ErrorKind::ConnectionReset);
    }

    #[test]
    fn io_error_keeps_typed_error() {
        let e: io::Error = AwsChunkedError::Closed.into();
        let inner = e.get_ref().and_then(|e| e.downcast_ref::<AwsChunkedError>());
        assert!(matches!(inner, Some(AwsChunkedError::Closed)));
    }

    #[test]
    fn display() {
        let e = AwsChunkedError::from(FormatError::MissingChunkSignature);
        assert_eq!(e.to_string(), "AwsChunkedError: FormatError: missing chunk signature");

        let e = AwsChunkedError::ChunkMetaTooLarge(2048, 1024);
        assert!(e.to_string().contains("2048"));
    }
}
