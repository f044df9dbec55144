//! aws-chunked reader

use crate::checksum::{ChecksumAccumulator, ChecksumAlgorithm};
use crate::chunk::parse_chunk_meta;
use crate::config::DecoderConfig;
use crate::error::{AwsChunkedError, ConfigError, FormatError};
use crate::trailer::{Trailers, parse_trailer_line};

use std::fmt::{self, Debug};
use std::io::{self, BufRead, BufReader, Read};

use memchr::memchr;

const TRAILER_SIGNATURE_HEADER: &str = "x-amz-trailer-signature";

/// Position of an [`AwsChunkedReader`] in the aws-chunked framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    AwaitingChunkHeader,
    DeliveringPayload,
    /// The CRLF after a chunk payload
    AwaitingChunkTerminator,
    AwaitingTrailerLine,
    Finished,
    Failed,
}

/// Progress counters of a decode session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct DecodeCounters {
    /// Expected decoded length, as configured
    pub decoded_length: u64,
    /// Payload bytes delivered so far
    pub read_decoded_length: u64,
    /// Non-terminal chunks consumed so far
    pub chunk_count: u64,
}

/// Decodes an aws-chunked body into the original payload.
///
/// The reader pulls framed bytes from `R`, hands the payload to the caller through
/// [`Read`], and feeds every delivered byte to the configured checksum. Chunk signatures
/// are parsed and discarded.
///
/// Any error is terminal: the source is dropped and every later read returns the same error.
///
/// # Example
/// ```
/// use s3s_chunked::{AwsChunkedReader, ChecksumAlgorithm, DecoderConfig};
/// use std::io::Read;
///
/// let body: &[u8] = b"5;chunk-signature=0a1b\r\nhello\r\n0;chunk-signature=2c3d\r\n\r\n";
///
/// let mut config = DecoderConfig::new(5);
/// config.checksum_algorithm = Some(ChecksumAlgorithm::Crc32);
///
/// let mut reader = AwsChunkedReader::new(body, config).unwrap();
/// let mut decoded = String::new();
/// reader.read_to_string(&mut decoded).unwrap();
///
/// assert_eq!(decoded, "hello");
/// assert_eq!(reader.chunk_count(), 1);
/// assert_eq!(reader.checksum().as_deref(), Some("NhCmhg=="));
/// ```
pub struct AwsChunkedReader<R> {
    source: Option<R>,
    config: DecoderConfig,

    state: DecodeState,
    error: Option<AwsChunkedError>,
    counters: DecodeCounters,

    /// payload bytes left in the current chunk
    remaining: u64,

    accumulator: ChecksumAccumulator,

    /// lower-cased `config.checksum_header_name`
    checksum_header_name: Option<String>,
    trailers: Option<Trailers>,
    trailer_signature: Option<String>,
    trailers_size: usize,
    trailer_count: usize,

    line: Vec<u8>,
}

impl<R> Debug for AwsChunkedReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsChunkedReader")
            .field("state", &self.state)
            .field("counters", &self.counters)
            .field("checksum_algorithm", &self.accumulator.algorithm())
            .finish_non_exhaustive()
    }
}

impl<R: BufRead> AwsChunkedReader<R> {
    /// Constructs an `AwsChunkedReader` over a buffered source.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if `config` does not validate.
    pub fn new(source: R, config: DecoderConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let accumulator = ChecksumAccumulator::new(config.checksum_algorithm);
        let checksum_header_name = config.checksum_header_name.as_deref().map(str::to_ascii_lowercase);
        let decoded_length = config.decoded_content_length;

        Ok(Self {
            source: Some(source),
            config,
            state: DecodeState::AwaitingChunkHeader,
            error: None,
            counters: DecodeCounters {
                decoded_length,
                ..DecodeCounters::default()
            },
            remaining: 0,
            accumulator,
            checksum_header_name,
            trailers: None,
            trailer_signature: None,
            trailers_size: 0,
            trailer_count: 0,
            line: Vec::new(),
        })
    }

    /// Reads decoded payload into `buf`.
    ///
    /// Returns `Ok(0)` once the body has been fully decoded.
    ///
    /// # Errors
    /// Returns the decode error. After a failure, every call returns the same error
    /// without touching the source.
    pub fn try_read(&mut self, buf: &mut [u8]) -> Result<usize, AwsChunkedError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        match self.advance(buf) {
            Ok(n) => Ok(n),
            Err(err) => {
                self.fail(err.clone());
                Err(err)
            }
        }
    }

    fn advance(&mut self, buf: &mut [u8]) -> Result<usize, AwsChunkedError> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            match self.state {
                DecodeState::AwaitingChunkHeader => self.on_chunk_header()?,
                DecodeState::DeliveringPayload => return self.on_payload(buf),
                DecodeState::AwaitingChunkTerminator => {
                    expect_crlf(self.source.as_mut().ok_or(AwsChunkedError::Closed)?)?;
                    self.state = DecodeState::AwaitingChunkHeader;
                }
                DecodeState::AwaitingTrailerLine => self.on_trailer_line()?,
                DecodeState::Finished => return Ok(0),
                DecodeState::Failed => return Err(self.error.clone().unwrap_or(AwsChunkedError::Closed)),
            }
        }
    }

    fn on_chunk_header(&mut self) -> Result<(), AwsChunkedError> {
        let source = self.source.as_mut().ok_or(AwsChunkedError::Closed)?;
        let limit = self.config.max_chunk_meta_size;
        read_line(source, &mut self.line, limit).map_err(|e| e.into_error(|size| AwsChunkedError::ChunkMetaTooLarge(size, limit)))?;

        let size = {
            let meta = parse_chunk_meta(&self.line, self.config.unsigned)?;
            tracing::trace!(?meta);
            meta.size
        };

        if size == 0 {
            if self.checksum_header_name.is_some() {
                self.trailers = Some(Trailers::default());
            }
            self.state = DecodeState::AwaitingTrailerLine;
            return Ok(());
        }

        let expected = self.counters.decoded_length;
        let actual = self.counters.read_decoded_length.saturating_add(size);
        if actual > expected {
            return Err(AwsChunkedError::LengthMismatch { expected, actual });
        }

        self.counters.chunk_count += 1;
        self.remaining = size;
        self.state = DecodeState::DeliveringPayload;
        Ok(())
    }

    fn on_payload(&mut self, buf: &mut [u8]) -> Result<usize, AwsChunkedError> {
        let source = self.source.as_mut().ok_or(AwsChunkedError::Closed)?;
        let remaining = self.remaining;

        let n = loop {
            let available = match source.fill_buf() {
                Ok(x) => x,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if available.is_empty() {
                return Err(AwsChunkedError::Truncated { missing: remaining });
            }
            let n = available.len().min(buf.len()).min(usize::try_from(remaining).unwrap_or(usize::MAX));
            buf[..n].copy_from_slice(&available[..n]);
            break n;
        };
        source.consume(n);

        let delivered = n as u64;
        self.accumulator.update(&buf[..n]);
        self.counters.read_decoded_length += delivered;
        self.remaining -= delivered;
        if self.remaining == 0 {
            self.state = DecodeState::AwaitingChunkTerminator;
        }
        Ok(n)
    }

    fn on_trailer_line(&mut self) -> Result<(), AwsChunkedError> {
        let source = self.source.as_mut().ok_or(AwsChunkedError::Closed)?;
        let limit = self.config.max_trailers_size;
        let used = self.trailers_size;
        let consumed = read_line(source, &mut self.line, limit.saturating_sub(used))
            .map_err(|e| e.into_error(|size| AwsChunkedError::TrailersTooLarge(used.saturating_add(size), limit)))?;
        self.trailers_size = used + consumed;

        if self.line.is_empty() {
            return self.finish();
        }

        self.trailer_count += 1;
        let max_headers = self.config.max_trailer_headers;
        if self.trailer_count > max_headers {
            return Err(AwsChunkedError::TooManyTrailerHeaders(self.trailer_count, max_headers));
        }

        let (name, value) = parse_trailer_line(&self.line)?;
        tracing::trace!(trailer = %name);
        if name == TRAILER_SIGNATURE_HEADER {
            self.trailer_signature = Some(value);
        } else if let Some(trailers) = &mut self.trailers {
            trailers.insert(name, value);
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), AwsChunkedError> {
        let DecodeCounters {
            decoded_length: expected,
            read_decoded_length: actual,
            chunk_count,
        } = self.counters;
        if actual != expected {
            return Err(AwsChunkedError::LengthMismatch { expected, actual });
        }

        self.state = DecodeState::Finished;
        tracing::debug!(
            chunk_count,
            decoded_length = actual,
            algorithm = ?self.accumulator.algorithm(),
            checksum = ?self.accumulator.digest(),
            trailers = ?self.trailers,
            "aws-chunked body decoded"
        );
        Ok(())
    }

    fn fail(&mut self, err: AwsChunkedError) {
        tracing::debug!(
            error = %err,
            state = ?self.state,
            chunk_count = self.counters.chunk_count,
            read_decoded_length = self.counters.read_decoded_length,
            "aws-chunked decode failed"
        );
        self.state = DecodeState::Failed;
        self.error = Some(err);
        self.source = None;
    }
}

impl<R: Read> AwsChunkedReader<BufReader<R>> {
    /// Constructs an `AwsChunkedReader` over an unbuffered source.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if `config` does not validate.
    pub fn from_read(source: R, config: DecoderConfig) -> Result<Self, ConfigError> {
        Self::new(BufReader::new(source), config)
    }
}

impl<R> AwsChunkedReader<R> {
    /// The configured checksum algorithm.
    #[must_use]
    pub fn checksum_algorithm(&self) -> Option<ChecksumAlgorithm> {
        self.accumulator.algorithm()
    }

    /// Base64 digest of the bytes delivered so far. Final once [`is_finished`](Self::is_finished).
    ///
    /// `None` if no checksum algorithm is configured.
    #[must_use]
    pub fn checksum(&self) -> Option<String> {
        self.accumulator.digest()
    }

    /// Value of the configured checksum header, as received in the trailer.
    ///
    /// This is what the sender claims; it is not compared with [`checksum`](Self::checksum).
    #[must_use]
    pub fn trailer_checksum(&self) -> Option<&str> {
        let name = self.checksum_header_name.as_deref()?;
        self.trailers.as_ref()?.get(name)
    }

    /// Trailing headers, captured only when a checksum header name is configured.
    ///
    /// `x-amz-trailer-signature` is kept apart, see [`trailer_signature`](Self::trailer_signature).
    #[must_use]
    pub fn trailers(&self) -> Option<&Trailers> {
        self.trailers.as_ref()
    }

    /// Value of `x-amz-trailer-signature`, if the sender signed its trailers. Not verified.
    #[must_use]
    pub fn trailer_signature(&self) -> Option<&str> {
        self.trailer_signature.as_deref()
    }

    #[must_use]
    pub fn state(&self) -> DecodeState {
        self.state
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state == DecodeState::Finished
    }

    #[must_use]
    pub fn counters(&self) -> DecodeCounters {
        self.counters
    }

    #[must_use]
    pub fn decoded_length(&self) -> u64 {
        self.counters.decoded_length
    }

    #[must_use]
    pub fn read_decoded_length(&self) -> u64 {
        self.counters.read_decoded_length
    }

    #[must_use]
    pub fn chunk_count(&self) -> u64 {
        self.counters.chunk_count
    }

    /// Drops the source. Reads after closing an unfinished body fail with
    /// [`AwsChunkedError::Closed`].
    pub fn close(&mut self) {
        drop(self.source.take());
        if !matches!(self.state, DecodeState::Finished | DecodeState::Failed) {
            self.state = DecodeState::Failed;
            self.error = Some(AwsChunkedError::Closed);
        }
    }

    #[must_use]
    pub fn get_ref(&self) -> Option<&R> {
        self.source.as_ref()
    }

    /// Returns the source unless it has been dropped by a failure or [`close`](Self::close).
    #[must_use]
    pub fn into_inner(self) -> Option<R> {
        self.source
    }
}

impl<R: BufRead> Read for AwsChunkedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.try_read(buf).map_err(io::Error::from)
    }
}

#[derive(Debug)]
enum LineError {
    Io(io::Error),
    Eof,
    NotCrlf,
    TooLarge(usize),
}

impl LineError {
    fn into_error(self, too_large: impl FnOnce(usize) -> AwsChunkedError) -> AwsChunkedError {
        match self {
            Self::Io(e) => e.into(),
            Self::Eof => FormatError::UnexpectedEof.into(),
            Self::NotCrlf => FormatError::MissingLineTerminator.into(),
            Self::TooLarge(size) => too_large(size),
        }
    }
}

/// Reads one CRLF-terminated line into `line`, without the CRLF.
///
/// Returns the number of bytes consumed from the source. Fails once the line, terminator
/// included, would exceed `limit` bytes.
fn read_line<R: BufRead>(source: &mut R, line: &mut Vec<u8>, limit: usize) -> Result<usize, LineError> {
    line.clear();
    loop {
        let available = match source.fill_buf() {
            Ok(x) => x,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(LineError::Io(e)),
        };
        if available.is_empty() {
            return Err(LineError::Eof);
        }

        let (len, done) = memchr(b'\n', available).map_or((available.len(), false), |idx| (idx + 1, true));

        let size = line.len().saturating_add(len);
        if size > limit {
            return Err(LineError::TooLarge(size));
        }
        line.extend_from_slice(&available[..len]);
        source.consume(len);

        if done {
            break;
        }
    }

    let consumed = line.len();
    if !line.ends_with(b"\r\n") {
        return Err(LineError::NotCrlf);
    }
    line.truncate(consumed - 2);
    Ok(consumed)
}

fn expect_crlf<R: BufRead>(source: &mut R) -> Result<(), AwsChunkedError> {
    for &expected_byte in b"\r\n" {
        let next = loop {
            match source.fill_buf() {
                Ok(x) => break x.first().copied(),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        };
        match next {
            Some(x) if x == expected_byte => source.consume(1),
            _ => return Err(FormatError::MissingChunkTerminator.into()),
        }
    }
    Ok(())
}
