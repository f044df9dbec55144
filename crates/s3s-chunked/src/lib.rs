//! Streaming decoder for aws-chunked S3 upload bodies
//!
//! S3 clients that sign their payload in streaming mode (`x-amz-content-sha256:
//! STREAMING-AWS4-HMAC-SHA256-PAYLOAD[-TRAILER]`) frame the request body into
//! length-prefixed chunks:
//!
//! ```text
//! <hex-chunk-length>;chunk-signature=<hex-signature>\r\n
//! <chunk-length bytes of payload>\r\n
//! ...
//! 0;chunk-signature=<hex-signature>\r\n
//! [<trailer-header-name>:<trailer-header-value>\r\n]*
//! \r\n
//! ```
//!
//! [`AwsChunkedReader`] turns such a body back into the original payload as a plain
//! [`std::io::Read`], without buffering the body. While reading it computes a digest of the
//! decoded bytes with the configured [`ChecksumAlgorithm`].
//!
//! The decoder does not verify chunk signatures, and it does not trust the checksum a client
//! sends in the trailer: [`AwsChunkedReader::checksum`] is computed locally, and the received
//! value is only reported through [`AwsChunkedReader::trailer_checksum`].
//!
//! # Example
//!
//! ```
//! use s3s_chunked::{AwsChunkedReader, ChecksumAlgorithm, DecoderConfig};
//! use std::io::Read;
//!
//! let body: &[u8] = b"3;chunk-signature=aa\r\nabc\r\n\
//!                     0;chunk-signature=bb\r\n\
//!                     x-amz-checksum-sha256:ungWv48Bz+pBQUDeXa4iI7ADYaOWF3qctBD/YfIAFa0=\r\n\
//!                     \r\n";
//!
//! let mut config = DecoderConfig::new(3);
//! config.checksum_algorithm = Some(ChecksumAlgorithm::Sha256);
//! config.checksum_header_name = Some("x-amz-checksum-sha256".to_owned());
//!
//! let mut reader = AwsChunkedReader::new(body, config)?;
//! let mut payload = Vec::new();
//! reader.read_to_end(&mut payload)?;
//!
//! assert_eq!(payload, b"abc");
//! assert!(reader.is_finished());
//! assert_eq!(reader.checksum(), reader.trailer_checksum().map(str::to_owned));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![allow(
    clippy::bool_assert_comparison,  // I don't like `assert!(!expression)`. It's very misleading.
    clippy::multiple_crate_versions, // Sometimes not fixable
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::needless_continue,
)]

mod error;
mod utils;

pub mod checksum;
pub mod chunk;
pub mod config;
pub mod crypto;
pub mod reader;
pub mod trailer;

pub use self::checksum::{ChecksumAccumulator, ChecksumAlgorithm};
pub use self::config::DecoderConfig;
pub use self::error::*;
pub use self::reader::{AwsChunkedReader, DecodeCounters, DecodeState};
pub use self::trailer::Trailers;
