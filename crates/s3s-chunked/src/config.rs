//! Decoder configuration
//!
//! A [`DecoderConfig`] is built once per request body and handed to
//! [`AwsChunkedReader::new`](crate::AwsChunkedReader::new). Every field has a default,
//! so configurations can be deserialized from partial documents.
//!
//! # Example
//! ```
//! use s3s_chunked::{ChecksumAlgorithm, DecoderConfig};
//!
//! let mut config = DecoderConfig::new(1024);
//! config.checksum_algorithm = Some(ChecksumAlgorithm::Sha256);
//! config.checksum_header_name = Some("x-amz-checksum-sha256".to_owned());
//! assert!(config.validate().is_ok());
//! ```

use crate::checksum::ChecksumAlgorithm;
use crate::error::ConfigError;
use crate::utils::is_valid_header_name;

use serde::{Deserialize, Serialize};

/// Construction-time configuration of an aws-chunked decode session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct DecoderConfig {
    /// Digest computed over the decoded bytes.
    ///
    /// Default: none
    pub checksum_algorithm: Option<ChecksumAlgorithm>,

    /// Trailer header whose value is captured, e.g. `x-amz-checksum-crc32c`.
    ///
    /// The captured value is informational and never compared with the computed digest.
    ///
    /// Default: none
    pub checksum_header_name: Option<String>,

    /// Total number of payload bytes the body is expected to decode to
    /// (`x-amz-decoded-content-length`).
    ///
    /// Default: 0
    pub decoded_content_length: u64,

    /// Accept chunk headers without a `chunk-signature` extension.
    ///
    /// Default: false
    pub unsigned: bool,

    /// Maximum length of one chunk header line, including CRLF.
    ///
    /// Default: 1 KB
    pub max_chunk_meta_size: usize,

    /// Maximum total size of the trailer section.
    ///
    /// Default: 16 KB
    pub max_trailers_size: usize,

    /// Maximum number of trailer lines.
    ///
    /// Default: 100
    pub max_trailer_headers: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            checksum_algorithm: None,
            checksum_header_name: None,
            decoded_content_length: 0,
            unsigned: false,
            max_chunk_meta_size: 1024,
            max_trailers_size: 16 * 1024,
            max_trailer_headers: 100,
        }
    }
}

impl DecoderConfig {
    /// Default configuration for a body decoding to `decoded_content_length` bytes.
    #[must_use]
    pub fn new(decoded_content_length: u64) -> Self {
        Self {
            decoded_content_length,
            ..Self::default()
        }
    }

    /// Checks the configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if a limit is zero or the checksum header name is not a valid
    /// HTTP field name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_chunk_meta_size == 0 {
            return Err(ConfigError::ZeroLimit("max_chunk_meta_size"));
        }
        if self.max_trailers_size == 0 {
            return Err(ConfigError::ZeroLimit("max_trailers_size"));
        }
        if self.max_trailer_headers == 0 {
            return Err(ConfigError::ZeroLimit("max_trailer_headers"));
        }
        if let Some(name) = &self.checksum_header_name
            && !is_valid_header_name(name)
        {
            return Err(ConfigError::InvalidHeaderName(name.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DecoderConfig::default();
        assert_eq!(config.checksum_algorithm, None);
        assert_eq!(config.checksum_header_name, None);
        assert_eq!(config.decoded_content_length, 0);
        assert!(!config.unsigned);
        assert_eq!(config.max_chunk_meta_size, 1024);
        assert_eq!(config.max_trailers_size, 16 * 1024);
        assert_eq!(config.max_trailer_headers, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = DecoderConfig::new(10);
        config.max_trailer_headers = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroLimit("max_trailer_headers")));

        let mut config = DecoderConfig::new(10);
        config.checksum_header_name = Some(String::new());
        assert!(matches!(config.validate(), Err(ConfigError::InvalidHeaderName(_))));

        config.checksum_header_name = Some("x-amz-checksum sha256".to_owned());
        assert!(matches!(config.validate(), Err(ConfigError::InvalidHeaderName(_))));

        config.checksum_header_name = Some("X-Amz-Checksum-SHA256".to_owned());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn deserialize_partial() {
        let json = r#"{"checksum_algorithm":"CRC32C","decoded_content_length":66560}"#;
        let config: DecoderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.checksum_algorithm, Some(ChecksumAlgorithm::Crc32c));
        assert_eq!(config.decoded_content_length, 66560);
        assert_eq!(config.max_chunk_meta_size, 1024);

        let json = r#"{"checksum_algorithm":"MD5"}"#;
        assert!(serde_json::from_str::<DecoderConfig>(json).is_err());
    }
}
