//! Checksum algorithms and the accumulator fed by the decoder

use crate::crypto::{Checksum, Crc32, Crc32c, Crc64Nvme, Sha1, Sha256, Sha512};
use crate::error::ConfigError;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A flexible-checksum algorithm supported by S3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum ChecksumAlgorithm {
    Crc32,
    Crc32c,
    Crc64Nvme,
    Sha1,
    Sha256,
    Sha512,
}

impl ChecksumAlgorithm {
    pub const ALL: [Self; 6] = [Self::Crc32, Self::Crc32c, Self::Crc64Nvme, Self::Sha1, Self::Sha256, Self::Sha512];

    /// Canonical upper-case name, e.g. `SHA256`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Crc32 => "CRC32",
            Self::Crc32c => "CRC32C",
            Self::Crc64Nvme => "CRC64NVME",
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = ConfigError;

    /// Accepts canonical names in any case, with or without a hyphen (`sha-256`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s.chars().filter(|&c| c != '-').map(|c| c.to_ascii_uppercase()).collect();
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == normalized)
            .ok_or_else(|| ConfigError::UnknownChecksumAlgorithm(s.to_owned()))
    }
}

impl TryFrom<String> for ChecksumAlgorithm {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Incremental digest over the decoded bytes.
///
/// `None` accepts updates and never produces a digest.
#[derive(Clone, Default)]
pub enum ChecksumAccumulator {
    #[default]
    None,
    Crc32(Crc32),
    Crc32c(Crc32c),
    Crc64Nvme(Crc64Nvme),
    Sha1(Sha1),
    Sha256(Sha256),
    Sha512(Sha512),
}

impl fmt::Debug for ChecksumAccumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ChecksumAccumulator").field(&self.algorithm()).finish()
    }
}

impl ChecksumAccumulator {
    #[must_use]
    pub fn new(algorithm: Option<ChecksumAlgorithm>) -> Self {
        match algorithm {
            None => Self::None,
            Some(ChecksumAlgorithm::Crc32) => Self::Crc32(Crc32::new()),
            Some(ChecksumAlgorithm::Crc32c) => Self::Crc32c(Crc32c::new()),
            Some(ChecksumAlgorithm::Crc64Nvme) => Self::Crc64Nvme(Crc64Nvme::new()),
            Some(ChecksumAlgorithm::Sha1) => Self::Sha1(Sha1::new()),
            Some(ChecksumAlgorithm::Sha256) => Self::Sha256(Sha256::new()),
            Some(ChecksumAlgorithm::Sha512) => Self::Sha512(Sha512::new()),
        }
    }

    #[must_use]
    pub fn algorithm(&self) -> Option<ChecksumAlgorithm> {
        match self {
            Self::None => None,
            Self::Crc32(_) => Some(ChecksumAlgorithm::Crc32),
            Self::Crc32c(_) => Some(ChecksumAlgorithm::Crc32c),
            Self::Crc64Nvme(_) => Some(ChecksumAlgorithm::Crc64Nvme),
            Self::Sha1(_) => Some(ChecksumAlgorithm::Sha1),
            Self::Sha256(_) => Some(ChecksumAlgorithm::Sha256),
            Self::Sha512(_) => Some(ChecksumAlgorithm::Sha512),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::None => {}
            Self::Crc32(h) => h.update(data),
            Self::Crc32c(h) => h.update(data),
            Self::Crc64Nvme(h) => h.update(data),
            Self::Sha1(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
        }
    }

    /// Base64 digest of everything fed so far. The accumulator keeps its state.
    #[must_use]
    pub fn digest(&self) -> Option<String> {
        fn b64<C: Checksum + Clone>(h: &C) -> String {
            base64_simd::STANDARD.encode_to_string(h.clone().finalize())
        }

        match self {
            Self::None => None,
            Self::Crc32(h) => Some(b64(h)),
            Self::Crc32c(h) => Some(b64(h)),
            Self::Crc64Nvme(h) => Some(b64(h)),
            Self::Sha1(h) => Some(b64(h)),
            Self::Sha256(h) => Some(b64(h)),
            Self::Sha512(h) => Some(b64(h)),
        }
    }
}
