//! Chunk header parsing

use crate::error::FormatError;
use crate::utils::consume;

/// Chunk meta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkMeta<'a> {
    /// chunk size
    pub size: u64,
    /// Optional chunk signature.
    /// `Some` for signed chunks,
    /// `None` for unsigned streaming
    pub signature: Option<&'a [u8]>,
}

impl ChunkMeta<'_> {
    /// The zero-length chunk ending the payload.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.size == 0
    }
}

/// Parses one chunk header line, CRLF already stripped.
///
/// The accepted form is `<hex-size>;chunk-signature=<hex-signature>`. With `allow_unsigned`,
/// a bare `<hex-size>` is accepted as well.
///
/// # Errors
/// Returns the [`FormatError`] describing the first malformed part of the line.
pub fn parse_chunk_meta(mut line: &[u8], allow_unsigned: bool) -> Result<ChunkMeta<'_>, FormatError> {
    use nom::bytes::complete::{tag, take_till1, take_while1};
    use nom::combinator::all_consuming;

    let s = &mut line;

    // read size until ';'
    let size = consume(s, take_till1(|c: u8| c == b';')).map_err(|_| FormatError::InvalidChunkSize)?;
    let size = parse_hex_u64(size).ok_or(FormatError::InvalidChunkSize)?;

    if s.is_empty() {
        if allow_unsigned {
            return Ok(ChunkMeta { size, signature: None });
        }
        return Err(FormatError::MissingChunkSignature);
    }

    consume(s, tag(&b";chunk-signature="[..])).map_err(|_| FormatError::MissingChunkSignature)?;

    let signature = consume(s, all_consuming(take_while1(|c: u8| c.is_ascii_hexdigit())))
        .map_err(|_| FormatError::InvalidChunkSignature)?;

    Ok(ChunkMeta {
        size,
        signature: Some(signature),
    })
}

fn parse_hex_u64(digits: &[u8]) -> Option<u64> {
    if digits.is_empty() {
        return None;
    }
    digits.iter().try_fold(0_u64, |acc, &c| {
        let digit = char::from(c).to_digit(16)?;
        acc.checked_mul(16)?.checked_add(u64::from(digit))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIG: &str = "ad80c730a21e5b8d04586a2213dd63b9a0e99e0e2307b0ade35a65485a288648";

    fn signed(size: &str) -> String {
        format!("{size};chunk-signature={SIG}")
    }

    #[test]
    fn signed_header() {
        let line = signed("10000");
        let meta = parse_chunk_meta(line.as_bytes(), false).unwrap();
        assert_eq!(meta.size, 0x10000);
        assert_eq!(meta.signature, Some(SIG.as_bytes()));
        assert!(!meta.is_terminal());
    }

    #[test]
    fn hex_size_is_case_insensitive() {
        let upper = signed("FA0");
        let lower = signed("fa0");
        assert_eq!(parse_chunk_meta(upper.as_bytes(), false).unwrap().size, 4000);
        assert_eq!(parse_chunk_meta(lower.as_bytes(), false).unwrap().size, 4000);
    }

    #[test]
    fn terminal_chunk() {
        let line = signed("0");
        let meta = parse_chunk_meta(line.as_bytes(), false).unwrap();
        assert!(meta.is_terminal());
    }

    #[test]
    fn missing_signature() {
        assert_eq!(parse_chunk_meta(b"400", false), Err(FormatError::MissingChunkSignature));
        assert_eq!(
            parse_chunk_meta(b"400;chunk-sig=abcdef", false),
            Err(FormatError::MissingChunkSignature)
        );
        assert_eq!(parse_chunk_meta(b"400;", true), Err(FormatError::MissingChunkSignature));
    }

    #[test]
    fn unsigned_header() {
        let meta = parse_chunk_meta(b"400", true).unwrap();
        assert_eq!(meta.size, 0x400);
        assert_eq!(meta.signature, None);

        // signed headers stay valid in unsigned mode
        let line = signed("3");
        assert_eq!(parse_chunk_meta(line.as_bytes(), true).unwrap().size, 3);
    }

    #[test]
    fn invalid_size() {
        assert_eq!(parse_chunk_meta(b"", false), Err(FormatError::InvalidChunkSize));
        assert_eq!(
            parse_chunk_meta(b";chunk-signature=abcd", false),
            Err(FormatError::InvalidChunkSize)
        );
        assert_eq!(parse_chunk_meta(b"ZZZZ", true), Err(FormatError::InvalidChunkSize));
        assert_eq!(parse_chunk_meta(b" 10", true), Err(FormatError::InvalidChunkSize));
        assert_eq!(
            parse_chunk_meta(b"10000000000000000", true),
            Err(FormatError::InvalidChunkSize)
        );
    }

    #[test]
    fn invalid_signature() {
        assert_eq!(
            parse_chunk_meta(b"10;chunk-signature=", false),
            Err(FormatError::InvalidChunkSignature)
        );
        assert_eq!(
            parse_chunk_meta(b"10;chunk-signature=xyz", false),
            Err(FormatError::InvalidChunkSignature)
        );
        assert_eq!(
            parse_chunk_meta(b"10;chunk-signature=abcd ", false),
            Err(FormatError::InvalidChunkSignature)
        );
    }

    #[test]
    fn parse_hex() {
        assert_eq!(parse_hex_u64(b"0"), Some(0));
        assert_eq!(parse_hex_u64(b"ffffffffffffffff"), Some(u64::MAX));
        assert_eq!(parse_hex_u64(b"1g"), None);
        assert_eq!(parse_hex_u64(b""), None);
    }
}
