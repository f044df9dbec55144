//! Trailing headers after the terminal chunk

use crate::error::FormatError;
use crate::utils::{is_valid_header_name, trim_ascii_whitespace};

use std::collections::BTreeMap;

use memchr::memchr;

/// Trailing headers received after the terminal chunk.
///
/// Names are lower-cased; a repeated name keeps the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trailers {
    map: BTreeMap<String, String>,
}

impl Trailers {
    /// Looks up a header by case-insensitive name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.map.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub(crate) fn insert(&mut self, name: String, value: String) {
        self.map.insert(name, value);
    }
}

/// Parses one `name:value` trailer line, CRLF already stripped.
///
/// Returns the lower-cased name and the value with surrounding spaces and tabs removed.
///
/// # Errors
/// Returns [`FormatError::InvalidTrailerLine`] if there is no `:`, the name is not a valid
/// header name, or the value is not UTF-8.
pub fn parse_trailer_line(line: &[u8]) -> Result<(String, String), FormatError> {
    let Some(colon_pos) = memchr(b':', line) else {
        return Err(FormatError::InvalidTrailerLine);
    };
    let (name_raw, value_raw) = line.split_at(colon_pos);
    // value_raw starts with ':'
    let value_raw = &value_raw[1..];

    let name = std::str::from_utf8(name_raw).map_err(|_| FormatError::InvalidTrailerLine)?;
    if !is_valid_header_name(name) {
        return Err(FormatError::InvalidTrailerLine);
    }
    let value = std::str::from_utf8(trim_ascii_whitespace(value_raw)).map_err(|_| FormatError::InvalidTrailerLine)?;

    Ok((name.to_ascii_lowercase(), value.to_owned()))
}
