use nom::Parser;

/// Runs a nom parser on `*input` and advances it past the consumed bytes.
pub fn consume<'a, O>(
    input: &mut &'a [u8],
    mut parser: impl Parser<&'a [u8], Output = O, Error = nom::error::Error<&'a [u8]>>,
) -> Result<O, nom::Err<nom::error::Error<&'a [u8]>>> {
    let (rest, output) = parser.parse(*input)?;
    *input = rest;
    Ok(output)
}

#[inline]
pub fn trim_ascii_whitespace(mut s: &[u8]) -> &[u8] {
    while matches!(s.first(), Some(b' ' | b'\t')) {
        s = &s[1..];
    }
    while matches!(s.last(), Some(b' ' | b'\t')) {
        s = &s[..s.len() - 1];
    }
    s
}

/// RFC 9110 `token`
pub fn is_valid_header_name(name: &str) -> bool {
    let is_tchar = |c: u8| c.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&c);
    !name.is_empty() && name.bytes().all(is_tchar)
}
