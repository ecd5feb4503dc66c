//! Input detection: raw bytes, hex text or base64 text.

use std::borrow::Cow;

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine as _;

use crate::error::{BocError, Result};
use crate::format::BocMagic;

/// Serialized bag input in one of the accepted encodings.
#[derive(Debug, Clone, Copy)]
pub enum BocSource<'a> {
    Bytes(&'a [u8]),
    /// Hex (even length, hex digits only) or base64 in either alphabet.
    Text(&'a str),
}

impl<'a> BocSource<'a> {
    /// Classify file or stdin contents: anything starting with a BOC prefix,
    /// or not valid UTF-8, is binary; everything else is text.
    pub fn sniff(data: &'a [u8]) -> Self {
        if BocMagic::detect(data) {
            return BocSource::Bytes(data);
        }
        match std::str::from_utf8(data) {
            Ok(text) => BocSource::Text(text),
            Err(_) => BocSource::Bytes(data),
        }
    }

    /// Raw serialized bytes.
    pub fn decode(self) -> Result<Cow<'a, [u8]>> {
        match self {
            BocSource::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
            BocSource::Text(text) => decode_text(text.trim()).map(Cow::Owned),
        }
    }
}

fn is_hex(text: &str) -> bool {
    !text.is_empty() && text.len() % 2 == 0 && text.bytes().all(|b| b.is_ascii_hexdigit())
}

fn decode_text(text: &str) -> Result<Vec<u8>> {
    if is_hex(text) {
        return hex::decode(text).map_err(|e| BocError::InvalidEncoding(e.to_string()));
    }
    // Fold the URL-safe alphabet onto the standard one; padding is optional.
    let normalized: String = text
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();
    STANDARD_NO_PAD
        .decode(normalized)
        .map_err(|e| BocError::InvalidEncoding(e.to_string()))
}

impl<'a> From<&'a [u8]> for BocSource<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        BocSource::Bytes(bytes)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for BocSource<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        BocSource::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for BocSource<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        BocSource::Bytes(bytes)
    }
}

impl<'a> From<&'a str> for BocSource<'a> {
    fn from(text: &'a str) -> Self {
        BocSource::Text(text)
    }
}

impl<'a> From<&'a String> for BocSource<'a> {
    fn from(text: &'a String) -> Self {
        BocSource::Text(text)
    }
}
