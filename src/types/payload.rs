//! This module defines `Payload`, the owned byte buffer that crosses the public
//! pipeline boundary in both directions.

use std::borrow::Cow;
use std::fmt;

/// An owned, contiguous run of bytes with an explicit length.
///
/// There is no terminator: interior `\0` bytes are ordinary data. The empty
/// payload doubles as the failure signal of the compatibility API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Payload {
    bytes: Vec<u8>,
}

impl Payload {
    /// The canonical empty payload.
    pub fn empty() -> Self {
        Self { bytes: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The payload as UTF-8, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Self {
            bytes: s.into_bytes(),
        }
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Self {
            bytes: s.as_bytes().to_vec(),
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interior_nul_is_preserved() {
        let payload = Payload::from(&b"ab\0cd"[..]);
        assert_eq!(payload.len(), 5);
        assert_eq!(payload.as_str(), Some("ab\0cd"));
    }

    #[test]
    fn test_non_utf8_has_no_str_view() {
        let payload = Payload::from(vec![0xff, 0xfe]);
        assert!(payload.as_str().is_none());
        assert_eq!(payload.to_string(), "\u{fffd}\u{fffd}");
    }

    #[test]
    fn test_empty_is_default() {
        assert_eq!(Payload::empty(), Payload::default());
        assert!(Payload::from("").is_empty());
    }
}
