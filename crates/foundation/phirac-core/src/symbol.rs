//! Symbol - the opaque token being coded
//!
//! The coder never looks inside a symbol. It needs equality, a total order,
//! hashing for lookup, and a byte form for the container.

use crate::{Error, Result};
use std::fmt::Debug;
use std::hash::Hash;

/// Container tag for `u8` symbols
pub const KIND_BYTE: u8 = 0x01;
/// Container tag for UTF-8 word symbols
pub const KIND_WORD: u8 = 0x02;
/// Container tag for raw byte-string symbols
pub const KIND_BYTE_STRING: u8 = 0x03;

/// A codable token
pub trait Symbol: Clone + Eq + Ord + Hash + Debug + Send + Sync + 'static {
    /// Tag written into the container header
    const KIND: u8;

    /// Serialized form (length-prefixed by the container)
    fn to_bytes(&self) -> Vec<u8>;

    /// Parse the serialized form
    fn from_bytes(bytes: &[u8]) -> Result<Self>;
}

impl Symbol for u8 {
    const KIND: u8 = KIND_BYTE;

    fn to_bytes(&self) -> Vec<u8> {
        vec![*self]
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        match bytes {
            [b] => Ok(*b),
            _ => Err(Error::FormatError(format!(
                "byte symbol must be 1 byte, got {}",
                bytes.len()
            ))),
        }
    }
}

impl Symbol for String {
    const KIND: u8 = KIND_WORD;

    fn to_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::FormatError(format!("word symbol is not UTF-8: {}", e)))
    }
}

impl Symbol for Vec<u8> {
    const KIND: u8 = KIND_BYTE_STRING;

    fn to_bytes(&self) -> Vec<u8> {
        self.clone()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bytes.to_vec())
    }
}
