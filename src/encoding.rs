//! Binary ⇄ text transcoding used across the envelope boundary.
//!
//! All conversions are byte-exact: `text_to_bytes(bytes_to_text(b)) == b`
//! for every buffer, including the empty one.

use crate::error::CryptoError;
use base64::{Engine as _, engine::general_purpose};

/// Encode bytes as standard base64.
pub fn bytes_to_text(data: &[u8]) -> String {
    general_purpose::STANDARD.encode(data)
}

/// Decode standard base64 back into bytes.
pub fn text_to_bytes(text: &str) -> Result<Vec<u8>, CryptoError> {
    general_purpose::STANDARD
        .decode(text)
        .map_err(|e| CryptoError::Cipher(format!("invalid base64: {e}")))
}

/// Encode bytes as lowercase hex (the legacy client's salt encoding).
pub fn bytes_to_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Decode a hex string back into bytes.
pub fn hex_to_bytes(text: &str) -> Result<Vec<u8>, CryptoError> {
    hex::decode(text).map_err(|e| CryptoError::Cipher(format!("invalid hex: {e}")))
}

/// Byte buffer in the legacy 32-bit big-endian word representation.
///
/// The legacy client kept all binary data as arrays of big-endian `u32`
/// words plus a significant-byte count. `byte_len` is authoritative: the
/// final word may be only partially significant, and [`WordBuffer::to_bytes`]
/// must drop the fill bytes so irregular tails round-trip exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordBuffer {
    words: Vec<u32>,
    byte_len: usize,
}

impl WordBuffer {
    /// Pack bytes into big-endian words, zero-filling the final word.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut words = Vec::with_capacity(data.len().div_ceil(4));
        for chunk in data.chunks(4) {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            words.push(u32::from_be_bytes(word));
        }
        Self {
            words,
            byte_len: data.len(),
        }
    }

    /// Unpack back into exactly `byte_len` bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.words.len() * 4);
        for word in &self.words {
            bytes.extend_from_slice(&word.to_be_bytes());
        }
        bytes.truncate(self.byte_len);
        bytes
    }

    /// Number of significant bytes.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// The raw word view.
    pub fn words(&self) -> &[u32] {
        &self.words
    }
}
