//! Self-contained binary envelope format.
//!
//! Unlike the JSON wire form, a serialized blob carries everything but the
//! password, so a single stored object is enough to decrypt. Version-aware
//! parsing keeps old blobs readable when the layout evolves.

use crate::envelope::Envelope;
use crate::error::CryptoError;

pub mod v1;

/// Magic bytes identifying a nodesafe sealed blob ("NSAF").
pub const MAGIC: &[u8; 4] = b"NSAF";
/// Length of magic bytes.
pub const MAGIC_LEN: usize = 4;
/// Length of version field.
pub const VER_LEN: usize = 1;
/// Latest format version.
pub const CURRENT_VERSION: u8 = v1::VERSION_V1;

/// Parses a sealed blob, dispatching on its version byte.
///
/// # Errors
///
/// Returns an error if:
/// - The blob is too short
/// - The magic bytes are invalid
/// - The version is unsupported
pub fn parse(data: &[u8]) -> Result<Envelope, CryptoError> {
    if data.len() < MAGIC_LEN + VER_LEN {
        return Err(CryptoError::Cipher("sealed blob too short".into()));
    }

    if &data[..MAGIC_LEN] != MAGIC {
        return Err(CryptoError::Cipher("invalid sealed blob magic".into()));
    }

    let version = data[MAGIC_LEN];

    match version {
        1 => v1::parse(data),
        other => Err(CryptoError::Cipher(format!(
            "unsupported sealed blob version {other}"
        ))),
    }
}

/// Serializes an envelope into the current blob version.
pub fn serialize(envelope: &Envelope) -> Result<Vec<u8>, CryptoError> {
    v1::serialize(envelope)
}
