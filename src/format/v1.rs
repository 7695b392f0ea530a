//! Sealed blob format v1.
//!
//! V1 Blob Layout:
//! ```text
//! MAGIC (4) | VERSION (1) | KDF_ID (1) | ITERATIONS (4) | NAME_LEN (2) | NAME | SALT (16) | IV (16) | CIPHERTEXT
//! ```

use super::{MAGIC, MAGIC_LEN, VER_LEN};
use crate::crypto::{IV_LEN, KeyDerivation, SALT_LEN};
use crate::envelope::Envelope;
use crate::error::CryptoError;

/// Current blob format version.
pub const VERSION_V1: u8 = 1;

const KDF_LEN: usize = 1;
const ITER_LEN: usize = 4;
const NAME_LEN_LEN: usize = 2;

const FIXED_LEN: usize =
    MAGIC_LEN + VER_LEN + KDF_LEN + ITER_LEN + NAME_LEN_LEN + SALT_LEN + IV_LEN;

fn corrupt(msg: &str) -> CryptoError {
    CryptoError::Cipher(msg.into())
}

/// Parses a v1 sealed blob.
///
/// # Errors
///
/// Returns an error if the blob is truncated or carries invalid parameters.
pub fn parse(data: &[u8]) -> Result<Envelope, CryptoError> {
    if data.len() < FIXED_LEN {
        return Err(corrupt("blob too short for v1"));
    }

    let mut offset = MAGIC_LEN + VER_LEN;

    let kdf_id = data[offset];
    offset += KDF_LEN;

    let iterations = u32::from_le_bytes(
        data[offset..offset + ITER_LEN]
            .try_into()
            .map_err(|_| corrupt("invalid iteration field"))?,
    );
    offset += ITER_LEN;

    let name_len = u16::from_le_bytes(
        data[offset..offset + NAME_LEN_LEN]
            .try_into()
            .map_err(|_| corrupt("invalid name length field"))?,
    ) as usize;
    offset += NAME_LEN_LEN;

    if data.len() < FIXED_LEN + name_len {
        return Err(corrupt("blob truncated inside name"));
    }

    let original_name = if name_len == 0 {
        None
    } else {
        let name = std::str::from_utf8(&data[offset..offset + name_len])
            .map_err(|_| corrupt("name is not valid UTF-8"))?;
        Some(name.to_string())
    };
    offset += name_len;

    let salt: [u8; SALT_LEN] = data[offset..offset + SALT_LEN]
        .try_into()
        .map_err(|_| corrupt("invalid salt length"))?;
    offset += SALT_LEN;

    let iv: [u8; IV_LEN] = data[offset..offset + IV_LEN]
        .try_into()
        .map_err(|_| corrupt("invalid IV length"))?;
    offset += IV_LEN;

    let ciphertext = data[offset..].to_vec();

    let kdf = KeyDerivation::from_wire(kdf_id, iterations)?;

    Ok(Envelope::new(kdf, salt, iv, ciphertext, original_name))
}

/// Serializes an envelope to v1 blob bytes.
///
/// # Errors
///
/// Returns an error if the original name does not fit the 2-byte length field.
pub fn serialize(envelope: &Envelope) -> Result<Vec<u8>, CryptoError> {
    let name = envelope.original_name().unwrap_or("");
    let name_len = u16::try_from(name.len())
        .map_err(|_| corrupt("original name longer than 65535 bytes"))?;

    let mut buf = Vec::with_capacity(FIXED_LEN + name.len() + envelope.ciphertext().len());

    buf.extend_from_slice(MAGIC);
    buf.push(VERSION_V1);

    buf.push(envelope.kdf().id());
    buf.extend_from_slice(&envelope.kdf().iterations().to_le_bytes());

    buf.extend_from_slice(&name_len.to_le_bytes());
    buf.extend_from_slice(name.as_bytes());

    buf.extend_from_slice(envelope.salt());
    buf.extend_from_slice(envelope.iv());
    buf.extend_from_slice(envelope.ciphertext());

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: Option<&str>) -> Envelope {
        Envelope::new(
            KeyDerivation::Pbkdf2 { iterations: 100_000 },
            [1u8; SALT_LEN],
            [2u8; IV_LEN],
            vec![0xAB; 48],
            name.map(String::from),
        )
    }

    #[test]
    fn blob_roundtrip() {
        let envelope = sample(Some("notes.txt"));

        let bytes = serialize(&envelope).unwrap();
        let parsed = crate::format::parse(&bytes).unwrap();

        assert_eq!(parsed, envelope);
    }

    #[test]
    fn blob_roundtrip_without_name() {
        let envelope = sample(None);

        let bytes = serialize(&envelope).unwrap();
        let parsed = crate::format::parse(&bytes).unwrap();

        assert_eq!(parsed.original_name(), None);
        assert_eq!(parsed, envelope);
    }

    #[test]
    fn legacy_kdf_survives_roundtrip() {
        let envelope = Envelope::new(
            KeyDerivation::LegacyConcat,
            [3u8; SALT_LEN],
            [4u8; IV_LEN],
            vec![0xCD; 16],
            None,
        );

        let parsed = crate::format::parse(&serialize(&envelope).unwrap()).unwrap();
        assert_eq!(parsed.kdf(), KeyDerivation::LegacyConcat);
    }

    #[test]
    fn blob_invalid_magic_fails() {
        let mut data = serialize(&sample(None)).unwrap();
        data[..4].copy_from_slice(b"FAIL");

        assert!(crate::format::parse(&data).is_err());
    }

    #[test]
    fn blob_unsupported_version_fails() {
        let mut data = serialize(&sample(None)).unwrap();
        data[4] = 99;

        assert!(crate::format::parse(&data).is_err());
    }

    #[test]
    fn blob_too_short_fails() {
        let data = serialize(&sample(None)).unwrap();
        assert!(crate::format::parse(&data[..FIXED_LEN - 1]).is_err());
    }

    #[test]
    fn blob_truncated_inside_name_fails() {
        let data = serialize(&sample(Some("a-much-longer-file-name.bin"))).unwrap();
        assert!(crate::format::parse(&data[..FIXED_LEN + 3]).is_err());
    }
}
