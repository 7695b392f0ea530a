//! The ciphertext envelope: everything a recipient needs besides the
//! password.
//!
//! Two representations cross process boundaries. The JSON wire form matches
//! what legacy clients exchanged out-of-band next to a raw ciphertext blob
//! (`iv`/`salt` were never embedded in the stored bytes). The self-contained
//! binary form lives in [`crate::format`].

use crate::crypto::{IV_LEN, KeyDerivation, SALT_LEN};
use crate::encoding::{bytes_to_hex, bytes_to_text, hex_to_bytes, text_to_bytes};
use crate::error::CryptoError;
use serde::{Deserialize, Serialize};

/// Suffix the original client appended to uploaded ciphertext names.
const ENCRYPTED_SUFFIX: &str = ".encrypted";

/// Immutable bundle of ciphertext and its non-secret parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    kdf: KeyDerivation,
    salt: [u8; SALT_LEN],
    iv: [u8; IV_LEN],
    ciphertext: Vec<u8>,
    original_name: Option<String>,
}

impl Envelope {
    pub fn new(
        kdf: KeyDerivation,
        salt: [u8; SALT_LEN],
        iv: [u8; IV_LEN],
        ciphertext: Vec<u8>,
        original_name: Option<String>,
    ) -> Self {
        Self {
            kdf,
            salt,
            iv,
            ciphertext,
            original_name,
        }
    }

    pub fn kdf(&self) -> KeyDerivation {
        self.kdf
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn original_name(&self) -> Option<&str> {
        self.original_name.as_deref()
    }

    /// Name the stored ciphertext blob should carry, e.g. `report.pdf.encrypted`.
    pub fn transport_name(&self) -> String {
        match &self.original_name {
            Some(name) => format!("{name}{ENCRYPTED_SUFFIX}"),
            None => format!("blob{ENCRYPTED_SUFFIX}"),
        }
    }

    /// Serialize to the JSON wire form.
    pub fn to_json(&self) -> Result<String, CryptoError> {
        let wire = WireEnvelope {
            ciphertext: bytes_to_text(&self.ciphertext),
            iv: bytes_to_text(&self.iv),
            salt: bytes_to_hex(&self.salt),
            original_name: self.original_name.clone(),
            kdf: match self.kdf {
                KeyDerivation::LegacyConcat => None,
                KeyDerivation::Pbkdf2 { .. } => Some("pbkdf2".into()),
            },
            iterations: match self.kdf {
                KeyDerivation::LegacyConcat => None,
                KeyDerivation::Pbkdf2 { iterations } => Some(iterations),
            },
        };
        serde_json::to_string(&wire)
            .map_err(|e| CryptoError::Cipher(format!("envelope serialization failed: {e}")))
    }

    /// Parse the JSON wire form. A missing `kdf` field means the payload was
    /// produced by a legacy client.
    pub fn from_json(json: &str) -> Result<Self, CryptoError> {
        let wire: WireEnvelope = serde_json::from_str(json)
            .map_err(|e| CryptoError::Cipher(format!("malformed envelope: {e}")))?;

        let kdf = match wire.kdf.as_deref() {
            None | Some("legacy") => KeyDerivation::LegacyConcat,
            Some("pbkdf2") => {
                let kdf = KeyDerivation::Pbkdf2 {
                    iterations: wire.iterations.unwrap_or(crate::crypto::DEFAULT_ITERATIONS),
                };
                kdf.validate()?;
                kdf
            }
            Some(other) => {
                return Err(CryptoError::Cipher(format!(
                    "unknown key derivation '{other}'"
                )));
            }
        };

        let salt = decode_salt(&wire.salt)?;
        let iv: [u8; IV_LEN] = text_to_bytes(&wire.iv)?
            .try_into()
            .map_err(|_| CryptoError::Cipher("invalid IV length in envelope".into()))?;
        let ciphertext = text_to_bytes(&wire.ciphertext)?;

        Ok(Self {
            kdf,
            salt,
            iv,
            ciphertext,
            original_name: wire.original_name,
        })
    }
}

/// Strip the `.encrypted` suffix a transport name carries, if any.
pub fn strip_encrypted_suffix(name: &str) -> &str {
    name.strip_suffix(ENCRYPTED_SUFFIX).unwrap_or(name)
}

/// Legacy clients wrote the salt as hex; some newer ones used base64.
fn decode_salt(text: &str) -> Result<[u8; SALT_LEN], CryptoError> {
    let bytes = hex_to_bytes(text).or_else(|_| text_to_bytes(text))?;
    bytes
        .try_into()
        .map_err(|_| CryptoError::Cipher("invalid salt length in envelope".into()))
}

#[derive(Serialize, Deserialize)]
struct WireEnvelope {
    ciphertext: String,
    iv: String,
    salt: String,
    #[serde(rename = "originalName", default, skip_serializing_if = "Option::is_none")]
    original_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kdf: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iterations: Option<u32>,
}
