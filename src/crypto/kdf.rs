use super::{DEFAULT_ITERATIONS, KEY_LEN};
use crate::encoding::{WordBuffer, bytes_to_hex};
use crate::error::CryptoError;
use pbkdf2::pbkdf2_hmac;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Key derivation route for turning (password, salt) into an AES-256 key.
///
/// New envelopes are always sealed with [`KeyDerivation::Pbkdf2`]. The
/// legacy route exists so that payloads produced by old clients stay
/// decryptable; nothing in this crate selects it for encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDerivation {
    /// SHA-256 over the concatenated password and hex-encoded salt.
    /// Fast and weak; decrypt-only.
    LegacyConcat,
    /// PBKDF2-HMAC-SHA256 with the given iteration count.
    Pbkdf2 { iterations: u32 },
}

impl Default for KeyDerivation {
    fn default() -> Self {
        KeyDerivation::Pbkdf2 {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl KeyDerivation {
    pub fn validate(&self) -> Result<(), CryptoError> {
        match self {
            KeyDerivation::LegacyConcat => Ok(()),
            KeyDerivation::Pbkdf2 { iterations: 0 } => Err(CryptoError::Derivation(
                "PBKDF2 iteration count must be >= 1".into(),
            )),
            KeyDerivation::Pbkdf2 { .. } => Ok(()),
        }
    }

    /// Derive a 256-bit key from a password and salt.
    ///
    /// Deterministic: identical inputs always yield identical key material.
    /// An empty password is accepted and produces a valid (weak) key;
    /// rejecting empty passwords is caller policy.
    pub fn derive_key(
        &self,
        password: &str,
        salt: &[u8],
    ) -> Result<Zeroizing<[u8; KEY_LEN]>, CryptoError> {
        self.validate()?;

        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        match self {
            KeyDerivation::LegacyConcat => {
                // Old clients hashed the word-packed passphrase, built as
                // password ++ hex(salt).
                let mut passphrase =
                    Zeroizing::new(Vec::with_capacity(password.len() + salt.len() * 2));
                passphrase.extend_from_slice(password.as_bytes());
                passphrase.extend_from_slice(bytes_to_hex(salt).as_bytes());

                let packed = Zeroizing::new(WordBuffer::from_bytes(&passphrase).to_bytes());
                key.copy_from_slice(&Sha256::digest(&*packed));
            }
            KeyDerivation::Pbkdf2 { iterations } => {
                pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, *iterations, &mut *key);
            }
        }

        Ok(key)
    }

    /// Wire identifier for the binary envelope format.
    pub(crate) fn id(&self) -> u8 {
        match self {
            KeyDerivation::LegacyConcat => 0,
            KeyDerivation::Pbkdf2 { .. } => 1,
        }
    }

    /// Iteration count as stored on the wire (0 for the legacy route).
    pub(crate) fn iterations(&self) -> u32 {
        match self {
            KeyDerivation::LegacyConcat => 0,
            KeyDerivation::Pbkdf2 { iterations } => *iterations,
        }
    }

    pub(crate) fn from_wire(id: u8, iterations: u32) -> Result<Self, CryptoError> {
        match id {
            0 => Ok(KeyDerivation::LegacyConcat),
            1 => {
                let kdf = KeyDerivation::Pbkdf2 { iterations };
                kdf.validate()?;
                Ok(kdf)
            }
            other => Err(CryptoError::Derivation(format!(
                "unknown key derivation id {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // High iteration counts have no place in unit tests
    const FAST: KeyDerivation = KeyDerivation::Pbkdf2 { iterations: 1_000 };

    #[test]
    fn kdf_is_deterministic() {
        let salt = [42u8; 16];

        let k1 = FAST.derive_key("password", &salt).unwrap();
        let k2 = FAST.derive_key("password", &salt).unwrap();

        assert_eq!(*k1, *k2);
    }

    #[test]
    fn salt_affects_output() {
        let k1 = FAST.derive_key("pw", &[1u8; 16]).unwrap();
        let k2 = FAST.derive_key("pw", &[2u8; 16]).unwrap();

        assert_ne!(*k1, *k2);
    }

    #[test]
    fn iterations_affect_output() {
        let salt = [7u8; 16];

        let k1 = KeyDerivation::Pbkdf2 { iterations: 1_000 }
            .derive_key("pw", &salt)
            .unwrap();
        let k2 = KeyDerivation::Pbkdf2 { iterations: 2_000 }
            .derive_key("pw", &salt)
            .unwrap();

        assert_ne!(*k1, *k2);
    }

    #[test]
    fn routes_disagree() {
        let salt = [7u8; 16];

        let fast = KeyDerivation::LegacyConcat.derive_key("pw", &salt).unwrap();
        let slow = FAST.derive_key("pw", &salt).unwrap();

        assert_ne!(*fast, *slow);
    }

    #[test]
    fn legacy_route_is_deterministic() {
        let salt = [9u8; 16];

        let k1 = KeyDerivation::LegacyConcat.derive_key("pw", &salt).unwrap();
        let k2 = KeyDerivation::LegacyConcat.derive_key("pw", &salt).unwrap();

        assert_eq!(*k1, *k2);
    }

    #[test]
    fn empty_password_is_accepted() {
        assert!(FAST.derive_key("", &[0u8; 16]).is_ok());
    }

    #[test]
    fn zero_iterations_fail() {
        let err = KeyDerivation::Pbkdf2 { iterations: 0 }
            .derive_key("pw", &[0u8; 16])
            .unwrap_err();
        assert!(matches!(err, CryptoError::Derivation(_)));
    }

    #[test]
    fn wire_id_roundtrip() {
        for kdf in [KeyDerivation::LegacyConcat, KeyDerivation::default()] {
            let back = KeyDerivation::from_wire(kdf.id(), kdf.iterations()).unwrap();
            assert_eq!(back, kdf);
        }
        assert!(KeyDerivation::from_wire(9, 0).is_err());
    }
}
