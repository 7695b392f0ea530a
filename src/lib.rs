//! Client-side encrypted file sharing core.
//!
//! Files are encrypted with a password-derived AES-256-CBC key and handed to
//! a content-addressed blob store as opaque ciphertext; a recipient holding
//! the password retrieves and decrypts them. There is no MAC: a heuristic
//! plaintext check stands in for integrity, so a wrong password surfaces as
//! [`CryptoError::WrongPassword`] rather than as garbage bytes.

mod crypto;
mod encoding;
mod envelope;
mod error;
pub mod format;
mod password;
mod storage;
mod validator;

pub use crate::crypto::{DEFAULT_ITERATIONS, IV_LEN, KEY_LEN, KeyDerivation, SALT_LEN};
pub use crate::encoding::{WordBuffer, bytes_to_hex, bytes_to_text, hex_to_bytes, text_to_bytes};
pub use crate::envelope::{Envelope, strip_encrypted_suffix};
pub use crate::error::CryptoError;
pub use crate::password::{DEFAULT_PASSWORD_LEN, generate_password};
pub use crate::storage::{BlobStore, ContentHandle, DiskStore, MemoryStore, content_address};
pub use crate::validator::looks_valid;

use zeroize::Zeroizing;

/// Smallest plaintext the validator can say anything about; shorter decrypt
/// results pass through unchecked (PKCS#7 already parsed).
const MIN_VALIDATED_LEN: usize = 4;

/// Encrypt a file with the default (PBKDF2) derivation route.
pub fn encrypt_file(plaintext: &[u8], password: &str) -> Result<Envelope, CryptoError> {
    encrypt_file_with(plaintext, password, KeyDerivation::default(), None)
}

/// Encrypt a file, carrying its original name in the envelope.
pub fn encrypt_file_named(
    plaintext: &[u8],
    password: &str,
    name: &str,
) -> Result<Envelope, CryptoError> {
    encrypt_file_with(plaintext, password, KeyDerivation::default(), Some(name))
}

/// Encrypt a file with an explicit derivation route.
///
/// The legacy route is accepted here for completeness but new callers have
/// no reason to pick it; [`encrypt_file`] is the normal entry point.
pub fn encrypt_file_with(
    plaintext: &[u8],
    password: &str,
    kdf: KeyDerivation,
    name: Option<&str>,
) -> Result<Envelope, CryptoError> {
    let salt = crypto::generate_salt()?;
    let key = kdf.derive_key(password, &salt)?;

    let (ciphertext, iv) = crypto::encrypt(&*key, plaintext)?;

    Ok(Envelope::new(
        kdf,
        salt,
        iv,
        ciphertext,
        name.map(String::from),
    ))
}

/// Decrypt an envelope and validate the result.
///
/// The decrypted bytes are withheld unless they look like real content:
/// a rejected verdict means the password was wrong or the ciphertext is
/// corrupted, and the two cannot be told apart without a MAC.
pub fn decrypt_file(envelope: &Envelope, password: &str) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let key = envelope.kdf().derive_key(password, envelope.salt())?;

    let plaintext = crypto::decrypt(&*key, envelope.iv(), envelope.ciphertext())?;

    if plaintext.len() >= MIN_VALIDATED_LEN && !validator::looks_valid(&plaintext) {
        return Err(CryptoError::WrongPassword);
    }

    Ok(plaintext)
}

/// Encrypt a short text message into a self-contained base64 blob.
pub fn encrypt_message(message: &str, password: &str) -> Result<String, CryptoError> {
    let envelope = encrypt_file(message.as_bytes(), password)?;
    Ok(encoding::bytes_to_text(&format::serialize(&envelope)?))
}

/// Decrypt a message blob produced by [`encrypt_message`].
pub fn decrypt_message(blob: &str, password: &str) -> Result<String, CryptoError> {
    let envelope = format::parse(&encoding::text_to_bytes(blob)?)?;
    let plaintext = decrypt_file(&envelope, password)?;

    String::from_utf8(plaintext.to_vec()).map_err(|_| CryptoError::WrongPassword)
}

/// File sharing facade over a blob store.
///
/// `share` seals plaintext into a single self-contained blob; `retrieve`
/// reverses it given the handle and password. The detached variants keep the
/// legacy layout instead: raw ciphertext in the store, parameters in a JSON
/// sidecar carried out-of-band.
pub struct NodeSafe<S> {
    store: S,
    kdf: KeyDerivation,
}

impl<S: BlobStore> NodeSafe<S> {
    pub fn new(store: S) -> Self {
        Self::with_kdf(store, KeyDerivation::default())
    }

    pub fn with_kdf(store: S, kdf: KeyDerivation) -> Self {
        Self { store, kdf }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Encrypt and store a file as one self-contained sealed blob.
    pub fn share(
        &self,
        name: &str,
        plaintext: &[u8],
        password: &str,
    ) -> Result<ContentHandle, CryptoError> {
        let envelope = encrypt_file_with(plaintext, password, self.kdf, Some(name))?;
        let blob = format::serialize(&envelope)?;

        self.store
            .put(&blob, &envelope.transport_name())
            .map_err(|e| CryptoError::Transport(format!("{e:#}")))
    }

    /// Fetch and decrypt a sealed blob, returning the original name and data.
    pub fn retrieve(
        &self,
        handle: &ContentHandle,
        password: &str,
    ) -> Result<(Option<String>, Zeroizing<Vec<u8>>), CryptoError> {
        let blob = self
            .store
            .get(handle)
            .map_err(|e| CryptoError::Transport(format!("{e:#}")))?;

        let envelope = format::parse(&blob)?;
        let plaintext = decrypt_file(&envelope, password)?;

        Ok((envelope.original_name().map(String::from), plaintext))
    }

    /// Encrypt a file the legacy way: the store receives only the raw
    /// ciphertext, and the returned JSON sidecar carries iv/salt/name.
    pub fn share_detached(
        &self,
        name: &str,
        plaintext: &[u8],
        password: &str,
    ) -> Result<(ContentHandle, String), CryptoError> {
        let envelope = encrypt_file_with(plaintext, password, self.kdf, Some(name))?;

        let handle = self
            .store
            .put(envelope.ciphertext(), &envelope.transport_name())
            .map_err(|e| CryptoError::Transport(format!("{e:#}")))?;

        // The sidecar repeats the ciphertext by construction of the wire
        // form; strip it so only parameters travel out-of-band.
        let sidecar = Envelope::new(
            envelope.kdf(),
            *envelope.salt(),
            *envelope.iv(),
            Vec::new(),
            envelope.original_name().map(String::from),
        )
        .to_json()?;

        Ok((handle, sidecar))
    }

    /// Fetch raw ciphertext and decrypt it with a detached JSON sidecar.
    pub fn retrieve_detached(
        &self,
        handle: &ContentHandle,
        sidecar: &str,
        password: &str,
    ) -> Result<(Option<String>, Zeroizing<Vec<u8>>), CryptoError> {
        let ciphertext = self
            .store
            .get(handle)
            .map_err(|e| CryptoError::Transport(format!("{e:#}")))?;

        let params = Envelope::from_json(sidecar)?;
        let envelope = Envelope::new(
            params.kdf(),
            *params.salt(),
            *params.iv(),
            ciphertext,
            params.original_name().map(String::from),
        );

        let plaintext = decrypt_file(&envelope, password)?;
        Ok((envelope.original_name().map(String::from), plaintext))
    }
}
