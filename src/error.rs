use std::fmt;

#[derive(Debug)]
pub enum CryptoError {
    /// Invalid key derivation parameters.
    Derivation(String),
    /// The cipher primitive rejected its input (bad key/IV length, truncated
    /// or non-block-aligned ciphertext, malformed envelope).
    Cipher(String),
    /// Decryption produced bytes the validator rejected, or padding did not
    /// parse. Without a MAC the two causes cannot be told apart.
    WrongPassword,
    /// Failure in the external blob store.
    Transport(String),
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::Derivation(msg) => write!(f, "key derivation failed: {msg}"),
            CryptoError::Cipher(msg) => write!(f, "corrupted data: {msg}"),
            CryptoError::WrongPassword => write!(f, "incorrect password or corrupted file"),
            CryptoError::Transport(msg) => write!(f, "storage transport failed: {msg}"),
        }
    }
}

impl std::error::Error for CryptoError {}
