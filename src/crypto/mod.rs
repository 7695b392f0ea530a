//! Cryptographic primitives for file sharing.
//!
//! Provides AES-256-CBC encryption and password-based key derivation.

pub mod cipher;
pub mod kdf;

pub use cipher::{decrypt, encrypt, encrypt_with_iv, generate_iv, generate_salt};
pub use kdf::KeyDerivation;

/// Length of the salt (16 bytes / 128 bits).
pub const SALT_LEN: usize = 16;
/// Length of the initialization vector (16 bytes, one AES block).
pub const IV_LEN: usize = 16;
/// Length of the encryption key (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// AES block length (16 bytes).
pub const BLOCK_LEN: usize = 16;
/// PBKDF2 iteration count used for all new encryption.
pub const DEFAULT_ITERATIONS: u32 = 100_000;
