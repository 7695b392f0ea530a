//! Random password generation for one-off file shares.

use crate::crypto::cipher::secure_random;
use crate::error::CryptoError;

const PASSWORD_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()-_=+";

/// Default length for generated passwords.
pub const DEFAULT_PASSWORD_LEN: usize = 16;

/// Generate a random password from the fixed charset.
///
/// One 32-bit draw per character; the modulo bias over a 76-symbol charset
/// is negligible.
pub fn generate_password(len: usize) -> Result<String, CryptoError> {
    let mut raw = vec![0u8; len * 4];
    secure_random(&mut raw)?;

    let password = raw
        .chunks_exact(4)
        .map(|chunk| {
            let value = u32::from_le_bytes(chunk.try_into().unwrap());
            PASSWORD_CHARSET[value as usize % PASSWORD_CHARSET.len()] as char
        })
        .collect();

    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_length_matches() {
        assert_eq!(generate_password(DEFAULT_PASSWORD_LEN).unwrap().len(), 16);
        assert_eq!(generate_password(0).unwrap().len(), 0);
    }

    #[test]
    fn stays_within_charset() {
        let password = generate_password(64).unwrap();
        assert!(
            password
                .bytes()
                .all(|b| PASSWORD_CHARSET.contains(&b))
        );
    }

    #[test]
    fn successive_passwords_differ() {
        let a = generate_password(16).unwrap();
        let b = generate_password(16).unwrap();
        assert_ne!(a, b);
    }
}
