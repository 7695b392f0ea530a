//! Heuristic check that decrypted bytes are real content rather than
//! wrong-key noise.
//!
//! CBC without a MAC can "successfully" decrypt under the wrong key, so this
//! verdict is the only signal separating recovered content from garbage. It
//! is advisory: a `true` is not a cryptographic guarantee.

/// Known file signatures, checked against the start of the buffer.
const MAGIC_SIGNATURES: &[&[u8]] = &[
    b"%PDF",
    b"\x89PNG",
    b"\xFF\xD8\xFF",       // JPEG
    b"GIF87a",
    b"GIF89a",
    b"PK\x03\x04",         // ZIP / Office OpenXML
    b"PK\x05\x06",         // empty ZIP
    b"PK\x07\x08",         // spanned ZIP
    b"\xD0\xCF\x11\xE0",   // legacy Office compound file
];

/// Bytes sampled for the printable-text heuristic.
const TEXT_SAMPLE_LEN: usize = 100;
/// Fraction of printable bytes above which a sample counts as text.
const TEXT_THRESHOLD: f64 = 0.9;
/// Bytes sampled for the repetition fallback.
const REPETITION_SAMPLE_LEN: usize = 1000;
/// Block size the repetition fallback compares against.
const REPETITION_BLOCK_LEN: usize = 8;

/// Classify decrypted bytes as likely-valid content.
///
/// Checks run in a fixed precedence: known file signature, then printable
/// text, then the anti-repetition fallback for large buffers. The precedence
/// matters because a buffer can match several rules at once; the first
/// applicable rule wins.
pub fn looks_valid(data: &[u8]) -> bool {
    if data.len() < 4 {
        return false;
    }

    if MAGIC_SIGNATURES.iter().any(|sig| data.starts_with(sig)) {
        return true;
    }

    if looks_like_text(data) {
        return true;
    }

    if data.len() > REPETITION_SAMPLE_LEN {
        return !is_trivial_repetition(&data[..REPETITION_SAMPLE_LEN]);
    }

    false
}

fn looks_like_text(data: &[u8]) -> bool {
    let sample = &data[..data.len().min(TEXT_SAMPLE_LEN)];
    let printable = sample
        .iter()
        .filter(|&&b| (32..=126).contains(&b) || b == 9 || b == 10 || b == 13)
        .count();

    printable as f64 / sample.len() as f64 > TEXT_THRESHOLD
}

/// True if the sample is just the first 8-byte block repeated end to end.
fn is_trivial_repetition(sample: &[u8]) -> bool {
    let block = &sample[..REPETITION_BLOCK_LEN];
    sample
        .iter()
        .enumerate()
        .all(|(i, &b)| b == block[i % REPETITION_BLOCK_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise(len: usize) -> Vec<u8> {
        // Deterministic high-entropy-looking filler, no printable run
        (0..len).map(|i| (i as u8).wrapping_mul(167).wrapping_add(131)).collect()
    }

    #[test]
    fn short_buffers_are_invalid() {
        assert!(!looks_valid(b""));
        assert!(!looks_valid(b"abc"));
    }

    #[test]
    fn known_signatures_are_valid() {
        assert!(looks_valid(b"%PDF-1.7 ..."));
        assert!(looks_valid(b"\x89PNG\r\n\x1a\n"));
        assert!(looks_valid(b"\xFF\xD8\xFF\xE0"));
        assert!(looks_valid(b"GIF89a"));
        assert!(looks_valid(b"PK\x03\x04rest"));
        assert!(looks_valid(b"\xD0\xCF\x11\xE0junk"));
    }

    #[test]
    fn signature_wins_over_later_rules() {
        // Signature followed by pure noise must still classify as valid
        let mut data = b"%PDF".to_vec();
        data.extend(noise(4000));
        assert!(looks_valid(&data));
    }

    #[test]
    fn plain_text_is_valid() {
        assert!(looks_valid(b"hello world, this is a perfectly normal note\n"));
    }

    #[test]
    fn mostly_binary_prefix_is_not_text() {
        let mut data = noise(100);
        data[0] = b'A';
        assert!(!looks_valid(&data));
    }

    #[test]
    fn large_non_repeating_buffer_is_valid() {
        assert!(looks_valid(&noise(2000)));
    }

    #[test]
    fn repeated_block_is_invalid() {
        assert!(!looks_valid(&vec![0u8; 2000]));

        let pattern: Vec<u8> = [0xAB, 0xCD, 0xEF, 0x01, 0x23, 0x45, 0x67, 0x89]
            .iter()
            .copied()
            .cycle()
            .take(2000)
            .collect();
        assert!(!looks_valid(&pattern));
    }

    #[test]
    fn midsize_noise_is_invalid() {
        // Too small for the repetition fallback, not text, no signature
        assert!(!looks_valid(&noise(500)));
    }
}
