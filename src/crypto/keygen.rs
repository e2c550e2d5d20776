//! One-time AES key generation. The service derives the CBC IV from the first
//! 16 characters of the key text, so the generator guarantees the textual form
//! is long enough before the timestamp suffix is appended.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use zeroize::Zeroize;

/// Default total key length in characters.
pub const DEFAULT_KEY_LEN: usize = 32;

/// Number of trailing characters occupied by the Unix timestamp.
const TIMESTAMP_LEN: usize = 10;

const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generates a one-time AES key: a random lowercase-alphanumeric prefix of
/// `length - 10` characters followed by the current Unix timestamp in decimal.
/// Always succeeds; the output is fresh entropy plus wall-clock time.
pub fn generate_aes_key(length: usize) -> String {
    let prefix_len = length.saturating_sub(TIMESTAMP_LEN);
    let mut rng = rand::thread_rng();
    let mut key = String::with_capacity(length);
    for _ in 0..prefix_len {
        let idx = rng.gen_range(0..CHARSET.len());
        key.push(CHARSET[idx] as char);
    }
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    key.push_str(&timestamp.to_string());
    key
}

/// One-time key material for a single sign-in attempt. The IV is always the
/// first 16 bytes of the key's textual form. Zeroized on drop so the key does
/// not outlive the request that used it.
pub struct KeyMaterial {
    key: String,
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        // Zero the key text on drop to reduce its lifetime in memory.
        self.key.zeroize();
    }
}

impl KeyMaterial {
    /// Generates fresh key material of the default 32-character length.
    pub fn fresh() -> Self {
        Self {
            key: generate_aes_key(DEFAULT_KEY_LEN),
        }
    }

    /// The key's textual form, used both as cipher key bytes and IV source.
    pub fn key_text(&self) -> &str {
        &self.key
    }

    /// First 16 bytes of the key text, the CBC initialization vector.
    pub fn iv(&self) -> &[u8] {
        &self.key.as_bytes()[..16]
    }
}

#[cfg(test)]
mod tests {
    use super::{generate_aes_key, KeyMaterial, DEFAULT_KEY_LEN};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn now_secs() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be past the epoch")
            .as_secs()
    }

    #[test]
    fn produces_requested_length() {
        for length in [11, 16, 26, 32, 48] {
            assert_eq!(generate_aes_key(length).len(), length);
        }
    }

    #[test]
    fn prefix_is_lowercase_alphanumeric() {
        let key = generate_aes_key(DEFAULT_KEY_LEN);
        let prefix = &key[..DEFAULT_KEY_LEN - 10];
        assert!(prefix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn suffix_is_a_recent_timestamp() {
        let before = now_secs();
        let key = generate_aes_key(DEFAULT_KEY_LEN);
        let after = now_secs();
        let suffix: u64 = key[DEFAULT_KEY_LEN - 10..]
            .parse()
            .expect("suffix should parse as a decimal timestamp");
        assert!(suffix >= before && suffix <= after);
    }

    #[test]
    fn fresh_material_exposes_a_16_byte_iv() {
        let material = KeyMaterial::fresh();
        assert_eq!(material.iv().len(), 16);
        assert_eq!(material.iv(), &material.key_text().as_bytes()[..16]);
    }

    #[test]
    fn consecutive_keys_differ() {
        // The random prefix is 22 characters; a collision would point at a
        // broken entropy source rather than bad luck.
        assert_ne!(generate_aes_key(32), generate_aes_key(32));
    }
}
