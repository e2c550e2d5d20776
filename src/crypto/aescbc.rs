//! Payload encryption for the sign-in request. The service derives the cipher
//! key by zero-padding the key text to 32 bytes and takes the IV from the
//! first 16 bytes of the same text, so both sides reconstruct identical
//! parameters from the wrapped key string alone.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::CryptoError;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const CIPHER_KEY_LEN: usize = 32;
const IV_LEN: usize = 16;

fn cipher_params(key_text: &str) -> Result<([u8; CIPHER_KEY_LEN], [u8; IV_LEN]), CryptoError> {
    let key_bytes = key_text.as_bytes();
    if key_bytes.len() > CIPHER_KEY_LEN {
        return Err(CryptoError::KeyTooLong(key_bytes.len()));
    }
    if key_bytes.len() < IV_LEN {
        return Err(CryptoError::KeyTooShort(key_bytes.len()));
    }

    // Zero-pad the key text on the right to the full AES-256 key size.
    let mut key = [0u8; CIPHER_KEY_LEN];
    key[..key_bytes.len()].copy_from_slice(key_bytes);

    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&key_bytes[..IV_LEN]);

    Ok((key, iv))
}

/// Encrypts `plain_text` with AES-256-CBC under the textual key, PKCS#7
/// padded, and returns the ciphertext as padded standard base64.
pub fn encrypt(plain_text: &str, key_text: &str) -> Result<String, CryptoError> {
    let (key, iv) = cipher_params(key_text)?;
    let cipher = Aes256CbcEnc::new(&key.into(), &iv.into());
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plain_text.as_bytes());
    Ok(STANDARD.encode(ciphertext))
}

/// Decrypts base64 ciphertext produced by [`encrypt`] back into the original
/// plaintext. The service does the equivalent on its side; here it backs the
/// round-trip checks.
pub fn decrypt(ciphertext_b64: &str, key_text: &str) -> Result<String, CryptoError> {
    let (key, iv) = cipher_params(key_text)?;
    let ciphertext = STANDARD
        .decode(ciphertext_b64.as_bytes())
        .map_err(|e| CryptoError::Base64DecodeFailed(format!("{e}")))?;
    let cipher = Aes256CbcDec::new(&key.into(), &iv.into());
    let plain = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|e| CryptoError::MalformedCiphertext(format!("{e}")))?;
    String::from_utf8(plain).map_err(|e| CryptoError::Utf8(format!("{e}")))
}

#[cfg(test)]
mod tests {
    use super::{decrypt, encrypt};
    use crate::crypto::CryptoError;

    const KEY: &str = "abcdefghij1234567890ab1730000000";

    #[test]
    fn round_trips_empty_plaintext() {
        let ciphertext = encrypt("", KEY).expect("encryption should succeed");
        assert_eq!(decrypt(&ciphertext, KEY).expect("decryption should succeed"), "");
    }

    #[test]
    fn round_trips_exactly_one_block() {
        let plain = "0123456789abcdef";
        let ciphertext = encrypt(plain, KEY).expect("encryption should succeed");
        assert_eq!(
            decrypt(&ciphertext, KEY).expect("decryption should succeed"),
            plain
        );
    }

    #[test]
    fn round_trips_multi_block_with_padding() {
        let plain = r#"{"user_id":123456789,"platform":64}"#;
        let ciphertext = encrypt(plain, KEY).expect("encryption should succeed");
        assert_eq!(
            decrypt(&ciphertext, KEY).expect("decryption should succeed"),
            plain
        );
    }

    #[test]
    fn rejects_keys_longer_than_the_cipher_key() {
        let long_key = "a".repeat(33);
        let err = encrypt("payload", &long_key).unwrap_err();
        assert!(matches!(err, CryptoError::KeyTooLong(33)));
    }

    #[test]
    fn rejects_keys_too_short_for_the_iv() {
        let err = encrypt("payload", "short").unwrap_err();
        assert!(matches!(err, CryptoError::KeyTooShort(5)));
    }

    #[test]
    fn ciphertext_is_block_aligned() {
        // PKCS#7 always pads, so even an empty plaintext becomes one block.
        use base64::{engine::general_purpose::STANDARD, Engine};
        let ciphertext = encrypt("", KEY).expect("encryption should succeed");
        let raw = STANDARD.decode(ciphertext).expect("output should be base64");
        assert_eq!(raw.len(), 16);
    }
}
