//! RSA wrapping of the one-time AES key. The server publishes its public key
//! per session; only the holder of the matching private key can recover the
//! AES key, so the payload stays opaque in transit even over plain JSON.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};

use super::CryptoError;

/// Parses a PEM public key, accepting both the SPKI `PUBLIC KEY` form the
/// service currently serves and the older PKCS#1 `RSA PUBLIC KEY` form.
pub fn parse_public_key(pem: &str) -> Result<RsaPublicKey, CryptoError> {
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| CryptoError::BadPublicKey(format!("{e}")))
}

/// Encrypts `plain_text` under the PEM public key with PKCS#1 v1.5 padding
/// and returns the result as padded standard base64.
pub fn wrap_key(plain_text: &str, public_key_pem: &str) -> Result<String, CryptoError> {
    let public_key = parse_public_key(public_key_pem)?;
    let ciphertext = public_key
        .encrypt(&mut OsRng, Pkcs1v15Encrypt, plain_text.as_bytes())
        .map_err(|e| CryptoError::WrapFailed(format!("{e}")))?;
    Ok(STANDARD.encode(ciphertext))
}
