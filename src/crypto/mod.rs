//! Cryptographic pieces of the sign-in handshake. Each submodule covers one
//! step: generating the one-time AES key, encrypting the payload with it, and
//! wrapping the key for transport. The shared error type keeps failures from
//! any step in a single shape the protocol client can normalize.

pub mod aescbc;
pub mod keygen;
pub mod wrap;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key text is {0} bytes, longer than the 32-byte cipher key")]
    KeyTooLong(usize),
    #[error("key text is {0} bytes, too short to derive a 16-byte IV")]
    KeyTooShort(usize),
    #[error("base64 decoding failed: {0}")]
    Base64DecodeFailed(String),
    #[error("ciphertext is not valid CBC data: {0}")]
    MalformedCiphertext(String),
    #[error("public key unparsable: {0}")]
    BadPublicKey(String),
    #[error("rsa encryption failed: {0}")]
    WrapFailed(String),
    #[error("utf-8 error: {0}")]
    Utf8(String),
}
