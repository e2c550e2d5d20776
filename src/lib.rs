//! Automated WPS daily check-in.
//!
//! The sign-in endpoint expects a small hybrid-encrypted handshake: a one-time
//! AES key encrypts the request payload, and the AES key itself travels
//! RSA-wrapped in a request header. This crate keeps that handshake, the HTTP
//! exchanges, and the per-account orchestration small and readable so the
//! whole flow can be audited in one sitting.

pub mod client;
pub mod config;
pub mod crypto;
pub mod notify;
pub mod runner;
