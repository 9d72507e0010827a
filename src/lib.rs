//! # keypin
//!
//! Compute certificate-pinning values that match what mobile platforms
//! compute locally.
//!
//! iOS pins are usually built from `SecKeyCopyExternalRepresentation`, which
//! exports the *raw* public key, not the SubjectPublicKeyInfo that OpenSSL
//! style tooling hashes. This crate connects to a TLS server, takes its leaf
//! certificate and re-encodes the public key in that raw form:
//!
//! | Key | Raw export |
//! |---|---|
//! | RSA | PKCS#1 `RSAPublicKey` DER |
//! | EC | ANSI X9.63 uncompressed point `04 \|\| X \|\| Y` |
//! | Ed25519 / Ed448 | raw 32 / 57 bytes |
//! | other | SPKI DER (fallback) |
//!
//! The pin is `base64(sha256(raw))`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use keypin::{probe, ProbeConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> keypin::Result<()> {
//!     let key = probe(&ProbeConfig::new("api.example.com")).await?;
//!     println!("{}: {}", key.label, key.pin());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod key;
pub mod pin;
pub mod probe;
pub mod report;
pub mod tls;

pub use config::{ProbeConfig, Verification};
pub use error::{Error, Result};
pub use key::{canonicalize, CanonicalKey, EcCurve, PublicKey};
pub use pin::Pin;
pub use probe::probe;
pub use tls::fetch_leaf_certificate;
