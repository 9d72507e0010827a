//! Error types for keypin

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// DNS, TCP connect, refusal, timeout, or an undialable server name
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Handshake, trust, or hostname failure
    #[error("TLS validation failed: {0}")]
    TlsValidation(String),

    #[error("Certificate parsing failed: {0}")]
    CertificateParse(der::Error),

    #[error("Public key extraction failed: {0}")]
    KeyExtraction(String),
}

pub type Result<T> = std::result::Result<T, Error>;
