//! TLS connector
//!
//! Opens a single connection, completes the handshake and returns the leaf
//! certificate exactly as the server sent it.

use std::sync::Arc;
use std::time::Duration;

use openssl::pkey::{Id, PKey};
use openssl::sign::Verifier;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{CertificateError, ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::config::Verification;
use crate::error::{Error, Result};
use crate::key::{self, PublicKey};

/// Certificate verifier that accepts any server certificate and name
///
/// Only used for `Verification::SkipVerify`. Handshake signatures are still
/// checked against the presented certificate, so the peer must hold the
/// matching private key. The rustls provider has no Ed448, so that scheme
/// is verified with OpenSSL; everything else goes to the provider.
#[derive(Debug)]
pub struct AcceptAnyServerCert {
    provider: Arc<CryptoProvider>,
}

impl AcceptAnyServerCert {
    pub fn new(provider: Arc<CryptoProvider>) -> Self {
        Self { provider }
    }
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        if dss.scheme == SignatureScheme::ED448 {
            return verify_ed448_signature(message, cert, dss);
        }
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        if dss.scheme == SignatureScheme::ED448 {
            return verify_ed448_signature(message, cert, dss);
        }
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        let mut schemes = self
            .provider
            .signature_verification_algorithms
            .supported_schemes();
        if !schemes.contains(&SignatureScheme::ED448) {
            schemes.push(SignatureScheme::ED448);
        }
        schemes
    }
}

/// Check an Ed448 handshake signature against the certificate's key
fn verify_ed448_signature(
    message: &[u8],
    cert: &CertificateDer<'_>,
    dss: &DigitallySignedStruct,
) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
    let public_key = ed448_certificate_key(cert)?;

    let valid = ed448_verify(&public_key, message, dss.signature())
        .map_err(|e| rustls::Error::General(format!("Ed448 verification failed: {}", e)))?;

    if valid {
        Ok(HandshakeSignatureValid::assertion())
    } else {
        Err(rustls::Error::InvalidCertificate(CertificateError::BadSignature))
    }
}

fn ed448_certificate_key(cert: &CertificateDer<'_>) -> std::result::Result<[u8; 57], rustls::Error> {
    match key::canonicalize(cert.as_ref()) {
        Ok(canonical) => match canonical.key {
            PublicKey::Ed448(raw) => Ok(raw),
            other => {
                log::debug!("Ed448 signature from {} certificate", other.label());
                Err(rustls::Error::InvalidCertificate(CertificateError::BadEncoding))
            }
        },
        Err(e) => {
            log::debug!("Ed448 signature from unusable certificate: {}", e);
            Err(rustls::Error::InvalidCertificate(CertificateError::BadEncoding))
        }
    }
}

/// Pure Ed448 (no prehash, empty context) as used by TLS
fn ed448_verify(
    public_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> std::result::Result<bool, openssl::error::ErrorStack> {
    let pkey = PKey::public_key_from_raw_bytes(public_key, Id::ED448)?;
    let mut verifier = Verifier::new_without_digest(&pkey)?;
    verifier.verify_oneshot(signature, message)
}

/// Mozilla root set bundled by `webpki-roots`
pub fn webpki_root_store() -> RootCertStore {
    RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    }
}

/// Build a rustls client config for the given verification mode
///
/// `Verify` uses the Mozilla root set from `webpki-roots` with standard
/// chain and hostname checks.
pub fn client_config(verification: Verification) -> Result<ClientConfig> {
    client_config_with_roots(verification, webpki_root_store())
}

/// Like [`client_config`], validating against `roots` instead of the bundled set
///
/// `roots` is unused for `SkipVerify`.
pub fn client_config_with_roots(verification: Verification, roots: RootCertStore) -> Result<ClientConfig> {
    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());

    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::TlsValidation(format!("Failed to build TLS config: {}", e)))?;

    let config = match verification {
        Verification::Verify => builder.with_root_certificates(roots).with_no_client_auth(),
        Verification::SkipVerify => builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert::new(provider)))
            .with_no_client_auth(),
    };

    Ok(config)
}

/// Connect to `host:port` and return the DER of the peer's leaf certificate
///
/// `timeout` bounds the TCP connect and the TLS handshake separately. The
/// connection is dropped before returning, on success and on every error.
pub async fn fetch_leaf_certificate(
    host: &str,
    port: u16,
    timeout: Duration,
    verification: Verification,
) -> Result<CertificateDer<'static>> {
    if !verification.is_verified() {
        log::warn!("TLS certificate verification disabled for {}:{}", host, port);
    }

    fetch_leaf_certificate_with(host, port, timeout, client_config(verification)?).await
}

/// [`fetch_leaf_certificate`] with a caller-built rustls config
pub async fn fetch_leaf_certificate_with(
    host: &str,
    port: u16,
    timeout: Duration,
    config: ClientConfig,
) -> Result<CertificateDer<'static>> {
    let address = format!("{}:{}", host, port);

    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| Error::Connection(format!("Invalid server name '{}': {}", host, e)))?;

    let connector = TlsConnector::from(Arc::new(config));

    // Connect
    log::info!("Connecting to {}", address);
    let stream = tokio::time::timeout(timeout, TcpStream::connect((host, port)))
        .await
        .map_err(|_| Error::Connection(format!("Timed out connecting to {} after {:?}", address, timeout)))?
        .map_err(|e| Error::Connection(format!("Failed to connect to {}: {}", address, e)))?;

    // TLS
    let tls_stream = tokio::time::timeout(timeout, connector.connect(server_name, stream))
        .await
        .map_err(|_| {
            Error::Connection(format!("Timed out during TLS handshake with {} after {:?}", address, timeout))
        })?
        .map_err(|e| Error::TlsValidation(format!("Handshake with {} failed: {}", address, e)))?;

    // Get cert
    let (_, conn) = tls_stream.get_ref();
    let chain = conn.peer_certificates().unwrap_or_default();
    log::debug!(
        "Negotiated {:?} with {}, {} certificate(s) presented",
        conn.protocol_version(),
        address,
        chain.len()
    );

    let leaf = chain
        .first()
        .cloned()
        .ok_or_else(|| Error::TlsValidation(format!("{} presented no certificate", address)))?;

    log::debug!("Leaf certificate: {} bytes", leaf.as_ref().len());

    Ok(leaf)
}
