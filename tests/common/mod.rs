//! Local TLS servers for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use openssl::pkey::PKey;
use openssl::ssl::{SslAcceptor, SslMethod};
use openssl::x509::X509;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;

/// `base64(sha256(PKCS#1))` of `rsa2048.der`, computed independently with OpenSSL
pub const RSA_PIN: &str = "N1s4U0g8NqCZDAjXJSvg3xwOLJe6hMQVkETOg5lXOxA=";

/// `base64(sha256(SPKI))` of `rsa2048.der`
pub const RSA_SPKI_PIN: &str = "Te2j7fJiyOTyXTi2IB0lZMaizWSmbfZH6lB4vKyKMKM=";

pub fn fixture(name: &str) -> Vec<u8> {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    std::fs::read(&path).unwrap_or_else(|e| panic!("read {}: {}", path, e))
}

/// A background server bound to 127.0.0.1; aborted on drop
pub struct TestServer {
    pub port: u16,
    handle: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// TLS server presenting the self-signed `rsa2048.der` certificate
pub async fn spawn_tls_server() -> TestServer {
    spawn_tls_server_with("rsa2048.der", "rsa2048.key.der").await
}

/// rustls server presenting fixture `cert` with its PKCS#8 fixture `key`
pub async fn spawn_tls_server_with(cert: &str, key: &str) -> TestServer {
    let cert = CertificateDer::from(fixture(cert));
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(fixture(key)));

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![cert], key)
        .unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                // Verifying clients abort the handshake; that is expected
                if let Ok(mut tls) = acceptor.accept(stream).await {
                    let _ = tls.shutdown().await;
                }
            });
        }
    });

    TestServer { port, handle }
}

/// OpenSSL server for key types rustls cannot serve (Ed448)
///
/// Runs on a plain thread and handles a single connection.
pub fn spawn_openssl_server(cert: &str, key: &str) -> u16 {
    let cert = X509::from_der(&fixture(cert)).unwrap();
    let key = PKey::private_key_from_der(&fixture(key)).unwrap();

    let mut builder = SslAcceptor::mozilla_modern_v5(SslMethod::tls()).unwrap();
    builder.set_private_key(&key).unwrap();
    builder.set_certificate(&cert).unwrap();
    builder.check_private_key().unwrap();
    let acceptor = builder.build();

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    std::thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            if let Ok(mut tls) = acceptor.accept(stream) {
                let _ = tls.shutdown();
            }
        }
    });

    port
}

/// Server that accepts TCP connections and never speaks
pub async fn spawn_silent_server() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    TestServer { port, handle }
}

/// A port nothing is listening on
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}
