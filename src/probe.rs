//! One probe: connect, take the leaf certificate, canonicalize its key

use crate::config::ProbeConfig;
use crate::error::Result;
use crate::key::{self, CanonicalKey};
use crate::tls;

/// Fetch the server's leaf certificate and canonicalize its public key
///
/// 1. Open a TLS connection to `config.host:config.port`
/// 2. Take the leaf certificate DER
/// 3. Re-encode the subject public key in its raw export form
pub async fn probe(config: &ProbeConfig) -> Result<CanonicalKey> {
    // 1-2. Connect and fetch (the connection is closed when this returns)
    let cert = tls::fetch_leaf_certificate(
        &config.host,
        config.port,
        config.timeout,
        config.verification,
    )
    .await?;

    // 3. Canonicalize
    let key = key::canonicalize(cert.as_ref())?;
    log::info!("{}: {}", config.address(), key.label);

    Ok(key)
}
