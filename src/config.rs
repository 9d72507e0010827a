//! Probe configuration
//!
//! A [`ProbeConfig`] is everything one invocation needs: where to connect,
//! how long to wait, whether to validate the peer, and what to print.

use std::time::Duration;

/// Default TLS port
pub const DEFAULT_PORT: u16 = 443;

/// Default connect + handshake timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// How the connector treats the peer's certificate chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verification {
    /// Standard chain and hostname validation against the bundled roots
    #[default]
    Verify,
    /// Accept any certificate. Diagnostic use only (self-signed/test servers).
    SkipVerify,
}

impl Verification {
    pub fn is_verified(&self) -> bool {
        matches!(self, Verification::Verify)
    }
}

/// Settings for a single probe of one server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Hostname used for the connection and as the TLS server name
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
    pub verification: Verification,
    /// Also print the Base64 raw key bytes (sensitive)
    pub print_key: bool,
    /// Also print the SPKI pin for reference
    pub show_spki: bool,
}

impl ProbeConfig {
    /// Create a config for `host` with default port, timeout and full verification
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            verification: Verification::default(),
            print_key: false,
            show_spki: false,
        }
    }

    /// `host:port` as used in log and error messages
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse a `--timeout` value given in (possibly fractional) seconds
///
/// Rejects zero, negative, NaN and infinite values.
pub fn parse_timeout(value: &str) -> std::result::Result<Duration, String> {
    let secs: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid number of seconds '{}': {}", value, e))?;

    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("timeout must be a positive number of seconds, got '{}'", value));
    }

    Duration::try_from_secs_f64(secs)
        .map_err(|e| format!("timeout out of range '{}': {}", value, e))
}
