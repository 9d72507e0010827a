//! Stdout report
//!
//! The line layout is consumed by scripts, keep it stable.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::config::ProbeConfig;
use crate::key::CanonicalKey;

pub const RAW_KEY_HEADER: &str = "Raw public key (Base64) — sensitive, do not log in prod:";

/// Render the report for a canonicalized key
///
/// ```text
/// Key format (raw export): <label>
/// PIN (RAW key)  SHA256 Base64: <pin>   <-- use this KEY
/// ```
///
/// followed by the SPKI pin line with `show_spki`, and a blank line, the
/// warning header and the Base64 raw key with `print_key`.
pub fn render(key: &CanonicalKey, config: &ProbeConfig) -> String {
    let mut out = String::new();

    out.push_str(&format!("Key format (raw export): {}\n", key.label));
    out.push_str(&format!(
        "PIN (RAW key)  SHA256 Base64: {}   <-- use this KEY\n",
        key.pin()
    ));

    if config.show_spki {
        out.push_str(&format!(
            "PIN (SPKI)     SHA256 Base64: {}   (reference only)\n",
            key.spki_pin()
        ));
    }

    if config.print_key {
        out.push('\n');
        out.push_str(RAW_KEY_HEADER);
        out.push('\n');
        out.push_str(&STANDARD.encode(&key.raw));
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::canonicalize;

    const ED25519_PIN: &str = "g77xOt7GcVkeCV06vop4mYSAp33bTGzPhOSpsEfvHv0=";
    const ED25519_RAW_B64: &str = "pAiLgE6OmplDwN/948bz4zSkG3CELdl9krjsvfKztQY=";

    fn ed25519_key() -> CanonicalKey {
        let path = format!("{}/tests/fixtures/ed25519.der", env!("CARGO_MANIFEST_DIR"));
        canonicalize(&std::fs::read(path).unwrap()).unwrap()
    }

    #[test]
    fn test_render_default() {
        let report = render(&ed25519_key(), &ProbeConfig::new("localhost"));

        assert_eq!(
            report,
            format!(
                "Key format (raw export): Ed25519 (raw)\n\
                 PIN (RAW key)  SHA256 Base64: {}   <-- use this KEY\n",
                ED25519_PIN
            )
        );
        assert!(!report.contains(ED25519_RAW_B64));
    }

    #[test]
    fn test_render_print_key() {
        let mut config = ProbeConfig::new("localhost");
        config.print_key = true;
        let report = render(&ed25519_key(), &config);

        assert_eq!(report.matches(ED25519_RAW_B64).count(), 1);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[1].starts_with("PIN (RAW key)"));
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], RAW_KEY_HEADER);
        assert_eq!(lines[4], ED25519_RAW_B64);
    }

    #[test]
    fn test_render_spki_before_key_block() {
        let mut config = ProbeConfig::new("localhost");
        config.print_key = true;
        config.show_spki = true;
        let report = render(&ed25519_key(), &config);

        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(
            lines[2],
            "PIN (SPKI)     SHA256 Base64: 6+z+kv9zqWTDzcnFzDROA+4Yjc4nbleCzX16oVVJm64=   (reference only)"
        );
        assert_eq!(lines.last(), Some(&ED25519_RAW_B64));
    }
}
