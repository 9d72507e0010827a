//! keypin CLI
//!
//! Prints the raw public key pin of a TLS server's leaf certificate.

use std::process::ExitCode;
use std::time::Duration;

use clap::{ArgAction, Parser};
use log::LevelFilter;

use keypin::config::{parse_timeout, DEFAULT_PORT};
use keypin::{report, ProbeConfig, Verification};

#[derive(Parser)]
#[command(name = "keypin")]
#[command(about = "Extract a public key pin (raw-key SHA256 Base64) compatible with iOS SecKeyCopyExternalRepresentation")]
#[command(long_about = "
keypin - raw public key pins for mobile certificate pinning

Connects to SERVER, takes the leaf certificate and prints
base64(sha256(raw public key)), where the raw key is:

    RSA              PKCS#1 RSAPublicKey (DER)
    EC               X9.63 uncompressed point (04 || X || Y)
    Ed25519/Ed448    raw 32/57 bytes
    anything else    SubjectPublicKeyInfo (fallback)

EXAMPLES:
    keypin api.example.com
    keypin staging.internal --port 8443 --insecure --print-key
")]
#[command(version)]
struct Cli {
    /// Hostname (SNI), e.g. api.example.com
    #[arg(value_name = "SERVER")]
    server: String,

    /// Port
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Socket timeout in seconds
    #[arg(long, value_name = "SECONDS", default_value = "5", value_parser = parse_timeout)]
    timeout: Duration,

    /// Skip TLS verification (not recommended)
    #[arg(long)]
    insecure: bool,

    /// Also print base64 of the raw public key bytes (sensitive)
    #[arg(long)]
    print_key: bool,

    /// Also print the SPKI pin, for reference
    #[arg(long)]
    show_spki: bool,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn into_config(self) -> ProbeConfig {
        let verification = if self.insecure {
            Verification::SkipVerify
        } else {
            Verification::Verify
        };

        ProbeConfig {
            host: self.server,
            port: self.port,
            timeout: self.timeout,
            verification,
            print_key: self.print_key,
            show_spki: self.show_spki,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.into_config();

    match keypin::probe(&config).await {
        Ok(key) => {
            print!("{}", report::render(&key, &config));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
