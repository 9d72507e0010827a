//! End-to-end runs of the keypin binary

mod common;

use std::process::Output;

use assert_cmd::Command;

use common::{closed_port, spawn_tls_server, RSA_PIN};

const RSA_RAW_KEY_B64_PREFIX: &str = "MIIBCgKCAQEAujSoLbqyRjpUOY4m6nDOBa1qGUpZoN4/3qm6fjH/G05efBsPK3roeGvi0nPG85zoXFE1";
const RAW_KEY_HEADER: &str = "Raw public key (Base64) — sensitive, do not log in prod:";

/// Run the binary off the runtime so the in-process server keeps serving
async fn keypin(args: Vec<String>) -> Output {
    tokio::task::spawn_blocking(move || {
        Command::cargo_bin("keypin")
            .unwrap()
            .args(&args)
            .output()
            .unwrap()
    })
    .await
    .unwrap()
}

fn args(port: u16, extra: &[&str]) -> Vec<String> {
    let mut args = vec!["127.0.0.1".to_string(), "--port".to_string(), port.to_string()];
    args.extend(extra.iter().map(|s| s.to_string()));
    args
}

#[tokio::test(flavor = "multi_thread")]
async fn test_insecure_prints_pin() {
    let server = spawn_tls_server().await;

    let output = keypin(args(server.port, &["--insecure"])).await;

    assert!(output.status.success(), "{:?}", output);
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        format!(
            "Key format (raw export): RSA (PKCS#1 DER)\n\
             PIN (RAW key)  SHA256 Base64: {}   <-- use this KEY\n",
            RSA_PIN
        )
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_print_key_appends_raw_key_once() {
    let server = spawn_tls_server().await;

    let output = keypin(args(server.port, &["--insecure", "--print-key"])).await;

    assert!(output.status.success(), "{:?}", output);
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();

    assert_eq!(lines.len(), 5, "{}", stdout);
    assert_eq!(lines[1], format!("PIN (RAW key)  SHA256 Base64: {}   <-- use this KEY", RSA_PIN));
    assert_eq!(lines[2], "");
    assert_eq!(lines[3], RAW_KEY_HEADER);
    assert!(lines[4].starts_with(RSA_RAW_KEY_B64_PREFIX));
    assert_eq!(stdout.matches(RSA_RAW_KEY_B64_PREFIX).count(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_verification_failure_exits_1_without_pin() {
    let server = spawn_tls_server().await;

    let output = keypin(args(server.port, &[])).await;

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.lines().last().unwrap().starts_with("Error: "), "{}", stderr);
    assert!(!stderr.contains(RSA_PIN));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connection_failure_exits_1() {
    let port = closed_port().await;

    let output = keypin(args(port, &["--insecure", "--timeout", "2"])).await;

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    // The skip-verify warning is logged to stderr ahead of the error
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert_eq!(stderr.lines().filter(|l| l.starts_with("Error: ")).count(), 1, "{}", stderr);
    assert!(stderr.lines().last().unwrap().starts_with("Error: "), "{}", stderr);
}

#[test]
fn test_missing_server_is_usage_error() {
    Command::cargo_bin("keypin").unwrap().assert().failure().code(2);
}
