//! Console commands and configuration loading.

mod common;

use alloy_primitives::U256;
use common::*;
use once_cell::sync::Lazy;
use plasma_account::console::{self, Command, ALREADY_INITIALIZED, NOT_INITIALIZED};
use plasma_account::service::{service_check, ServiceStatus};
use plasma_account::{PlasmaConfig, ETH_CURRENCY};
use std::sync::Mutex;
use tempfile::TempDir;

static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

fn lock_env() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner())
}

async fn run(h: &Harness, line: &str) -> Result<String, String> {
    let command = console::parse(line)?;
    console::execute(&h.account, command).await
}

// =============================================================================
// Console
// =============================================================================

#[tokio::test]
async fn commands_before_init_are_refused() {
    let h = harness();
    assert_eq!(run(&h, "plasma deposit 100").await.unwrap_err(), NOT_INITIALIZED);
    assert_eq!(run(&h, "plasma send 0x38d5beb778b6e62d82e3ba4633e08987e6d0f990 5").await.unwrap_err(), NOT_INITIALIZED);
    assert_eq!(run(&h, "plasma exit").await.unwrap_err(), NOT_INITIALIZED);
    assert!(run(&h, "plasma help").await.unwrap().contains("plasma deposit"));
}

#[tokio::test]
async fn init_twice_needs_force() {
    let h = harness();
    run(&h, "plasma init").await.unwrap();
    assert_eq!(run(&h, "plasma init").await.unwrap_err(), ALREADY_INITIALIZED);
    assert!(run(&h, "plasma init --force").await.is_ok());
}

#[tokio::test]
async fn deposit_and_send_through_console() {
    let h = harness();
    run(&h, "plasma init").await.unwrap();

    let deposit = run(&h, "plasma deposit 100000").await.unwrap();
    assert!(deposit.contains("Successfully deposited 100000 wei"));

    *h.child.utxos.lock().unwrap() = vec![utxo(1, 600, ETH_CURRENCY)];
    let sent = run(&h, "plasma send 0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb 555").await.unwrap();
    assert!(sent.contains("Successfully submitted tx"));
    let tx = h.child.submitted.lock().unwrap()[0].clone();
    assert_eq!(tx.body.outputs[0].owner, dest());
    assert_eq!(tx.body.outputs[1].amount, U256::from(45u64));
}

#[tokio::test]
async fn failures_surface_as_text() {
    let h = harness();
    run(&h, "plasma init").await.unwrap();
    let err = run(&h, "plasma send 0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb 50").await.unwrap_err();
    assert_eq!(err, "No utxo big enough to cover the amount 50");
    assert_eq!(run(&h, "plasma exit").await.unwrap(), "No UTXOs to exit.");
}

#[tokio::test]
async fn status_and_listing() {
    let h = harness();
    run(&h, "plasma init").await.unwrap();
    *h.child.utxos.lock().unwrap() = vec![utxo(1_000_000_000, 7, ETH_CURRENCY)];
    assert!(run(&h, "plasma status").await.unwrap().contains("\"phase\": \"ready\""));
    assert!(run(&h, "plasma utxos").await.unwrap().starts_with("1000000000  7 of"));
    assert!(run(&h, "plasma balance").await.unwrap().starts_with("Root chain: 1000000 wei"));
}

#[test]
fn parse_rejects_unknown() {
    assert!(matches!(console::parse("plasma status"), Ok(Command::Status)));
    assert!(console::parse("plasma send nowhere 1").is_err());
}

// =============================================================================
// Service check
// =============================================================================

#[tokio::test]
async fn service_check_reports_client_version() {
    let h = harness();
    *h.root.version.lock().unwrap() = Some("Geth/v1.9.2-stable/linux-amd64/go1.11.5".into());
    let report = service_check(&*h.root).await;
    assert_eq!(report.name, "Geth v1.9.2 (Plasma)");
    assert_eq!(report.status, ServiceStatus::On);

    *h.root.version.lock().unwrap() = None;
    let report = service_check(&*h.root).await;
    assert_eq!(report.name, "Plasma chain not found");
    assert_eq!(report.status, ServiceStatus::Off);
}

// =============================================================================
// Configuration
// =============================================================================

const ENV_KEYS: [&str; 9] = [
    "PLASMA_CONTRACT_ADDRESS",
    "WEB3_PROVIDER_URL",
    "WATCHER_URL",
    "ROOT_EXPLORER_URL",
    "CHILD_EXPLORER_URL",
    "PLASMA_ADDRESS",
    "PLASMA_POLL_INTERVAL_MS",
    "PLASMA_CONFIRMATION_DEPTH",
    "PLASMA_MAX_UTXOS",
];

fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}

#[test]
fn file_then_env_precedence() {
    let _guard = lock_env();
    clear_env();
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("plasma.json");
    std::fs::write(
        &path,
        r#"{"watcher_url": "http://localhost:7434", "confirmation_depth": 4, "poll_interval_ms": 250}"#,
    )
    .unwrap();

    let from_file = PlasmaConfig::load(Some(&path)).unwrap().validate().unwrap();
    assert_eq!(from_file.watcher_url, "http://localhost:7434/");
    assert_eq!(from_file.confirmation_depth, 4);
    assert_eq!(from_file.poll_interval_ms, 250);

    std::env::set_var("PLASMA_CONFIRMATION_DEPTH", "12");
    std::env::set_var("WATCHER_URL", "http://watcher.local");
    let layered = PlasmaConfig::load(Some(&path)).unwrap().validate().unwrap();
    clear_env();

    assert_eq!(layered.confirmation_depth, 12);
    assert_eq!(layered.watcher_url, "http://watcher.local/");
    assert_eq!(layered.poll_interval_ms, 250);
}

#[test]
fn missing_explicit_file_is_an_error() {
    let _guard = lock_env();
    let dir = TempDir::new().expect("tempdir");
    assert!(PlasmaConfig::load(Some(&dir.path().join("absent.json"))).is_err());
}

#[test]
fn invalid_cap_from_env_fails_validation() {
    let _guard = lock_env();
    clear_env();
    std::env::set_var("PLASMA_MAX_UTXOS", "9");
    let result = PlasmaConfig::load(None).and_then(|c| c.validate());
    clear_env();
    assert!(result.is_err());
}
