//! Plasma configuration.
//!
//! Layers, lowest precedence first: defaults, JSON file, environment, then
//! whatever the caller applies with the `with_*` builders (CLI flags).

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{PlasmaError, PlasmaResult};
use crate::types::MAX_INPUTS;

pub const DEFAULT_CONFIG_FILE: &str = ".plasma.json";

pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x44de0ec539b8c4a4b530c78620fe8320167f2f74";
pub const DEFAULT_ROOT_CHAIN_URL: &str = "https://rinkeby.infura.io/";
pub const DEFAULT_WATCHER_URL: &str = "https://watcher.ari.omg.network/";
pub const DEFAULT_ROOT_EXPLORER_URL: &str = "https://rinkeby.etherscan.io/";
pub const DEFAULT_CHILD_EXPLORER_URL: &str = "http://quest.ari.omg.network/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlasmaConfig {
    pub plasma_contract_address: Address,
    /// Web3 provider for the root chain.
    pub root_chain_url: String,
    pub watcher_url: String,
    pub root_explorer_url: String,
    pub child_explorer_url: String,
    /// Account to act as; the provider's first account when unset.
    pub address: Option<Address>,
    pub poll_interval_ms: u64,
    pub confirmation_depth: u64,
    pub max_selected_utxos: usize,
    pub service_check_interval_ms: u64,
}

impl Default for PlasmaConfig {
    fn default() -> Self {
        Self {
            plasma_contract_address: DEFAULT_CONTRACT_ADDRESS.parse().unwrap_or(Address::ZERO),
            root_chain_url: DEFAULT_ROOT_CHAIN_URL.into(),
            watcher_url: DEFAULT_WATCHER_URL.into(),
            root_explorer_url: DEFAULT_ROOT_EXPLORER_URL.into(),
            child_explorer_url: DEFAULT_CHILD_EXPLORER_URL.into(),
            address: None,
            poll_interval_ms: 1000,
            confirmation_depth: 1,
            max_selected_utxos: MAX_INPUTS,
            service_check_interval_ms: 5000,
        }
    }
}

impl PlasmaConfig {
    pub fn with_contract(mut self, address: Address) -> Self { self.plasma_contract_address = address; self }
    pub fn with_root_chain_url(mut self, url: impl Into<String>) -> Self { self.root_chain_url = url.into(); self }
    pub fn with_watcher_url(mut self, url: impl Into<String>) -> Self { self.watcher_url = url.into(); self }
    pub fn with_root_explorer_url(mut self, url: impl Into<String>) -> Self { self.root_explorer_url = url.into(); self }
    pub fn with_child_explorer_url(mut self, url: impl Into<String>) -> Self { self.child_explorer_url = url.into(); self }
    pub fn with_address(mut self, address: Address) -> Self { self.address = Some(address); self }
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self { self.poll_interval_ms = ms; self }
    pub fn with_confirmation_depth(mut self, depth: u64) -> Self { self.confirmation_depth = depth; self }
    pub fn with_max_selected_utxos(mut self, max: usize) -> Self { self.max_selected_utxos = max; self }

    /// Defaults, then `path` (or `.plasma.json` if present), then the environment.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> PlasmaResult<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> PlasmaResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| PlasmaError::Config(format!("reading {}: {}", path.display(), e)))?;
        serde_json::from_str(&raw).map_err(|e| PlasmaError::Config(format!("parsing {}: {}", path.display(), e)))
    }

    /// Overrides fields from environment variables, read through `lookup`.
    pub fn apply_env<F>(mut self, lookup: F) -> PlasmaResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("PLASMA_CONTRACT_ADDRESS") {
            self.plasma_contract_address = parse_address("PLASMA_CONTRACT_ADDRESS", &v)?;
        }
        if let Some(v) = get("WEB3_PROVIDER_URL") { self.root_chain_url = v; }
        if let Some(v) = get("WATCHER_URL") { self.watcher_url = v; }
        if let Some(v) = get("ROOT_EXPLORER_URL") { self.root_explorer_url = v; }
        if let Some(v) = get("CHILD_EXPLORER_URL") { self.child_explorer_url = v; }
        if let Some(v) = get("PLASMA_ADDRESS") {
            self.address = Some(parse_address("PLASMA_ADDRESS", &v)?);
        }
        if let Some(v) = get("PLASMA_POLL_INTERVAL_MS") {
            self.poll_interval_ms = parse_number("PLASMA_POLL_INTERVAL_MS", &v)?;
        }
        if let Some(v) = get("PLASMA_CONFIRMATION_DEPTH") {
            self.confirmation_depth = parse_number("PLASMA_CONFIRMATION_DEPTH", &v)?;
        }
        if let Some(v) = get("PLASMA_MAX_UTXOS") {
            self.max_selected_utxos = parse_number("PLASMA_MAX_UTXOS", &v)?;
        }
        Ok(self)
    }

    /// Normalizes every URL and checks the remaining invariants.
    pub fn validate(mut self) -> PlasmaResult<Self> {
        if self.plasma_contract_address == Address::ZERO {
            return Err(PlasmaError::Config("plasma contract address is not set".into()));
        }
        for (name, url) in [
            ("root_chain_url", &mut self.root_chain_url),
            ("watcher_url", &mut self.watcher_url),
            ("root_explorer_url", &mut self.root_explorer_url),
            ("child_explorer_url", &mut self.child_explorer_url),
        ] {
            if url.trim().is_empty() {
                return Err(PlasmaError::Config(format!("{} is empty", name)));
            }
            *url = normalize_url(url.trim());
        }
        if !(1..=MAX_INPUTS).contains(&self.max_selected_utxos) {
            return Err(PlasmaError::Config(format!(
                "max_selected_utxos must be between 1 and {}, got {}",
                MAX_INPUTS, self.max_selected_utxos
            )));
        }
        Ok(self)
    }

    pub fn poll_interval(&self) -> Duration { Duration::from_millis(self.poll_interval_ms) }

    pub fn service_check_interval(&self) -> Duration { Duration::from_millis(self.service_check_interval_ms) }

    /// Root-chain explorer link for a transaction hash.
    pub fn root_tx_link(&self, hash: impl std::fmt::Display) -> String {
        format!("{}tx/{}", normalize_url(&self.root_explorer_url), hash)
    }

    /// Child-chain explorer link for a transaction hash.
    pub fn child_tx_link(&self, hash: impl std::fmt::Display) -> String {
        format!("{}transaction/{}", normalize_url(&self.child_explorer_url), hash)
    }
}

fn parse_address(key: &str, value: &str) -> PlasmaResult<Address> {
    value.parse().map_err(|e| PlasmaError::Config(format!("{}: invalid address '{}': {}", key, value, e)))
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> PlasmaResult<T>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e| PlasmaError::Config(format!("{}: invalid number '{}': {}", key, value, e)))
}

/// Ensures `url` ends with exactly one trailing `/` added when missing.
pub fn normalize_url(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}
