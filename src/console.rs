//! Console commands: `plasma init`, `plasma deposit 100000`, `plasma send 0x.. 555`, ...

use alloy_primitives::Address;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::account::PlasmaAccount;
use crate::types::{amount_serde, Amount, ETH_CURRENCY};

pub const USAGE: &str = "\
plasma init [--force]            initialize the Plasma chain for the configured account
plasma deposit [amount]          deposit wei from the root chain, ie 'plasma deposit 100000'
plasma send [to_address] [amount]  send wei on the Plasma chain
plasma exit                      start exits for every UTXO of the account
plasma status                    show the account state
plasma balance                   refresh and show root and child balances
plasma utxos                     list the account's UTXOs
plasma help                      show this help";

pub const ALREADY_INITIALIZED: &str = "The Plasma chain is already initialized. If you'd like to reinitialize the chain, use the --force option ('plasma init --force').";
pub const NOT_INITIALIZED: &str = "The Plasma chain has not been initialized. Please initialize the Plasma chain using 'plasma init' before continuing.";
const DEPOSIT_FORMAT: &str = "Invalid command format, please use the format 'plasma deposit [amount]', ie 'plasma deposit 100000'";
const SEND_FORMAT: &str = "Invalid command format, please use the format 'plasma send [to_address] [amount]', ie 'plasma send 0x38d5beb778b6e62d82e3ba4633e08987e6d0f990 555'";

static INIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^plasma\s+init(\s+--force)?$").expect("init regex"));
static DEPOSIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^plasma\s+deposit\s+([0-9]+)$").expect("deposit regex"));
static SEND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^plasma\s+send\s+(0x[0-9a-fA-F]{40})\s+([0-9]+)$").expect("send regex"));
static SIMPLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^plasma\s+(exit|status|balance|utxos|help)$").expect("command regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Init { force: bool },
    Deposit { amount: Amount },
    Send { to: Address, amount: Amount },
    Exit,
    Status,
    Balance,
    Utxos,
    Help,
}

/// Parses one console line. The error is text to show the user.
pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();

    if let Some(caps) = INIT_RE.captures(line) {
        return Ok(Command::Init { force: caps.get(1).is_some() });
    }
    if let Some(caps) = DEPOSIT_RE.captures(line) {
        let amount = amount_serde::parse(&caps[1]).map_err(|_| DEPOSIT_FORMAT.to_string())?;
        return Ok(Command::Deposit { amount });
    }
    if let Some(caps) = SEND_RE.captures(line) {
        let to = caps[1].parse().map_err(|_| SEND_FORMAT.to_string())?;
        let amount = amount_serde::parse(&caps[2]).map_err(|_| SEND_FORMAT.to_string())?;
        return Ok(Command::Send { to, amount });
    }
    if let Some(caps) = SIMPLE_RE.captures(line) {
        return Ok(match &caps[1] {
            "exit" => Command::Exit,
            "status" => Command::Status,
            "balance" => Command::Balance,
            "utxos" => Command::Utxos,
            _ => Command::Help,
        });
    }

    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        ["plasma", "deposit", ..] => Err(DEPOSIT_FORMAT.to_string()),
        ["plasma", "send", ..] => Err(SEND_FORMAT.to_string()),
        _ => Err(format!("Unknown command '{}'. Usage:\n{}", line, USAGE)),
    }
}

/// Runs `command` against `account`. Both arms carry text for the user.
pub async fn execute(account: &PlasmaAccount, command: Command) -> Result<String, String> {
    match command {
        Command::Init { force } => {
            if account.is_ready() && !force {
                return Err(ALREADY_INITIALIZED.to_string());
            }
            account.initialize().await.map_err(|e| e.to_string())
        }
        Command::Help => Ok(USAGE.to_string()),
        _ if !account.is_ready() => Err(NOT_INITIALIZED.to_string()),
        Command::Deposit { amount } => account.deposit(amount, ETH_CURRENCY, false).await.map_err(|e| e.to_string()),
        Command::Send { to, amount } => account.transfer(to, amount, ETH_CURRENCY).await.map_err(|e| e.to_string()),
        Command::Exit => {
            let messages = account.exit().await.map_err(|e| e.to_string())?;
            if messages.is_empty() {
                Ok("No UTXOs to exit.".to_string())
            } else {
                Ok(messages.join("\n"))
            }
        }
        Command::Status => {
            let state = account.state().map_err(|e| e.to_string())?;
            serde_json::to_string_pretty(&state).map_err(|e| e.to_string())
        }
        Command::Balance => {
            let state = account.refresh_balances().await.map_err(|e| e.to_string())?;
            let mut lines = vec![format!("Root chain: {} wei", state.root_balance)];
            if state.child_balances.is_empty() {
                lines.push("Plasma chain: no balances".to_string());
            }
            for balance in &state.child_balances {
                lines.push(format!("Plasma chain: {} of {}", balance.amount, balance.currency.to_checksum(None)));
            }
            Ok(lines.join("\n"))
        }
        Command::Utxos => {
            let utxos = account.utxos().await.map_err(|e| e.to_string())?;
            if utxos.is_empty() {
                return Ok("No UTXOs.".to_string());
            }
            Ok(utxos
                .iter()
                .map(|u| format!("{}  {} of {}", u.utxo_pos, u.amount, u.currency.to_checksum(None)))
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }
}
