//! Plasma account client: deposit to, transfer on, and exit from a Plasma
//! child chain.
//!
//! # Architecture
//!
//! ```text
//! PlasmaAccount (lifecycle + orchestration)
//!   │
//!   ├── UtxoSelector ──► build_transaction ──► typed_data ──► TypedDataSigner
//!   │
//!   ├── ChildChain (WatcherClient)      UTXOs, balances, submit, exit data
//!   │
//!   ├── RootChain (RootChainContract)   deposit, approve, start exit
//!   │
//!   └── ConfirmationPoller (ChainReader) block depth + uncle detection
//! ```
//!
//! # Operations
//!
//! | Operation | Method | Result |
//! |-----------|--------|--------|
//! | initialize | `account.initialize()` | resolves the address, loads balances |
//! | deposit | `account.deposit(amount, currency, approve)` | root-chain receipt link |
//! | transfer | `account.transfer(to, amount, currency)` | child-chain tx link |
//! | exit | `account.exit()` | one message per exited UTXO |
//!
//! # Features
//!
//! - `native` - CLI, HTTP server, log subscriber and `.env` loading
//!
//! # Usage
//!
//! ```ignore
//! use plasma_account::{PlasmaAccount, PlasmaConfig, ETH_CURRENCY};
//!
//! let account = PlasmaAccount::connect(PlasmaConfig::load(None)?)?;
//! account.initialize().await?;
//! let message = account.deposit(U256::from(100_000u64), ETH_CURRENCY, false).await?;
//! ```

pub mod account;
pub mod builder;
pub mod client;
pub mod config;
pub mod confirm;
pub mod console;
pub mod encoding;
pub mod error;
pub mod runtime;
pub mod selector;
pub mod service;
pub mod typed_data;
pub mod types;

// =============================================================================
// Native-only modules (server, CLI logging)
// =============================================================================
#[cfg(feature = "native")]
pub mod logging;
#[cfg(feature = "native")]
pub mod server;

// =============================================================================
// Re-exports
// =============================================================================
pub use account::{AccountState, Phase, PlasmaAccount};
pub use builder::build_transaction;
pub use client::{ChainReader, ChildChain, ClientError, EthRpc, RootChain, RootChainContract, TypedDataSigner, WatcherClient};
pub use config::{normalize_url, PlasmaConfig};
pub use confirm::{ConfirmationPoller, PollState};
pub use encoding::encode_deposit;
pub use error::{ExitFailure, ExitReport, PlasmaError, PlasmaResult};
pub use runtime::{install_signal_handlers, Shutdown};
pub use selector::UtxoSelector;
pub use service::{service_check, ServiceMonitor, ServiceReport, ServiceStatus};
pub use typed_data::typed_data;
pub use types::{Amount, Balance, Currency, ExitData, Output, Receipt, SignedTransaction, SubmitResult, TransactionBody, TransactionSummary, Utxo, UtxoPos, ETH_CURRENCY};

#[cfg(feature = "native")]
pub use server::create_router;
