//! Client boundaries: the child-chain watcher, the root-chain contract, the
//! chain reader used for confirmations, and the typed-data signer.
//!
//! # Architecture
//!
//! ```text
//! PlasmaAccount
//!     │
//!     ├── ChildChain ──────── WatcherClient (HTTP, {success, data} envelope)
//!     │
//!     ├── RootChain ───────── RootChainContract ─┐
//!     ├── ChainReader ───────────────────────────┼── EthRpc (JSON-RPC 2.0)
//!     └── TypedDataSigner ───────────────────────┘
//! ```
//!
//! Every trait is object safe so the account holds `Arc<dyn ...>` handles and
//! tests can substitute in-memory implementations.

mod rootchain;
mod rpc;
mod watcher;

pub use rootchain::RootChainContract;
pub use rpc::EthRpc;
pub use watcher::WatcherClient;

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::types::{Amount, Balance, Currency, ExitData, Receipt, SignedTransaction, SubmitResult, TransactionSummary, Utxo, UtxoPos};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("url parse: {0}")]
    Url(#[from] url::ParseError),
    #[error("rpc error (method {method}) code={code} message={message}")]
    Rpc { method: String, code: i64, message: String },
    #[error("watcher error ({endpoint}) {code}: {description}")]
    Watcher { endpoint: String, code: String, description: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("transaction {0} reverted")]
    Reverted(B256),
    #[error("{0}")]
    Other(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Child-chain watcher service.
#[async_trait]
pub trait ChildChain: Send + Sync {
    async fn get_utxos(&self, address: Address) -> ClientResult<Vec<Utxo>>;
    async fn get_balance(&self, address: Address) -> ClientResult<Vec<Balance>>;
    async fn get_transactions(&self, address: Address, limit: usize) -> ClientResult<Vec<TransactionSummary>>;
    async fn submit_transaction(&self, tx: &SignedTransaction) -> ClientResult<SubmitResult>;
    async fn get_exit_data(&self, utxo: &Utxo) -> ClientResult<ExitData>;
}

/// Root-chain plasma contract. Write calls resolve once a receipt exists.
#[async_trait]
pub trait RootChain: Send + Sync {
    async fn accounts(&self) -> ClientResult<Vec<Address>>;
    async fn balance(&self, address: Address) -> ClientResult<Amount>;
    async fn client_version(&self) -> ClientResult<String>;
    async fn deposit_eth(&self, deposit_tx: Bytes, amount: Amount, from: Address) -> ClientResult<Receipt>;
    async fn deposit_token(&self, deposit_tx: Bytes, from: Address) -> ClientResult<Receipt>;
    async fn approve_token(&self, token: Currency, spender: Address, amount: Amount, from: Address) -> ClientResult<Receipt>;
    async fn start_standard_exit(&self, utxo_pos: UtxoPos, tx_bytes: Bytes, proof: Bytes, from: Address) -> ClientResult<Receipt>;
}

/// Read access to root-chain blocks and transactions.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn transaction_receipt(&self, hash: B256) -> ClientResult<Option<Receipt>>;
    async fn block_number(&self) -> ClientResult<u64>;
    /// Block currently holding `hash`; `None` if the transaction is pending or unknown.
    async fn transaction_block(&self, hash: B256) -> ClientResult<Option<u64>>;
}

/// External signing capability for structured payloads.
#[async_trait]
pub trait TypedDataSigner: Send + Sync {
    async fn sign_typed_data(&self, signer: Address, payload: &Value) -> ClientResult<Bytes>;
}
