//! EthRpc - JSON-RPC 2.0 over HTTP to the web3 provider.
//!
//! Methods used:
//! - `eth_accounts`, `eth_getBalance`, `web3_clientVersion`
//! - `eth_sendTransaction` (the provider holds and applies the key)
//! - `eth_getTransactionReceipt`, `eth_getTransactionByHash`, `eth_blockNumber`
//! - `eth_signTypedData_v3`

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use url::Url;

use super::{ChainReader, ClientError, ClientResult, TypedDataSigner};
use crate::types::{Amount, Receipt};

/// Outgoing transaction for `eth_sendTransaction`.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub data: Bytes,
}

impl TransactionRequest {
    pub fn new(from: Address, to: Address, data: impl Into<Bytes>) -> Self {
        Self { from, to, value: None, data: data.into() }
    }

    pub fn with_value(mut self, value: Amount) -> Self {
        self.value = Some(format!("0x{:x}", value));
        self
    }
}

#[derive(Debug)]
pub struct EthRpc {
    url: Url,
    client: Client,
    next_id: AtomicU64,
}

impl EthRpc {
    /// `url` like "https://rinkeby.infura.io/".
    pub fn new(url: &str) -> ClientResult<Self> {
        let url = Url::parse(url)?;
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { url, client, next_id: AtomicU64::new(1) })
    }

    pub async fn request<P, R>(&self, method: &str, params: P) -> ClientResult<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        #[derive(Serialize)]
        struct Request<'a, T> {
            jsonrpc: &'a str,
            id: u64,
            method: &'a str,
            params: T,
        }

        #[derive(Deserialize)]
        struct Envelope {
            #[serde(default)]
            result: Option<Value>,
            #[serde(default)]
            error: Option<RpcErrorDetail>,
        }

        #[derive(Deserialize)]
        struct RpcErrorDetail {
            code: i64,
            message: String,
        }

        let request = Request { jsonrpc: "2.0", id: self.next_id.fetch_add(1, Ordering::Relaxed), method, params };
        tracing::trace!(method, "rpc request");

        let resp = self.client.post(self.url.clone()).json(&request).send().await?;
        if !resp.status().is_success() {
            return Err(ClientError::Other(format!("{} HTTP {}", method, resp.status())));
        }
        let envelope: Envelope = resp.json().await?;
        if let Some(err) = envelope.error {
            return Err(ClientError::Rpc { method: method.to_string(), code: err.code, message: err.message });
        }
        // a missing result is a JSON null, which is meaningful for lookups
        serde_json::from_value(envelope.result.unwrap_or(Value::Null))
            .map_err(|e| ClientError::Decode(format!("{}: {}", method, e)))
    }

    pub async fn accounts(&self) -> ClientResult<Vec<Address>> {
        self.request("eth_accounts", ()).await
    }

    pub async fn balance(&self, address: Address) -> ClientResult<Amount> {
        let raw: String = self.request("eth_getBalance", (address, "latest")).await?;
        U256::from_str(&raw).map_err(|e| ClientError::Decode(format!("balance '{}': {}", raw, e)))
    }

    pub async fn client_version(&self) -> ClientResult<String> {
        self.request("web3_clientVersion", ()).await
    }

    pub async fn send_transaction(&self, tx: &TransactionRequest) -> ClientResult<B256> {
        self.request("eth_sendTransaction", [tx]).await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: B256,
    #[serde(default)]
    block_number: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTransaction {
    #[serde(default)]
    block_number: Option<String>,
}

/// Parses a hex quantity such as `"0x1b4"`.
pub(crate) fn parse_quantity(raw: &str) -> ClientResult<u64> {
    let digits = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")).unwrap_or(raw);
    u64::from_str_radix(digits, 16).map_err(|e| ClientError::Decode(format!("quantity '{}': {}", raw, e)))
}

#[async_trait]
impl ChainReader for EthRpc {
    async fn transaction_receipt(&self, hash: B256) -> ClientResult<Option<Receipt>> {
        let raw: Option<RawReceipt> = self.request("eth_getTransactionReceipt", [hash]).await?;
        let Some(raw) = raw else { return Ok(None) };
        // receipts without a block are still pending
        let Some(block) = raw.block_number.as_deref() else { return Ok(None) };
        let status = match raw.status.as_deref() {
            Some(s) => parse_quantity(s)? == 1,
            None => true,
        };
        Ok(Some(Receipt { transaction_hash: raw.transaction_hash, block_number: parse_quantity(block)?, status }))
    }

    async fn block_number(&self) -> ClientResult<u64> {
        let raw: String = self.request("eth_blockNumber", ()).await?;
        parse_quantity(&raw)
    }

    async fn transaction_block(&self, hash: B256) -> ClientResult<Option<u64>> {
        let raw: Option<RawTransaction> = self.request("eth_getTransactionByHash", [hash]).await?;
        match raw.and_then(|tx| tx.block_number) {
            Some(block) => parse_quantity(&block).map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl TypedDataSigner for EthRpc {
    async fn sign_typed_data(&self, signer: Address, payload: &Value) -> ClientResult<Bytes> {
        let signature: String = self
            .request("eth_signTypedData_v3", (signer.to_checksum(None), payload.to_string()))
            .await?;
        Bytes::from_str(&signature).map_err(|e| ClientError::Decode(format!("signature: {}", e)))
    }
}
