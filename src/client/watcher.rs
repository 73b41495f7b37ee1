//! WatcherClient - HTTP client for the child-chain watcher.
//!
//! Every endpoint is a POST with a JSON body. Responses are wrapped as
//! `{"success": bool, "data": ...}`; on failure `data` carries
//! `{"code", "description"}`.

use alloy_primitives::Address;
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

use super::{ChildChain, ClientError, ClientResult};
use crate::config::normalize_url;
use crate::types::{Balance, ExitData, SignedTransaction, SubmitResult, TransactionSummary, Utxo};

#[derive(Debug, Clone)]
pub struct WatcherClient {
    base: Url,
    client: Client,
}

#[derive(Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize, Default)]
struct WatcherErrorData {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

impl WatcherClient {
    /// `watcher_url` like "https://watcher.ari.omg.network". A trailing `/` is added if missing.
    pub fn new(watcher_url: &str) -> ClientResult<Self> {
        let base = Url::parse(&normalize_url(watcher_url))?;
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { base, client })
    }

    pub fn base_url(&self) -> &Url { &self.base }

    async fn post<B: Serialize, R: DeserializeOwned>(&self, endpoint: &str, body: &B) -> ClientResult<R> {
        let url = self.base.join(endpoint)?;
        tracing::debug!(%url, "watcher request");

        let resp = self.client.post(url).json(body).send().await?;
        let status = resp.status();
        let envelope: Envelope = resp.json().await.map_err(|e| {
            if status.is_success() { ClientError::Http(e) } else { ClientError::Other(format!("{} HTTP {}", endpoint, status)) }
        })?;

        if !envelope.success {
            let detail: WatcherErrorData = serde_json::from_value(envelope.data).unwrap_or_default();
            return Err(ClientError::Watcher {
                endpoint: endpoint.to_string(),
                code: detail.code,
                description: detail.description,
            });
        }
        serde_json::from_value(envelope.data).map_err(|e| ClientError::Decode(format!("{}: {}", endpoint, e)))
    }
}

/// Body for `transaction.submit_typed`: the typed payload plus one signature per input.
pub(crate) fn submit_body(tx: &SignedTransaction) -> Value {
    let mut body = tx.typed_data.clone();
    if let Value::Object(map) = &mut body {
        map.insert("signatures".into(), json!(tx.signatures));
    }
    body
}

#[async_trait]
impl ChildChain for WatcherClient {
    async fn get_utxos(&self, address: Address) -> ClientResult<Vec<Utxo>> {
        self.post("account.get_utxos", &json!({ "address": address })).await
    }

    async fn get_balance(&self, address: Address) -> ClientResult<Vec<Balance>> {
        self.post("account.get_balance", &json!({ "address": address })).await
    }

    async fn get_transactions(&self, address: Address, limit: usize) -> ClientResult<Vec<TransactionSummary>> {
        self.post("transaction.all", &json!({ "address": address, "limit": limit })).await
    }

    async fn submit_transaction(&self, tx: &SignedTransaction) -> ClientResult<SubmitResult> {
        self.post("transaction.submit_typed", &submit_body(tx)).await
    }

    async fn get_exit_data(&self, utxo: &Utxo) -> ClientResult<ExitData> {
        self.post("utxo.get_exit_data", &json!({ "utxo_pos": utxo.utxo_pos })).await
    }
}
