//! In-memory chain doubles shared by the integration suites.

#![allow(dead_code)]

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use plasma_account::client::ClientResult;
use plasma_account::{
    Amount, Balance, ChainReader, ChildChain, ClientError, Currency, ExitData, PlasmaAccount, PlasmaConfig, Receipt, RootChain,
    SignedTransaction, SubmitResult, TransactionSummary, TypedDataSigner, Utxo, UtxoPos,
};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub fn me() -> Address { Address::repeat_byte(0xaa) }
pub fn dest() -> Address { Address::repeat_byte(0xbb) }
pub fn token() -> Address { Address::repeat_byte(0x77) }

pub fn utxo(pos: u64, amount: u64, currency: Currency) -> Utxo {
    Utxo { utxo_pos: UtxoPos(pos), owner: me(), currency, amount: U256::from(amount) }
}

pub fn test_config() -> PlasmaConfig {
    PlasmaConfig::default().with_poll_interval_ms(1)
}

#[derive(Default)]
pub struct MockChild {
    pub utxos: Mutex<Vec<Utxo>>,
    pub balances: Mutex<Vec<Balance>>,
    pub submitted: Mutex<Vec<SignedTransaction>>,
    pub failing_exit_data: Mutex<HashSet<UtxoPos>>,
}

#[async_trait]
impl ChildChain for MockChild {
    async fn get_utxos(&self, _address: Address) -> ClientResult<Vec<Utxo>> {
        Ok(self.utxos.lock().unwrap().clone())
    }

    async fn get_balance(&self, _address: Address) -> ClientResult<Vec<Balance>> {
        Ok(self.balances.lock().unwrap().clone())
    }

    async fn get_transactions(&self, _address: Address, limit: usize) -> ClientResult<Vec<TransactionSummary>> {
        let all: Vec<TransactionSummary> = (0..3u8)
            .map(|i| TransactionSummary { txhash: B256::repeat_byte(i + 1), block: None, txindex: Some(i as u64) })
            .collect();
        Ok(all.into_iter().take(limit).collect())
    }

    async fn submit_transaction(&self, tx: &SignedTransaction) -> ClientResult<SubmitResult> {
        self.submitted.lock().unwrap().push(tx.clone());
        Ok(SubmitResult { txhash: B256::repeat_byte(0xcc), blknum: 1000, txindex: 0 })
    }

    async fn get_exit_data(&self, utxo: &Utxo) -> ClientResult<ExitData> {
        if self.failing_exit_data.lock().unwrap().contains(&utxo.utxo_pos) {
            return Err(ClientError::Watcher {
                endpoint: "utxo.get_exit_data".into(),
                code: "exit:invalid".into(),
                description: "no exit data".into(),
            });
        }
        Ok(ExitData { utxo_pos: utxo.utxo_pos, txbytes: Bytes::from(vec![0xf8]), proof: Bytes::from(vec![0x01; 32]) })
    }
}

#[derive(Default)]
pub struct MockRoot {
    pub accounts: Mutex<Vec<Address>>,
    pub balance: Mutex<Amount>,
    pub calls: Mutex<Vec<String>>,
    pub failing_exits: Mutex<HashSet<UtxoPos>>,
    pub accounts_gate: Mutex<Option<Arc<Notify>>>,
    /// `(waiter, releaser, gate)`: the waiter's exit blocks until the releaser's exit starts.
    pub exit_gate: Mutex<Option<(UtxoPos, UtxoPos, Arc<Notify>)>>,
    pub version: Mutex<Option<String>>,
    next: AtomicU64,
}

impl MockRoot {
    fn receipt(&self, call: String) -> Receipt {
        self.calls.lock().unwrap().push(call);
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        Receipt { transaction_hash: B256::with_last_byte(n as u8), block_number: 5, status: true }
    }

    pub fn calls(&self) -> Vec<String> { self.calls.lock().unwrap().clone() }
}

#[async_trait]
impl RootChain for MockRoot {
    async fn accounts(&self) -> ClientResult<Vec<Address>> {
        let gate = self.accounts_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn balance(&self, _address: Address) -> ClientResult<Amount> {
        Ok(*self.balance.lock().unwrap())
    }

    async fn client_version(&self) -> ClientResult<String> {
        self.version.lock().unwrap().clone().ok_or_else(|| ClientError::Other("connection refused".into()))
    }

    async fn deposit_eth(&self, _deposit_tx: Bytes, amount: Amount, _from: Address) -> ClientResult<Receipt> {
        Ok(self.receipt(format!("deposit_eth:{}", amount)))
    }

    async fn deposit_token(&self, _deposit_tx: Bytes, _from: Address) -> ClientResult<Receipt> {
        Ok(self.receipt("deposit_token".into()))
    }

    async fn approve_token(&self, token: Currency, _spender: Address, amount: Amount, _from: Address) -> ClientResult<Receipt> {
        Ok(self.receipt(format!("approve:{}:{}", token, amount)))
    }

    async fn start_standard_exit(&self, utxo_pos: UtxoPos, _tx_bytes: Bytes, _proof: Bytes, _from: Address) -> ClientResult<Receipt> {
        let gate = self.exit_gate.lock().unwrap().clone();
        if let Some((waiter, releaser, notify)) = gate {
            if utxo_pos == releaser {
                notify.notify_one();
            } else if utxo_pos == waiter {
                notify.notified().await;
            }
        }
        if self.failing_exits.lock().unwrap().contains(&utxo_pos) {
            self.calls.lock().unwrap().push(format!("exit_failed:{}", utxo_pos));
            return Err(ClientError::Reverted(B256::repeat_byte(0xee)));
        }
        Ok(self.receipt(format!("exit:{}", utxo_pos)))
    }
}

/// Every receipt lands in block 5; the head sits at `head`. Hashes in
/// `uncled` are missing from their block once looked up.
pub struct MockReader {
    pub head: AtomicU64,
    pub uncled: Mutex<HashSet<B256>>,
    pub receipt_calls: AtomicUsize,
}

impl Default for MockReader {
    fn default() -> Self {
        Self { head: AtomicU64::new(10), uncled: Mutex::new(HashSet::new()), receipt_calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl ChainReader for MockReader {
    async fn transaction_receipt(&self, hash: B256) -> ClientResult<Option<Receipt>> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(Receipt { transaction_hash: hash, block_number: 5, status: true }))
    }

    async fn block_number(&self) -> ClientResult<u64> {
        Ok(self.head.load(Ordering::SeqCst))
    }

    async fn transaction_block(&self, hash: B256) -> ClientResult<Option<u64>> {
        if self.uncled.lock().unwrap().contains(&hash) {
            return Ok(None);
        }
        Ok(Some(5))
    }
}

#[derive(Default)]
pub struct MockSigner {
    pub calls: AtomicUsize,
    pub last_payload: Mutex<Option<Value>>,
}

#[async_trait]
impl TypedDataSigner for MockSigner {
    async fn sign_typed_data(&self, _signer: Address, payload: &Value) -> ClientResult<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_payload.lock().unwrap() = Some(payload.clone());
        Ok(Bytes::from(vec![0x5a; 65]))
    }
}

pub struct Harness {
    pub account: Arc<PlasmaAccount>,
    pub child: Arc<MockChild>,
    pub root: Arc<MockRoot>,
    pub reader: Arc<MockReader>,
    pub signer: Arc<MockSigner>,
}

pub fn harness_with(config: PlasmaConfig) -> Harness {
    let child = Arc::new(MockChild::default());
    let root = Arc::new(MockRoot::default());
    *root.accounts.lock().unwrap() = vec![me()];
    *root.balance.lock().unwrap() = U256::from(1_000_000u64);
    let reader = Arc::new(MockReader::default());
    let signer = Arc::new(MockSigner::default());
    let account = Arc::new(PlasmaAccount::new(config, child.clone(), root.clone(), reader.clone(), signer.clone()));
    Harness { account, child, root, reader, signer }
}

pub fn harness() -> Harness { harness_with(test_config()) }

pub async fn ready_harness() -> Harness {
    let h = harness();
    h.account.initialize().await.expect("initialize");
    h
}
