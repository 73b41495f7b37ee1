//! RootChainContract - plasma framework calls sent through the web3 provider.
//!
//! Calldata is ABI-encoded locally; the provider signs with the `from`
//! account. Each write resolves when its receipt appears (depth 0) and fails
//! with `Reverted` when the receipt status is 0.

use alloy_primitives::{aliases::U192, Address, Bytes, B256};
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::rpc::TransactionRequest;
use super::{ClientError, ClientResult, EthRpc, RootChain};
use crate::confirm::ConfirmationPoller;
use crate::error::PlasmaError;
use crate::types::{Amount, Currency, Receipt, UtxoPos};

sol! {
    function deposit(bytes depositTx) external payable;
    function depositFrom(bytes depositTx) external;
    function startStandardExit(uint192 utxoPos, bytes rlpOutputTx, bytes outputTxInclusionProof) external payable;
    function approve(address spender, uint256 amount) external returns (bool);
}

pub struct RootChainContract {
    rpc: Arc<EthRpc>,
    contract: Address,
    receipts: ConfirmationPoller,
}

impl RootChainContract {
    pub fn new(rpc: Arc<EthRpc>, contract: Address, poll_interval: Duration) -> Self {
        let receipts = ConfirmationPoller::new(rpc.clone(), poll_interval, 0);
        Self { rpc, contract, receipts }
    }

    pub fn contract(&self) -> Address { self.contract }

    async fn send_and_wait(&self, tx: TransactionRequest) -> ClientResult<Receipt> {
        let hash = self.rpc.send_transaction(&tx).await?;
        tracing::debug!(%hash, to = %tx.to, "transaction sent");
        let receipt = self.receipts.confirm(hash).await.map_err(|e| receipt_error(hash, e))?;
        if !receipt.status {
            return Err(ClientError::Reverted(hash));
        }
        Ok(receipt)
    }
}

fn receipt_error(hash: B256, err: PlasmaError) -> ClientError {
    match err {
        PlasmaError::Client(e) => e,
        other => ClientError::Other(format!("waiting for receipt of {}: {}", hash, other)),
    }
}

#[async_trait]
impl RootChain for RootChainContract {
    async fn accounts(&self) -> ClientResult<Vec<Address>> {
        self.rpc.accounts().await
    }

    async fn balance(&self, address: Address) -> ClientResult<Amount> {
        self.rpc.balance(address).await
    }

    async fn client_version(&self) -> ClientResult<String> {
        self.rpc.client_version().await
    }

    async fn deposit_eth(&self, deposit_tx: Bytes, amount: Amount, from: Address) -> ClientResult<Receipt> {
        let data = depositCall { depositTx: deposit_tx }.abi_encode();
        self.send_and_wait(TransactionRequest::new(from, self.contract, data).with_value(amount)).await
    }

    async fn deposit_token(&self, deposit_tx: Bytes, from: Address) -> ClientResult<Receipt> {
        let data = depositFromCall { depositTx: deposit_tx }.abi_encode();
        self.send_and_wait(TransactionRequest::new(from, self.contract, data)).await
    }

    async fn approve_token(&self, token: Currency, spender: Address, amount: Amount, from: Address) -> ClientResult<Receipt> {
        let data = approveCall { spender, amount }.abi_encode();
        self.send_and_wait(TransactionRequest::new(from, token, data)).await
    }

    async fn start_standard_exit(&self, utxo_pos: UtxoPos, tx_bytes: Bytes, proof: Bytes, from: Address) -> ClientResult<Receipt> {
        let data = startStandardExitCall {
            utxoPos: U192::from(utxo_pos.0),
            rlpOutputTx: tx_bytes,
            outputTxInclusionProof: proof,
        }
        .abi_encode();
        self.send_and_wait(TransactionRequest::new(from, self.contract, data)).await
    }
}
