//! RLP encoding for root-chain deposit transactions.
//!
//! Only the encoder side is needed: deposits are encoded locally and handed to
//! the contract, exits reuse the bytes served by the watcher.

use alloy_primitives::{Address, Bytes, U256};
use alloy_rlp::RlpEncodable;

use crate::types::{Amount, Currency, MAX_INPUTS, MAX_OUTPUTS};

#[derive(Debug, Clone, Copy, Default, RlpEncodable)]
struct DepositInput {
    blknum: U256,
    txindex: U256,
    oindex: U256,
}

#[derive(Debug, Clone, Copy, Default, RlpEncodable)]
struct DepositOutput {
    owner: Address,
    currency: Currency,
    amount: Amount,
}

#[derive(Debug, Clone, RlpEncodable)]
struct DepositTransaction {
    inputs: Vec<DepositInput>,
    outputs: Vec<DepositOutput>,
}

/// Encodes the deposit transaction crediting `amount` of `currency` to `owner`.
///
/// Layout: `[[4 x [0, 0, 0]], [[owner, currency, amount], 3 x [0x0, 0x0, 0]]]`.
pub fn encode_deposit(owner: Address, amount: Amount, currency: Currency) -> Bytes {
    let mut outputs = vec![DepositOutput { owner, currency, amount }];
    outputs.resize(MAX_OUTPUTS, DepositOutput::default());

    let tx = DepositTransaction { inputs: vec![DepositInput::default(); MAX_INPUTS], outputs };
    Bytes::from(alloy_rlp::encode(&tx))
}
