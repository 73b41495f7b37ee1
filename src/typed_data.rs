//! Structured signing payload for child-chain transactions.
//!
//! The payload follows the EIP-712 layout accepted by `eth_signTypedData_v3`
//! and by the watcher's typed submission endpoint. Inputs and outputs are
//! padded to the protocol maximum with zero entries.

use alloy_primitives::{Address, B256};
use serde_json::{json, Map, Value};

use crate::types::{TransactionBody, MAX_INPUTS, MAX_OUTPUTS};

pub const DOMAIN_NAME: &str = "OMG Network";
pub const DOMAIN_VERSION: &str = "1";
pub const DOMAIN_SALT: &str = "0xfad5c7f626d80f9256ef01929f3beb96e058b8b4b0e3fe52d84f054c0e2a7a83";

/// Builds the typed payload for `body`, bound to the plasma contract.
pub fn typed_data(body: &TransactionBody, verifying_contract: Address) -> Value {
    let mut message = Map::new();

    for i in 0..MAX_INPUTS {
        let input = match body.inputs.get(i) {
            Some(utxo) => json!({
                "blknum": utxo.utxo_pos.blknum(),
                "txindex": utxo.utxo_pos.txindex(),
                "oindex": utxo.utxo_pos.oindex(),
            }),
            None => json!({"blknum": 0, "txindex": 0, "oindex": 0}),
        };
        message.insert(format!("input{}", i), input);
    }

    for i in 0..MAX_OUTPUTS {
        let output = match body.outputs.get(i) {
            Some(out) => json!({
                "owner": out.owner.to_checksum(None),
                "currency": out.currency.to_checksum(None),
                "amount": out.amount.to_string(),
            }),
            None => json!({
                "owner": Address::ZERO.to_checksum(None),
                "currency": Address::ZERO.to_checksum(None),
                "amount": "0",
            }),
        };
        message.insert(format!("output{}", i), output);
    }

    message.insert("metadata".into(), json!(format!("0x{}", hex::encode(B256::ZERO))));

    json!({
        "types": types(),
        "domain": {
            "name": DOMAIN_NAME,
            "version": DOMAIN_VERSION,
            "verifyingContract": verifying_contract.to_checksum(None),
            "salt": DOMAIN_SALT,
        },
        "primaryType": "Transaction",
        "message": Value::Object(message),
    })
}

fn types() -> Value {
    let mut transaction: Vec<Value> = (0..MAX_INPUTS)
        .map(|i| json!({"name": format!("input{}", i), "type": "Input"}))
        .collect();
    transaction.extend((0..MAX_OUTPUTS).map(|i| json!({"name": format!("output{}", i), "type": "Output"})));
    transaction.push(json!({"name": "metadata", "type": "bytes32"}));

    json!({
        "EIP712Domain": [
            {"name": "name", "type": "string"},
            {"name": "version", "type": "string"},
            {"name": "verifyingContract", "type": "address"},
            {"name": "salt", "type": "bytes32"},
        ],
        "Transaction": transaction,
        "Input": [
            {"name": "blknum", "type": "uint256"},
            {"name": "txindex", "type": "uint256"},
            {"name": "oindex", "type": "uint256"},
        ],
        "Output": [
            {"name": "owner", "type": "address"},
            {"name": "currency", "type": "address"},
            {"name": "amount", "type": "uint256"},
        ],
    })
}
