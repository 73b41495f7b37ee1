//! Ledger types shared by the selector, builder, clients and account.
//!
//! Amounts are 256-bit unsigned integers, the widest value either ledger can
//! hold. The primary currency is the zero address.

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token amount in base units (wei for the primary currency).
pub type Amount = U256;

/// Currency identifier: the zero address for ETH, otherwise an ERC20 contract.
pub type Currency = Address;

/// The root chain's native currency.
pub const ETH_CURRENCY: Currency = Address::ZERO;

/// Protocol limits for a child-chain transaction.
pub const MAX_INPUTS: usize = 4;
pub const MAX_OUTPUTS: usize = 4;

const BLOCK_OFFSET: u64 = 1_000_000_000;
const TX_OFFSET: u64 = 10_000;

/// Chain-assigned position of an output: `blknum * 1e9 + txindex * 1e4 + oindex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UtxoPos(pub u64);

impl UtxoPos {
    pub fn new(blknum: u64, txindex: u64, oindex: u64) -> Self {
        Self(blknum * BLOCK_OFFSET + txindex * TX_OFFSET + oindex)
    }
    pub fn blknum(&self) -> u64 { self.0 / BLOCK_OFFSET }
    pub fn txindex(&self) -> u64 { (self.0 % BLOCK_OFFSET) / TX_OFFSET }
    pub fn oindex(&self) -> u64 { self.0 % TX_OFFSET }
}

impl fmt::Display for UtxoPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unspent output as reported by the watcher. Never cached across operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub utxo_pos: UtxoPos,
    pub owner: Address,
    pub currency: Currency,
    #[serde(with = "amount_serde")]
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub owner: Address,
    pub currency: Currency,
    #[serde(with = "amount_serde")]
    pub amount: Amount,
}

/// Unsigned transfer body. Input and output order is part of the signed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionBody {
    pub inputs: Vec<Utxo>,
    pub outputs: Vec<Output>,
}

impl TransactionBody {
    /// Sum of input amounts in `currency`.
    pub fn input_total(&self, currency: Currency) -> Amount {
        self.inputs.iter().filter(|u| u.currency == currency).fold(U256::ZERO, |acc, u| acc.saturating_add(u.amount))
    }

    /// Sum of output amounts in `currency`.
    pub fn output_total(&self, currency: Currency) -> Amount {
        self.outputs.iter().filter(|o| o.currency == currency).fold(U256::ZERO, |acc, o| acc.saturating_add(o.amount))
    }
}

/// Body plus one signature per input, and the typed payload that was signed.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedTransaction {
    pub body: TransactionBody,
    pub typed_data: serde_json::Value,
    pub signatures: Vec<Bytes>,
}

/// Per-currency child-chain balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub currency: Currency,
    #[serde(with = "amount_serde")]
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub blknum: u64,
    #[serde(default)]
    pub timestamp: Option<u64>,
}

/// Child-chain transaction history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub txhash: B256,
    #[serde(default)]
    pub block: Option<BlockSummary>,
    #[serde(default)]
    pub txindex: Option<u64>,
}

/// Result of submitting a signed transaction to the child chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResult {
    pub txhash: B256,
    pub blknum: u64,
    pub txindex: u64,
}

/// Everything the root-chain contract needs to start a standard exit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitData {
    pub utxo_pos: UtxoPos,
    pub txbytes: Bytes,
    pub proof: Bytes,
}

/// Root-chain transaction receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub transaction_hash: B256,
    pub block_number: u64,
    /// `false` when the transaction was mined but reverted.
    pub status: bool,
}

/// Sums a slice of UTXOs. Saturates rather than wraps; callers compare, never store.
pub fn total(utxos: &[Utxo]) -> Amount {
    utxos.iter().fold(U256::ZERO, |acc, u| acc.saturating_add(u.amount))
}

/// Amounts arrive as JSON numbers or as decimal / `0x` strings. Sent as numbers when they fit.
pub mod amount_serde {
    use super::Amount;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use serde_json::Value;
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(amount: &Amount, s: S) -> Result<S::Ok, S::Error> {
        match u64::try_from(*amount) {
            Ok(small) => s.serialize_u64(small),
            Err(_) => s.serialize_str(&amount.to_string()),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Amount, D::Error> {
        match Value::deserialize(d)? {
            // arbitrary_precision keeps the literal digits
            Value::Number(n) => Amount::from_str(&n.to_string())
                .map_err(|e| D::Error::custom(format!("amount out of range: {}: {}", n, e))),
            Value::String(s) => parse(&s).map_err(D::Error::custom),
            other => Err(D::Error::custom(format!("invalid amount: {}", other))),
        }
    }

    /// Parses a decimal or `0x`-prefixed hex amount.
    pub fn parse(s: &str) -> Result<Amount, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty amount".into());
        }
        Amount::from_str(s).map_err(|e| format!("invalid amount '{}': {}", s, e))
    }
}
