//! Error taxonomy for account operations.

use alloy_primitives::{Address, B256};
use std::fmt;
use thiserror::Error;

use crate::client::ClientError;
use crate::types::{Amount, UtxoPos};

pub type PlasmaResult<T> = Result<T, PlasmaError>;

#[derive(Debug, Error)]
pub enum PlasmaError {
    #[error("Please wait for the Plasma chain to initialize...")]
    NotInitialized,

    #[error("Already initializing the Plasma chain, please wait...")]
    AlreadyInitializing,

    #[error("Blockchain account configuration is missing. Configure an account address or use a provider that exposes an unlocked account.")]
    AccountNotConfigured,

    #[error("{operation} amount must be more than 0 wei.")]
    InvalidAmount { operation: &'static str },

    #[error("You do not have enough funds for this deposit ({requested} requested, {available} available). Please deposit more funds in to {address} and then try again.")]
    InsufficientFunds { address: Address, requested: Amount, available: Amount },

    #[error("No utxo big enough to cover the amount {amount}")]
    NoUtxoLargeEnough { amount: Amount },

    #[error("Can't find a fee utxo for transaction")]
    NoFeeUtxoAvailable,

    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Error {context}: {source}")]
    SubmissionFailure {
        context: String,
        #[source]
        source: ClientError,
    },

    #[error("Transaction with hash: {hash} ended up in an uncle block.")]
    UncledTransaction { hash: B256 },

    #[error("{0}")]
    ExitFailure(ExitReport),

    #[error("confirmation of {hash} was cancelled")]
    Cancelled { hash: B256 },

    #[error("config: {0}")]
    Config(String),

    #[error("account state lock poisoned")]
    Poisoned,

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl PlasmaError {
    pub(crate) fn submission(context: impl Into<String>, source: ClientError) -> Self {
        Self::SubmissionFailure { context: context.into(), source }
    }
}

/// One UTXO whose exit could not be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitFailure {
    pub utxo_pos: UtxoPos,
    pub reason: String,
}

/// Outcome of an exit batch: every UTXO lands in exactly one list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExitReport {
    pub succeeded: Vec<(UtxoPos, String)>,
    pub failed: Vec<ExitFailure>,
}

impl ExitReport {
    pub fn is_success(&self) -> bool { self.failed.is_empty() }

    pub fn messages(&self) -> Vec<String> {
        self.succeeded.iter().map(|(_, m)| m.clone()).collect()
    }
}

impl fmt::Display for ExitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} exits failed:", self.failed.len(), self.failed.len() + self.succeeded.len())?;
        for failure in &self.failed {
            write!(f, "\nUTXO {}: {}", failure.utxo_pos, failure.reason)?;
        }
        Ok(())
    }
}
