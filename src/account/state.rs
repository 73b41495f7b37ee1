//! Lifecycle phase and cached account view.

use alloy_primitives::{Address, U256};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};

use crate::error::{PlasmaError, PlasmaResult};
use crate::types::{amount_serde, Amount, Balance};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
}

/// Snapshot of what the account last observed. Informational only; UTXOs are
/// always re-fetched before they are spent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccountState {
    pub phase: Phase,
    pub address: Option<Address>,
    #[serde(with = "amount_serde")]
    pub root_balance: Amount,
    pub child_balances: Vec<Balance>,
}

impl AccountState {
    pub fn child_balance(&self, currency: Address) -> Amount {
        self.child_balances.iter().find(|b| b.currency == currency).map(|b| b.amount).unwrap_or(U256::ZERO)
    }
}

pub(crate) struct StateCell(Mutex<AccountState>);

impl StateCell {
    pub fn new() -> Self { Self(Mutex::new(AccountState::default())) }

    pub fn lock(&self) -> PlasmaResult<MutexGuard<'_, AccountState>> {
        self.0.lock().map_err(|_| PlasmaError::Poisoned)
    }

    pub fn snapshot(&self) -> PlasmaResult<AccountState> {
        Ok(self.lock()?.clone())
    }

    /// Moves to `initializing`, clearing any previous state. Fails if an
    /// initialization is already running.
    pub fn begin_init(&self) -> PlasmaResult<InitGuard<'_>> {
        let mut state = self.lock()?;
        if state.phase == Phase::Initializing {
            return Err(PlasmaError::AlreadyInitializing);
        }
        *state = AccountState { phase: Phase::Initializing, ..AccountState::default() };
        Ok(InitGuard { cell: self, done: false })
    }

    /// Address of a ready account.
    pub fn ready_address(&self) -> PlasmaResult<Address> {
        let state = self.lock()?;
        match (state.phase, state.address) {
            (Phase::Ready, Some(address)) => Ok(address),
            _ => Err(PlasmaError::NotInitialized),
        }
    }
}

/// Returns the phase to `uninitialized` when dropped before `complete`, so a
/// failed or abandoned initialization can be retried.
pub(crate) struct InitGuard<'a> {
    cell: &'a StateCell,
    done: bool,
}

impl InitGuard<'_> {
    pub fn complete(mut self, address: Address, root_balance: Amount, child_balances: Vec<Balance>) -> PlasmaResult<()> {
        let mut state = self.cell.lock()?;
        *state = AccountState { phase: Phase::Ready, address: Some(address), root_balance, child_balances };
        self.done = true;
        Ok(())
    }
}

impl Drop for InitGuard<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        if let Ok(mut state) = self.cell.lock() {
            *state = AccountState::default();
        }
    }
}
