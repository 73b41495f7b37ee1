//! Transaction assembly from selected inputs.
//!
//! Output order is fixed: destination, change, then fee returns. Every unit
//! of every input currency ends up in exactly one output.

use alloy_primitives::{Address, U256};

use crate::error::{PlasmaError, PlasmaResult};
use crate::types::{Amount, Currency, Output, TransactionBody, Utxo, MAX_INPUTS, MAX_OUTPUTS};

/// Builds an unsigned body paying `amount` of `currency` to `destination`.
///
/// Inputs in other currencies (the fee UTXO of a token transfer) are returned
/// to `sender` in full, one output per currency.
pub fn build_transaction(
    inputs: Vec<Utxo>,
    sender: Address,
    destination: Address,
    amount: Amount,
    currency: Currency,
) -> PlasmaResult<TransactionBody> {
    if inputs.is_empty() || inputs.len() > MAX_INPUTS {
        return Err(PlasmaError::InvalidTransaction(format!("{} inputs, expected 1 to {}", inputs.len(), MAX_INPUTS)));
    }

    let available = checked_sum(inputs.iter().filter(|u| u.currency == currency))?;
    let change = available.checked_sub(amount).ok_or_else(|| {
        PlasmaError::InvalidTransaction(format!("inputs hold {} but {} is being sent", available, amount))
    })?;

    let mut outputs = vec![Output { owner: destination, currency, amount }];
    if change > U256::ZERO {
        outputs.push(Output { owner: sender, currency, amount: change });
    }

    let mut fee_currencies: Vec<Currency> = Vec::new();
    for utxo in inputs.iter().filter(|u| u.currency != currency) {
        if !fee_currencies.contains(&utxo.currency) {
            fee_currencies.push(utxo.currency);
        }
    }
    for fee_currency in fee_currencies {
        let returned = checked_sum(inputs.iter().filter(|u| u.currency == fee_currency))?;
        outputs.push(Output { owner: sender, currency: fee_currency, amount: returned });
    }

    if outputs.len() > MAX_OUTPUTS {
        return Err(PlasmaError::InvalidTransaction(format!("{} outputs, at most {} allowed", outputs.len(), MAX_OUTPUTS)));
    }

    Ok(TransactionBody { inputs, outputs })
}

fn checked_sum<'a>(mut utxos: impl Iterator<Item = &'a Utxo>) -> PlasmaResult<Amount> {
    utxos.try_fold(U256::ZERO, |acc, u| {
        acc.checked_add(u.amount).ok_or_else(|| PlasmaError::InvalidTransaction("input total overflows".into()))
    })
}
