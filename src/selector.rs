//! UTXO selection: bounded greedy search over the largest outputs.
//!
//! Candidates in the requested currency are sorted by amount, largest first,
//! and accumulated until the target is covered. Only the first `max_inputs`
//! candidates are scanned; if they fall short the selection fails even when a
//! different combination elsewhere in the pool would have been enough.

use alloy_primitives::U256;

use crate::error::{PlasmaError, PlasmaResult};
use crate::types::{Amount, Currency, Utxo, ETH_CURRENCY, MAX_INPUTS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtxoSelector {
    max_inputs: usize,
    fee_currency: Currency,
}

impl Default for UtxoSelector {
    fn default() -> Self { Self { max_inputs: MAX_INPUTS, fee_currency: ETH_CURRENCY } }
}

impl UtxoSelector {
    /// `max_inputs` is clamped to `1..=MAX_INPUTS`.
    pub fn new(max_inputs: usize) -> Self {
        Self { max_inputs: max_inputs.clamp(1, MAX_INPUTS), ..Self::default() }
    }

    pub fn max_inputs(&self) -> usize { self.max_inputs }

    /// Picks inputs covering `amount` in `currency`.
    ///
    /// With `needs_fee`, one slot is reserved for a fee-currency UTXO that is
    /// appended after the selected inputs.
    pub fn select(&self, utxos: &[Utxo], amount: Amount, currency: Currency, needs_fee: bool) -> PlasmaResult<Vec<Utxo>> {
        let mut sorted: Vec<&Utxo> = utxos.iter().filter(|u| u.currency == currency).collect();
        // stable: equal amounts keep their pool order
        sorted.sort_by(|a, b| b.amount.cmp(&a.amount));

        let scan = if needs_fee { self.max_inputs.min(MAX_INPUTS - 1).max(1) } else { self.max_inputs };

        let mut selected = Vec::with_capacity(scan + 1);
        let mut running = U256::ZERO;
        for utxo in sorted.into_iter().take(scan) {
            selected.push(utxo.clone());
            running = running.saturating_add(utxo.amount);
            if running >= amount {
                break;
            }
        }

        if selected.is_empty() || running < amount {
            tracing::debug!(%amount, %currency, scanned = selected.len(), "no utxo combination covers amount");
            return Err(PlasmaError::NoUtxoLargeEnough { amount });
        }

        if needs_fee {
            let fee = utxos
                .iter()
                .find(|u| u.currency == self.fee_currency && !selected.iter().any(|s| s.utxo_pos == u.utxo_pos))
                .ok_or(PlasmaError::NoFeeUtxoAvailable)?;
            selected.push(fee.clone());
        }

        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UtxoPos;
    use alloy_primitives::Address;

    fn token() -> Address { Address::repeat_byte(0x77) }

    fn utxo(pos: u64, amount: u64, currency: Currency) -> Utxo {
        Utxo { utxo_pos: UtxoPos(pos), owner: Address::repeat_byte(1), currency, amount: U256::from(amount) }
    }

    fn amounts(v: &[Utxo]) -> Vec<u64> {
        v.iter().map(|u| u.amount.to::<u64>()).collect()
    }

    #[test]
    fn picks_largest_first_until_covered() {
        let pool = vec![utxo(1, 50, ETH_CURRENCY), utxo(2, 100, ETH_CURRENCY)];
        let picked = UtxoSelector::default().select(&pool, U256::from(120u64), ETH_CURRENCY, false).unwrap();
        assert_eq!(amounts(&picked), vec![100, 50]);
    }

    #[test]
    fn stops_once_threshold_met() {
        let pool = vec![utxo(1, 10, ETH_CURRENCY), utxo(2, 200, ETH_CURRENCY), utxo(3, 30, ETH_CURRENCY)];
        let picked = UtxoSelector::default().select(&pool, U256::from(150u64), ETH_CURRENCY, false).unwrap();
        assert_eq!(amounts(&picked), vec![200]);
    }

    #[test]
    fn exact_match_is_single_input() {
        let pool = vec![utxo(1, 50, ETH_CURRENCY), utxo(2, 40, ETH_CURRENCY)];
        let picked = UtxoSelector::default().select(&pool, U256::from(50u64), ETH_CURRENCY, false).unwrap();
        assert_eq!(amounts(&picked), vec![50]);
    }

    #[test]
    fn too_small_pool_fails() {
        let pool = vec![utxo(1, 10, ETH_CURRENCY)];
        let err = UtxoSelector::default().select(&pool, U256::from(50u64), ETH_CURRENCY, false).unwrap_err();
        assert!(matches!(err, PlasmaError::NoUtxoLargeEnough { .. }));
    }

    #[test]
    fn empty_or_foreign_pool_fails() {
        let err = UtxoSelector::default().select(&[], U256::from(1u64), ETH_CURRENCY, false).unwrap_err();
        assert!(matches!(err, PlasmaError::NoUtxoLargeEnough { .. }));
        let pool = vec![utxo(1, 500, token())];
        let err = UtxoSelector::default().select(&pool, U256::from(1u64), ETH_CURRENCY, false).unwrap_err();
        assert!(matches!(err, PlasmaError::NoUtxoLargeEnough { .. }));
    }

    #[test]
    fn scan_is_capped_even_if_pool_could_cover() {
        // five UTXOs of 10 sum to 50, but only four are scanned
        let pool: Vec<Utxo> = (1..=5).map(|i| utxo(i, 10, ETH_CURRENCY)).collect();
        let selector = UtxoSelector::default();
        assert!(selector.select(&pool, U256::from(50u64), ETH_CURRENCY, false).is_err());
        assert_eq!(selector.select(&pool, U256::from(40u64), ETH_CURRENCY, false).unwrap().len(), 4);
        assert!(UtxoSelector::new(2).select(&pool, U256::from(30u64), ETH_CURRENCY, false).is_err());
    }

    #[test]
    fn ties_keep_pool_order() {
        let pool = vec![utxo(7, 10, ETH_CURRENCY), utxo(3, 10, ETH_CURRENCY), utxo(5, 10, ETH_CURRENCY)];
        let picked = UtxoSelector::default().select(&pool, U256::from(20u64), ETH_CURRENCY, false).unwrap();
        let positions: Vec<u64> = picked.iter().map(|u| u.utxo_pos.0).collect();
        assert_eq!(positions, vec![7, 3]);
    }

    #[test]
    fn token_transfer_appends_fee_utxo() {
        let pool = vec![utxo(1, 5, ETH_CURRENCY), utxo(2, 80, token()), utxo(3, 40, token())];
        let picked = UtxoSelector::default().select(&pool, U256::from(100u64), token(), true).unwrap();
        assert_eq!(picked.len(), 3);
        assert_eq!(picked[2].currency, ETH_CURRENCY);
        assert_eq!(picked[2].utxo_pos, UtxoPos(1));
    }

    #[test]
    fn missing_fee_utxo_is_distinct_error() {
        let pool = vec![utxo(2, 80, token())];
        let err = UtxoSelector::default().select(&pool, U256::from(50u64), token(), true).unwrap_err();
        assert!(matches!(err, PlasmaError::NoFeeUtxoAvailable));
    }

    #[test]
    fn fee_reserves_an_input_slot() {
        let mut pool: Vec<Utxo> = (1..=4).map(|i| utxo(i, 10, token())).collect();
        pool.push(utxo(9, 1, ETH_CURRENCY));
        let selector = UtxoSelector::default();
        assert!(selector.select(&pool, U256::from(40u64), token(), true).is_err());
        let picked = selector.select(&pool, U256::from(30u64), token(), true).unwrap();
        assert_eq!(picked.len(), MAX_INPUTS);
    }

    #[test]
    fn selection_always_covers_target() {
        let pool: Vec<Utxo> = [3u64, 17, 8, 25, 1, 9].iter().enumerate().map(|(i, a)| utxo(i as u64, *a, ETH_CURRENCY)).collect();
        for target in 0..=80u64 {
            match UtxoSelector::default().select(&pool, U256::from(target), ETH_CURRENCY, false) {
                Ok(picked) => assert!(crate::types::total(&picked) >= U256::from(target)),
                // largest four: 25 + 17 + 9 + 8 = 59
                Err(_) => assert!(target > 59),
            }
        }
    }
}
