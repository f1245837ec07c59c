//! Property-based tests for coin selection and output planning.

use btc_hd_wallet::blockchain::bitcoin::{Utxo, UtxoOrder, UtxoSelector, DUST_THRESHOLD, FLAT_FEE};
use btc_hd_wallet::core::WalletError;
use proptest::prelude::*;

fn utxo_set() -> impl Strategy<Value = Vec<Utxo>> {
    prop::collection::vec(1u64..5_000_000, 0..12).prop_map(|values| {
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| Utxo::new(format!("{:064x}", i + 1), i as u32 % 3, v))
            .collect()
    })
}

fn order() -> impl Strategy<Value = UtxoOrder> {
    prop_oneof![Just(UtxoOrder::ProviderOrder), Just(UtxoOrder::Deterministic)]
}

proptest! {
    #[test]
    fn value_is_conserved(utxos in utxo_set(), amount in DUST_THRESHOLD..3_000_000u64, order in order()) {
        if let Ok(selection) = UtxoSelector::select(&utxos, amount, order) {
            let sum: u64 = selection.utxos.iter().map(|u| u.value).sum();
            prop_assert_eq!(sum, selection.total);

            let plan = UtxoSelector::plan_outputs(selection.total, amount).unwrap();
            prop_assert_eq!(plan.amount + plan.change.unwrap_or(0) + plan.fee, selection.total);
            prop_assert!(plan.fee >= FLAT_FEE || plan.change.is_none());
            if let Some(change) = plan.change {
                prop_assert!(change >= DUST_THRESHOLD);
                prop_assert_eq!(plan.fee, FLAT_FEE);
            }
        }
    }

    #[test]
    fn selection_never_overspends_inputs(utxos in utxo_set(), amount in DUST_THRESHOLD..3_000_000u64) {
        if let Ok(selection) = UtxoSelector::select(&utxos, amount, UtxoOrder::ProviderOrder) {
            // first-fit: dropping the last input leaves the target unmet
            let without_last: u64 = selection.utxos[..selection.utxos.len() - 1].iter().map(|u| u.value).sum();
            prop_assert!(without_last < amount + FLAT_FEE);
            prop_assert!(selection.total >= amount + DUST_THRESHOLD);
            prop_assert_eq!(&selection.utxos[..], &utxos[..selection.utxos.len()]);
        }
    }

    #[test]
    fn failure_means_not_enough(utxos in utxo_set(), amount in DUST_THRESHOLD..3_000_000u64) {
        match UtxoSelector::select(&utxos, amount, UtxoOrder::ProviderOrder) {
            Err(WalletError::InsufficientFunds { available, required }) => {
                let all: u64 = utxos.iter().map(|u| u.value).sum();
                prop_assert_eq!(available, all);
                prop_assert_eq!(required, amount + DUST_THRESHOLD);
                prop_assert!(all < required);
            }
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            Ok(_) => {}
        }
    }

    #[test]
    fn dust_amounts_always_rejected(utxos in utxo_set(), amount in 0..DUST_THRESHOLD) {
        let is_dust_error = matches!(
            UtxoSelector::select(&utxos, amount, UtxoOrder::ProviderOrder),
            Err(WalletError::AmountBelowDust { .. })
        );
        prop_assert!(is_dust_error);
    }
}
