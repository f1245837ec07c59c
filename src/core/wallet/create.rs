// filepath: src/core/wallet/create.rs
use tracing::info;

use super::{generate_wallet, WalletDetails};
use crate::core::config::BitcoinNetwork;
use crate::core::errors::WalletError;
use crate::storage::WalletStore;

/// Create a wallet and append it to `store`.
///
/// The first wallet, or any wallet created with `fresh_mnemonic`, gets a new
/// mnemonic at account 0. Otherwise the account after the highest one already
/// derived from the first wallet's mnemonic is used, so one backup phrase
/// covers the whole collection.
pub fn create_wallet(
    store: &mut WalletStore,
    network: BitcoinNetwork,
    fresh_mnemonic: bool,
) -> Result<WalletDetails, WalletError> {
    let wallet = match store.wallets().first() {
        Some(first) if !fresh_mnemonic => {
            let index = store.next_account_index(&first.mnemonic)?;
            generate_wallet(Some(&first.mnemonic), index, network)?
        }
        _ => generate_wallet(None, 0, network)?,
    };

    if store.contains_address(&wallet.address) {
        return Err(WalletError::DuplicateWallet(wallet.address));
    }

    info!(address = %wallet.address, account_index = wallet.account_index, "creating wallet");
    store.add_wallet(wallet.clone());
    Ok(wallet)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_wallet_is_account_zero() {
        let mut store = WalletStore::new();
        let wallet = create_wallet(&mut store, BitcoinNetwork::Testnet, false).unwrap();
        assert_eq!(wallet.account_index, 0);
        assert_eq!(store.len(), 1);
        assert_eq!(store.selected_index(), Some(0));
    }

    #[test]
    fn test_next_wallet_reuses_first_mnemonic() {
        let mut store = WalletStore::new();
        let first = create_wallet(&mut store, BitcoinNetwork::Testnet, false).unwrap();
        let second = create_wallet(&mut store, BitcoinNetwork::Testnet, false).unwrap();
        assert_eq!(second.mnemonic, first.mnemonic);
        assert_eq!(second.account_index, 1);
        assert_eq!(second.name, "Wallet 2");
        assert_ne!(second.address, first.address);
    }

    #[test]
    fn test_create_after_removal_uses_unused_account() {
        let mut store = WalletStore::new();
        let mut created = Vec::new();
        for _ in 0..3 {
            created.push(create_wallet(&mut store, BitcoinNetwork::Testnet, false).unwrap());
        }
        store.remove_wallet(0).unwrap();

        let next = create_wallet(&mut store, BitcoinNetwork::Testnet, false).unwrap();
        assert_eq!(next.account_index, 3);
        assert_eq!(next.mnemonic, created[0].mnemonic);
        assert!(created.iter().all(|w| w.address != next.address));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_fresh_mnemonic_starts_over() {
        let mut store = WalletStore::new();
        let first = create_wallet(&mut store, BitcoinNetwork::Testnet, false).unwrap();
        let fresh = create_wallet(&mut store, BitcoinNetwork::Testnet, true).unwrap();
        assert_ne!(fresh.mnemonic, first.mnemonic);
        assert_eq!(fresh.account_index, 0);
        assert_eq!(store.len(), 2);
    }
}
