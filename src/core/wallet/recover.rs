// filepath: src/core/wallet/recover.rs
use tracing::info;

use super::mnemonic::parse_mnemonic;
use super::{generate_wallet, WalletDetails};
use crate::core::config::BitcoinNetwork;
use crate::core::errors::WalletError;
use crate::storage::WalletStore;

/// Import a wallet from an existing mnemonic.
///
/// The account follows the highest one already stored for the same phrase,
/// starting at 0. An address that is already in the collection is rejected.
pub fn import_wallet(
    store: &mut WalletStore,
    network: BitcoinNetwork,
    phrase: &str,
) -> Result<WalletDetails, WalletError> {
    let mnemonic = parse_mnemonic(phrase)?.to_string();
    let index = store.next_account_index(&mnemonic)?;
    let wallet = generate_wallet(Some(&mnemonic), index, network)?;

    if store.contains_address(&wallet.address) {
        return Err(WalletError::DuplicateWallet(wallet.address));
    }

    info!(address = %wallet.address, account_index = index, "importing wallet");
    store.add_wallet(wallet.clone());
    Ok(wallet)
}
