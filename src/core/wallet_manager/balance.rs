//! Balance queries

use super::WalletManager;
use crate::core::errors::WalletError;
use tracing::info;

impl WalletManager {
    /// Sum of the unspent output values (satoshis) for `address`.
    ///
    /// Provider failures are returned, never reported as a zero balance.
    pub async fn get_balance(&self, address: &str) -> Result<u64, WalletError> {
        let utxos = self.provider.list_utxos(address).await?;
        let balance = utxos.iter().try_fold(0u64, |acc, utxo| {
            acc.checked_add(utxo.value)
                .ok_or_else(|| WalletError::InvalidProviderData("UTXO values overflow".into()))
        })?;
        info!(address, balance, utxos = utxos.len(), "balance fetched");
        Ok(balance)
    }
}
