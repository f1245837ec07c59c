//! Wallet Manager Core Module
//!
//! Runs the end-to-end flows against a blockchain data provider.
//!
//! ## Module Structure
//! - `balance` - Balance queries
//! - `transactions` - Build, sign and broadcast payments
//! - `tx_history` - Transaction history queries
//! - `testing` - In-memory provider for tests

pub mod balance;
pub mod transactions;
pub mod tx_history;

#[cfg(test)]
pub mod testing;

use std::sync::Arc;

use crate::blockchain::bitcoin::client::EsploraClient;
use crate::blockchain::bitcoin::utxo::UtxoOrder;
use crate::blockchain::traits::BlockchainDataProvider;
use crate::core::config::{BitcoinNetwork, WalletConfig};
use crate::core::errors::WalletError;
use crate::core::wallet::{self, WalletDetails};

/// Wallet manager
///
/// Holds only immutable collaborators. Every call is independent and no
/// wallet state is retained between calls.
#[derive(Clone)]
pub struct WalletManager {
    provider: Arc<dyn BlockchainDataProvider>,
    network: BitcoinNetwork,
    utxo_order: UtxoOrder,
    fetch_concurrency: usize,
    explorer_url: String,
}

impl WalletManager {
    /// Manager backed by the Esplora endpoint in `config`.
    pub fn new(config: &WalletConfig) -> Result<Self, WalletError> {
        let client = EsploraClient::from_config(config)?;
        Ok(Self::with_provider(config, Arc::new(client)))
    }

    /// Manager backed by any provider implementation.
    pub fn with_provider(config: &WalletConfig, provider: Arc<dyn BlockchainDataProvider>) -> Self {
        Self {
            provider,
            network: config.network,
            utxo_order: config.utxo_order,
            fetch_concurrency: config.fetch_concurrency.max(1),
            explorer_url: config.explorer_url.clone(),
        }
    }

    pub fn network(&self) -> BitcoinNetwork {
        self.network
    }

    /// Derive a wallet on this manager's network. Pure; no provider calls.
    pub fn generate_wallet(
        &self,
        mnemonic: Option<&str>,
        account_index: u32,
    ) -> Result<WalletDetails, WalletError> {
        wallet::generate_wallet(mnemonic, account_index, self.network)
    }
}

impl std::fmt::Debug for WalletManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletManager")
            .field("network", &self.network)
            .field("utxo_order", &self.utxo_order)
            .field("fetch_concurrency", &self.fetch_concurrency)
            .finish_non_exhaustive()
    }
}
