use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::blockchain::bitcoin::history::ProviderTransaction;
use crate::blockchain::bitcoin::utxo::Utxo;
use crate::core::errors::WalletError;

/// Confirmation state of a transaction as shown in history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Confirmed,
}

/// Remote source of chain data: UTXOs, raw transactions, address history and
/// transaction submission.
///
/// Implementations carry no wallet state; every call is independent.
#[async_trait]
pub trait BlockchainDataProvider: Send + Sync {
    /// Unspent outputs paying `address`, in provider order.
    async fn list_utxos(&self, address: &str) -> Result<Vec<Utxo>, WalletError>;

    /// Raw hex of the transaction with the given id.
    async fn fetch_raw_transaction(&self, txid: &str) -> Result<String, WalletError>;

    /// Recent transactions touching `address`, newest first.
    async fn list_transactions(&self, address: &str) -> Result<Vec<ProviderTransaction>, WalletError>;

    /// Submit a signed transaction; returns the txid the provider reports.
    async fn broadcast(&self, tx_hex: &str) -> Result<String, WalletError>;
}
