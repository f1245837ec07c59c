//! Transaction history queries

use super::WalletManager;
use crate::blockchain::bitcoin::history::{summarize, TransactionSummary};
use crate::core::errors::WalletError;
use tracing::info;

impl WalletManager {
    /// Most recent transactions touching `address`, newest first.
    pub async fn transaction_history(&self, address: &str) -> Result<Vec<TransactionSummary>, WalletError> {
        let txs = self.provider.list_transactions(address).await?;
        let summaries = summarize(&txs, address, &self.explorer_url);
        info!(address, total = txs.len(), shown = summaries.len(), "history fetched");
        Ok(summaries)
    }
}
