//! Transaction operations
//!
//! UTXO fetch → selection → bounded parallel previous-transaction fetch →
//! output assembly → signing → serialization → broadcast.

use super::WalletManager;
use crate::blockchain::bitcoin::account::BitcoinKeypair;
use crate::blockchain::bitcoin::transaction::{
    sign, InputSelection, PaymentRequest, SignedTransaction, UnsignedTransaction,
};
use crate::blockchain::bitcoin::utxo::{Utxo, UtxoSelector};
use crate::core::errors::WalletError;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

impl WalletManager {
    /// Select inputs, fetch their originating transactions and assemble
    /// outputs. Nothing is signed yet.
    pub async fn build_transaction(
        &self,
        from_address: &str,
        to_address: &str,
        amount: u64,
    ) -> Result<UnsignedTransaction, WalletError> {
        let request = PaymentRequest::new(from_address, to_address, amount, self.network)?;

        let utxos = self.provider.list_utxos(request.from_address()).await?;
        let selection = UtxoSelector::select(&utxos, amount, self.utxo_order)?;
        let previous_txs = self.fetch_previous_transactions(&selection.utxos).await?;

        let inputs = InputSelection::new(request, selection, previous_txs)?;
        UnsignedTransaction::build(inputs)
    }

    /// Build and sign a payment; returns the signed transaction hex.
    pub async fn create_transaction(
        &self,
        from_address: &str,
        to_address: &str,
        amount: u64,
        private_key_hex: &str,
    ) -> Result<String, WalletError> {
        info!(from = from_address, to = to_address, amount, "creating transaction");
        let keypair = BitcoinKeypair::from_private_key_hex(private_key_hex, self.network)?;
        let unsigned = self.build_transaction(from_address, to_address, amount).await?;
        let signed = sign(unsigned, &keypair)?;
        Ok(signed.serialize())
    }

    /// Submit signed transaction hex; returns the provider's txid.
    pub async fn broadcast_transaction(&self, tx_hex: &str) -> Result<String, WalletError> {
        // reject garbage before it reaches the provider
        let signed = SignedTransaction::from_hex(tx_hex)?;
        debug!(txid = %signed.txid(), "submitting");
        self.provider.broadcast(tx_hex.trim()).await
    }

    /// Create and broadcast in one step.
    pub async fn send(
        &self,
        from_address: &str,
        to_address: &str,
        amount: u64,
        private_key_hex: &str,
    ) -> Result<String, WalletError> {
        let tx_hex = self
            .create_transaction(from_address, to_address, amount, private_key_hex)
            .await?;
        self.broadcast_transaction(&tx_hex).await
    }

    /// Raw originating transaction for each UTXO, in selection order.
    ///
    /// Up to `fetch_concurrency` requests are in flight; the first failure
    /// aborts the whole fetch.
    async fn fetch_previous_transactions(&self, utxos: &[Utxo]) -> Result<Vec<String>, WalletError> {
        stream::iter(utxos.iter().map(|utxo| self.provider.fetch_raw_transaction(&utxo.txid)))
            .buffered(self.fetch_concurrency)
            .try_collect()
            .await
    }
}
