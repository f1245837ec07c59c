//! In-memory data provider for wallet manager tests.

use async_trait::async_trait;
use bitcoin::absolute::LockTime;
use bitcoin::consensus::encode::serialize_hex;
use bitcoin::hashes::{sha256d, Hash};
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::blockchain::bitcoin::history::ProviderTransaction;
use crate::blockchain::bitcoin::utxo::Utxo;
use crate::blockchain::traits::BlockchainDataProvider;
use crate::core::errors::WalletError;

/// Serves canned UTXOs, raw transactions and history; records broadcasts.
#[derive(Default)]
pub struct MockProvider {
    pub utxos: HashMap<String, Vec<Utxo>>,
    pub raw_txs: HashMap<String, String>,
    pub history: HashMap<String, Vec<ProviderTransaction>>,
    pub fail_reads: bool,
    pub broadcasts: Mutex<Vec<String>>,
}

impl MockProvider {
    /// Fund `address` (whose locking script is `script`) with one UTXO per value.
    pub fn fund(&mut self, address: &str, script: &ScriptBuf, values: &[u64]) {
        for value in values {
            let salt = self.raw_txs.len() as u64;
            let tx = funding_tx(script, *value, salt);
            let txid = tx.txid().to_string();
            self.raw_txs.insert(txid.clone(), serialize_hex(&tx));
            self.utxos
                .entry(address.to_string())
                .or_default()
                .push(Utxo::new(txid, 0, *value));
        }
    }

    pub fn broadcasts(&self) -> Vec<String> {
        self.broadcasts.lock().map(|b| b.clone()).unwrap_or_default()
    }

    fn check(&self) -> Result<(), WalletError> {
        if self.fail_reads {
            return Err(WalletError::NetworkFetch("provider unavailable".into()));
        }
        Ok(())
    }
}

/// Single-output transaction paying `value` to `script`.
pub fn funding_tx(script: &ScriptBuf, value: u64, salt: u64) -> Transaction {
    Transaction {
        version: Version::ONE,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint::new(Txid::from_raw_hash(sha256d::Hash::hash(&salt.to_le_bytes())), 0),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }],
        output: vec![TxOut {
            value: Amount::from_sat(value),
            script_pubkey: script.clone(),
        }],
    }
}

#[async_trait]
impl BlockchainDataProvider for MockProvider {
    async fn list_utxos(&self, address: &str) -> Result<Vec<Utxo>, WalletError> {
        self.check()?;
        Ok(self.utxos.get(address).cloned().unwrap_or_default())
    }

    async fn fetch_raw_transaction(&self, txid: &str) -> Result<String, WalletError> {
        self.check()?;
        self.raw_txs
            .get(txid)
            .cloned()
            .ok_or_else(|| WalletError::NetworkFetch(format!("unknown transaction {}", txid)))
    }

    async fn list_transactions(&self, address: &str) -> Result<Vec<ProviderTransaction>, WalletError> {
        self.check()?;
        Ok(self.history.get(address).cloned().unwrap_or_default())
    }

    async fn broadcast(&self, tx_hex: &str) -> Result<String, WalletError> {
        let txid = crate::blockchain::bitcoin::transaction::SignedTransaction::from_hex(tx_hex)?.txid();
        if let Ok(mut sent) = self.broadcasts.lock() {
            sent.push(tx_hex.to_string());
        }
        Ok(txid)
    }
}
