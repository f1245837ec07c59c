//! Address transaction history.
//!
//! Turns the provider's transaction objects into per-wallet summaries: which
//! way the value moved, how much, and whether it is confirmed.

use super::utxo::UtxoStatus;
use crate::blockchain::traits::TransactionStatus;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Number of transactions kept in a history listing.
pub const HISTORY_LIMIT: usize = 10;

/// Transaction object as returned by `GET /address/{addr}/txs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderTransaction {
    pub txid: String,
    #[serde(default)]
    pub status: UtxoStatus,
    #[serde(default)]
    pub fee: u64,
    #[serde(default)]
    pub vin: Vec<ProviderInput>,
    #[serde(default)]
    pub vout: Vec<ProviderOutput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInput {
    pub txid: String,
    pub vout: u32,
    /// Absent for coinbase inputs.
    #[serde(default)]
    pub prevout: Option<ProviderOutput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOutput {
    /// Absent for outputs without a standard address (e.g. OP_RETURN).
    #[serde(default)]
    pub scriptpubkey_address: Option<String>,
    pub value: u64,
}

impl ProviderOutput {
    fn pays(&self, address: &str) -> bool {
        self.scriptpubkey_address.as_deref() == Some(address)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

/// One line of wallet history. Amounts in satoshis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub txid: String,
    /// Block time; `None` while unconfirmed.
    pub time: Option<DateTime<Utc>>,
    pub amount: u64,
    pub fee: u64,
    pub direction: Direction,
    pub status: TransactionStatus,
    pub explorer_url: String,
}

impl TransactionSummary {
    pub fn from_provider(tx: &ProviderTransaction, address: &str, explorer_base: &str) -> Self {
        let spends_from_wallet = tx
            .vin
            .iter()
            .any(|input| input.prevout.as_ref().is_some_and(|p| p.pays(address)));

        let (direction, amount) = if spends_from_wallet {
            let sent = tx.vout.iter().filter(|o| !o.pays(address)).map(|o| o.value).sum();
            (Direction::Sent, sent)
        } else {
            let received = tx.vout.iter().find(|o| o.pays(address)).map_or(0, |o| o.value);
            (Direction::Received, received)
        };

        let (status, time) = if tx.status.confirmed {
            let time = tx
                .status
                .block_time
                .and_then(|secs| i64::try_from(secs).ok())
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
            (TransactionStatus::Confirmed, time)
        } else {
            (TransactionStatus::Pending, None)
        };

        Self {
            txid: tx.txid.clone(),
            time,
            amount,
            fee: tx.fee,
            direction,
            status,
            explorer_url: format!("{}/tx/{}", explorer_base.trim_end_matches('/'), tx.txid),
        }
    }
}

/// Summaries of the newest `HISTORY_LIMIT` transactions.
pub fn summarize(txs: &[ProviderTransaction], address: &str, explorer_base: &str) -> Vec<TransactionSummary> {
    txs.iter()
        .take(HISTORY_LIMIT)
        .map(|tx| TransactionSummary::from_provider(tx, address, explorer_base))
        .collect()
}
