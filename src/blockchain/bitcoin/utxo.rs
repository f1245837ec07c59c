//! UTXO (Unspent Transaction Output) selection
//!
//! First-fit greedy selection with a flat fee and a dust threshold. The change
//! policy lives here too so selection and output planning agree on the same
//! constants.

use crate::core::errors::WalletError;
use bitcoin::{OutPoint, Txid};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use tracing::{debug, info};

/// Smallest output value (satoshis) the wallet will create.
pub const DUST_THRESHOLD: u64 = 546;

/// Fixed fee (satoshis) budgeted per transaction.
pub const FLAT_FEE: u64 = 1000;

/// Confirmation details as reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoStatus {
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub block_height: Option<u32>,
    #[serde(default)]
    pub block_time: Option<u64>,
}

/// Unspent output owned by the wallet address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub txid: String,
    pub vout: u32,
    /// Value in satoshis.
    pub value: u64,
    #[serde(default)]
    pub status: UtxoStatus,
}

impl Utxo {
    pub fn new(txid: impl Into<String>, vout: u32, value: u64) -> Self {
        Self {
            txid: txid.into(),
            vout,
            value,
            status: UtxoStatus::default(),
        }
    }

    pub fn with_status(mut self, confirmed: bool, block_height: Option<u32>) -> Self {
        self.status.confirmed = confirmed;
        self.status.block_height = block_height;
        self
    }

    pub fn txid(&self) -> Result<Txid, WalletError> {
        Txid::from_str(&self.txid)
            .map_err(|e| WalletError::InvalidProviderData(format!("invalid txid {}: {}", self.txid, e)))
    }

    pub fn outpoint(&self) -> Result<OutPoint, WalletError> {
        Ok(OutPoint::new(self.txid()?, self.vout))
    }
}

/// Order in which candidate UTXOs are considered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UtxoOrder {
    /// Exactly as the provider listed them.
    #[default]
    #[serde(rename = "provider")]
    ProviderOrder,
    /// Confirmed first, then lower height, larger value, txid, vout.
    Deterministic,
}

impl UtxoOrder {
    pub fn apply(self, utxos: &[Utxo]) -> Vec<Utxo> {
        let mut ordered = utxos.to_vec();
        if self == UtxoOrder::Deterministic {
            ordered.sort_by(deterministic_cmp);
        }
        ordered
    }
}

fn deterministic_cmp(a: &Utxo, b: &Utxo) -> Ordering {
    // unconfirmed outputs have no height; sort them after every confirmed one
    let height = |u: &Utxo| u.status.block_height.unwrap_or(u32::MAX);
    b.status
        .confirmed
        .cmp(&a.status.confirmed)
        .then_with(|| height(a).cmp(&height(b)))
        .then_with(|| b.value.cmp(&a.value))
        .then_with(|| a.txid.cmp(&b.txid))
        .then_with(|| a.vout.cmp(&b.vout))
}

/// Inputs chosen to fund a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub utxos: Vec<Utxo>,
    /// Sum of the selected values.
    pub total: u64,
}

/// Output amounts derived from a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputPlan {
    pub amount: u64,
    /// Change returned to the sender, if any.
    pub change: Option<u64>,
    /// Effective fee: inputs minus outputs.
    pub fee: u64,
}

/// UTXO selector
pub struct UtxoSelector;

impl UtxoSelector {
    /// First-fit selection: accumulate in `order` until the running total
    /// reaches `amount + FLAT_FEE`.
    ///
    /// Fails with `AmountBelowDust` before touching any input, and with
    /// `InsufficientFunds` when the total cannot reach `amount + DUST_THRESHOLD`.
    pub fn select(utxos: &[Utxo], amount: u64, order: UtxoOrder) -> Result<Selection, WalletError> {
        info!(amount, candidates = utxos.len(), ?order, "selecting UTXOs");

        if amount < DUST_THRESHOLD {
            return Err(WalletError::AmountBelowDust {
                amount,
                threshold: DUST_THRESHOLD,
            });
        }

        let target = amount.saturating_add(FLAT_FEE);
        let mut selected = Vec::new();
        let mut total = 0u64;

        for utxo in order.apply(utxos) {
            if total >= target {
                break;
            }
            total = total
                .checked_add(utxo.value)
                .ok_or_else(|| WalletError::InvalidProviderData("UTXO values overflow".into()))?;
            selected.push(utxo);
        }

        let required = amount.saturating_add(DUST_THRESHOLD);
        if total < required {
            return Err(WalletError::InsufficientFunds {
                available: total,
                required,
            });
        }

        debug!(inputs = selected.len(), total, "selected UTXOs");
        Ok(Selection { utxos: selected, total })
    }

    /// Destination, change and fee for a funded selection.
    pub fn plan_outputs(total: u64, amount: u64) -> Result<OutputPlan, WalletError> {
        if total < amount {
            return Err(WalletError::InsufficientFunds {
                available: total,
                required: amount.saturating_add(DUST_THRESHOLD),
            });
        }
        let change = total
            .checked_sub(amount)
            .and_then(|rest| rest.checked_sub(FLAT_FEE))
            .filter(|change| *change >= DUST_THRESHOLD);
        let fee = total - amount - change.unwrap_or(0);
        Ok(OutputPlan { amount, change, fee })
    }
}
