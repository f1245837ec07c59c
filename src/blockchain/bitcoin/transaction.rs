//! Bitcoin transaction building and signing
//!
//! A payment moves through `PaymentRequest` → `InputSelection` →
//! `UnsignedTransaction` → `SignedTransaction` → consensus hex. Each step
//! consumes the previous one, so a transaction cannot be signed before its
//! outputs exist or serialized before it is signed.

use super::account::BitcoinKeypair;
use super::address::parse_address;
use super::utxo::{OutputPlan, Selection, Utxo, UtxoSelector, DUST_THRESHOLD, FLAT_FEE};
use crate::core::config::BitcoinNetwork;
use crate::core::errors::WalletError;
use bitcoin::absolute::LockTime;
use bitcoin::blockdata::script::Builder;
use bitcoin::consensus::encode::{deserialize, serialize_hex};
use bitcoin::hashes::Hash;
use bitcoin::script::PushBytesBuf;
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::transaction::Version;
use bitcoin::{Amount, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};
use tracing::{debug, info, warn};

/// What the caller wants to pay, validated against the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    from_address: String,
    to_address: String,
    amount: u64,
    change_script: ScriptBuf,
    destination_script: ScriptBuf,
}

impl PaymentRequest {
    pub fn new(
        from_address: &str,
        to_address: &str,
        amount: u64,
        network: BitcoinNetwork,
    ) -> Result<Self, WalletError> {
        // rejected before any provider call
        if amount < DUST_THRESHOLD {
            return Err(WalletError::AmountBelowDust {
                amount,
                threshold: DUST_THRESHOLD,
            });
        }
        let change_script = parse_address(from_address, network)?;
        let destination_script = parse_address(to_address, network)?;
        Ok(Self {
            from_address: from_address.trim().to_string(),
            to_address: to_address.trim().to_string(),
            amount,
            change_script,
            destination_script,
        })
    }

    pub fn from_address(&self) -> &str {
        &self.from_address
    }

    pub fn to_address(&self) -> &str {
        &self.to_address
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }
}

/// A selected UTXO together with the transaction that created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingInput {
    utxo: Utxo,
    previous_tx: Transaction,
}

impl FundingInput {
    /// Decode the raw originating transaction and check it against the UTXO.
    pub fn from_raw_hex(utxo: Utxo, raw_hex: &str) -> Result<Self, WalletError> {
        let bytes = hex::decode(raw_hex.trim())
            .map_err(|e| WalletError::InvalidProviderData(format!("raw tx {} is not hex: {}", utxo.txid, e)))?;
        let previous_tx: Transaction = deserialize(&bytes)
            .map_err(|e| WalletError::InvalidProviderData(format!("raw tx {} does not decode: {}", utxo.txid, e)))?;
        Self::new(utxo, previous_tx)
    }

    pub fn new(utxo: Utxo, previous_tx: Transaction) -> Result<Self, WalletError> {
        if previous_tx.txid() != utxo.txid()? {
            return Err(WalletError::InvalidProviderData(format!(
                "transaction {} returned for UTXO {}",
                previous_tx.txid(),
                utxo.txid
            )));
        }
        let output = previous_tx.output.get(utxo.vout as usize).ok_or_else(|| {
            WalletError::InvalidProviderData(format!("{}:{} has no such output", utxo.txid, utxo.vout))
        })?;
        if output.value.to_sat() != utxo.value {
            return Err(WalletError::InvalidProviderData(format!(
                "{}:{} is worth {} sat, provider reported {}",
                utxo.txid,
                utxo.vout,
                output.value.to_sat(),
                utxo.value
            )));
        }
        Ok(Self { utxo, previous_tx })
    }

    pub fn utxo(&self) -> &Utxo {
        &self.utxo
    }

    pub fn previous_tx(&self) -> &Transaction {
        &self.previous_tx
    }

    /// The output being spent.
    pub fn prevout(&self) -> &TxOut {
        // index checked in `new`
        &self.previous_tx.output[self.utxo.vout as usize]
    }
}

/// Inputs chosen for a request, each carrying its originating transaction.
#[derive(Debug, Clone)]
pub struct InputSelection {
    request: PaymentRequest,
    inputs: Vec<FundingInput>,
    total: u64,
}

impl InputSelection {
    /// Pair a UTXO selection with its fetched previous transactions.
    ///
    /// `previous_txs` must be in the same order as `selection.utxos`.
    pub fn new(
        request: PaymentRequest,
        selection: Selection,
        previous_txs: Vec<String>,
    ) -> Result<Self, WalletError> {
        if selection.utxos.len() != previous_txs.len() {
            return Err(WalletError::InvalidProviderData(format!(
                "{} previous transactions for {} inputs",
                previous_txs.len(),
                selection.utxos.len()
            )));
        }
        let inputs = selection
            .utxos
            .into_iter()
            .zip(previous_txs)
            .map(|(utxo, raw)| FundingInput::from_raw_hex(utxo, &raw))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_inputs(request, inputs)
    }

    pub fn from_inputs(request: PaymentRequest, inputs: Vec<FundingInput>) -> Result<Self, WalletError> {
        let total = inputs.iter().try_fold(0u64, |acc, input| {
            acc.checked_add(input.utxo.value)
                .ok_or_else(|| WalletError::InvalidProviderData("input values overflow".into()))
        })?;
        Ok(Self { request, inputs, total })
    }

    pub fn request(&self) -> &PaymentRequest {
        &self.request
    }

    pub fn inputs(&self) -> &[FundingInput] {
        &self.inputs
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

/// Transaction with inputs and outputs fixed but no signatures yet.
#[derive(Debug, Clone)]
pub struct UnsignedTransaction {
    tx: Transaction,
    prevouts: Vec<TxOut>,
    plan: OutputPlan,
}

impl UnsignedTransaction {
    /// Assemble outputs under the dust/fee/change policy.
    pub fn build(selection: InputSelection) -> Result<Self, WalletError> {
        let request = &selection.request;
        let plan = UtxoSelector::plan_outputs(selection.total, request.amount)?;

        info!(
            to = %request.to_address,
            amount = plan.amount,
            inputs = selection.inputs.len(),
            fee = plan.fee,
            "building transaction"
        );

        let input = selection
            .inputs
            .iter()
            .map(|funding| {
                Ok(TxIn {
                    previous_output: funding.utxo.outpoint()?,
                    script_sig: ScriptBuf::new(),
                    sequence: Sequence::MAX,
                    witness: Witness::new(),
                })
            })
            .collect::<Result<Vec<_>, WalletError>>()?;

        let mut output = vec![TxOut {
            value: Amount::from_sat(plan.amount),
            script_pubkey: request.destination_script.clone(),
        }];
        match plan.change {
            Some(change) => output.push(TxOut {
                value: Amount::from_sat(change),
                script_pubkey: request.change_script.clone(),
            }),
            None if plan.fee > FLAT_FEE => {
                warn!(leftover = plan.fee - FLAT_FEE, "change below dust threshold added to fee");
            }
            None => {}
        }

        let prevouts = selection.inputs.iter().map(|f| f.prevout().clone()).collect();
        let tx = Transaction {
            version: Version::ONE,
            lock_time: LockTime::ZERO,
            input,
            output,
        };
        Ok(Self { tx, prevouts, plan })
    }

    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    /// Outputs being spent, in input order.
    pub fn prevouts(&self) -> &[TxOut] {
        &self.prevouts
    }

    pub fn fee(&self) -> u64 {
        self.plan.fee
    }

    pub fn change(&self) -> Option<u64> {
        self.plan.change
    }

    pub fn amount(&self) -> u64 {
        self.plan.amount
    }
}

/// Sign every input with legacy SIGHASH_ALL.
///
/// scriptSig is `<DER signature || 0x01> <compressed pubkey>`. Fails with
/// `Signing` when the key does not own an input's locking script.
pub fn sign(unsigned: UnsignedTransaction, keypair: &BitcoinKeypair) -> Result<SignedTransaction, WalletError> {
    let UnsignedTransaction { mut tx, prevouts, plan } = unsigned;
    let own_script = keypair.p2pkh_script();

    let mut script_sigs = Vec::with_capacity(prevouts.len());
    {
        let cache = SighashCache::new(&tx);
        for (index, prevout) in prevouts.iter().enumerate() {
            if prevout.script_pubkey != own_script {
                return Err(WalletError::Signing(format!(
                    "input {} is locked to a script this key does not own",
                    index
                )));
            }
            let sighash = cache
                .legacy_signature_hash(index, &prevout.script_pubkey, EcdsaSighashType::All.to_u32())
                .map_err(|e| WalletError::Signing(format!("sighash for input {}: {}", index, e)))?;
            let signature = keypair.sign_digest(sighash.to_byte_array())?;

            let mut sig_bytes = signature.serialize_der().to_vec();
            sig_bytes.push(EcdsaSighashType::All.to_u32() as u8);
            let sig_push = PushBytesBuf::try_from(sig_bytes)
                .map_err(|e| WalletError::Signing(format!("signature push: {:?}", e)))?;
            let pk_push = PushBytesBuf::try_from(keypair.public_key_bytes().to_vec())
                .map_err(|e| WalletError::Signing(format!("public key push: {:?}", e)))?;

            script_sigs.push(Builder::new().push_slice(sig_push).push_slice(pk_push).into_script());
        }
    }

    for (txin, script_sig) in tx.input.iter_mut().zip(script_sigs) {
        txin.script_sig = script_sig;
    }

    let signed = SignedTransaction { tx };
    debug!(txid = %signed.txid(), fee = plan.fee, "transaction signed");
    Ok(signed)
}

/// Fully signed transaction ready for broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    tx: Transaction,
}

impl SignedTransaction {
    /// Consensus encoding as lowercase hex.
    pub fn serialize(&self) -> String {
        serialize_hex(&self.tx)
    }

    pub fn from_hex(raw: &str) -> Result<Self, WalletError> {
        let bytes = hex::decode(raw.trim())
            .map_err(|e| WalletError::Serialization(format!("transaction hex: {}", e)))?;
        let tx: Transaction = deserialize(&bytes)
            .map_err(|e| WalletError::Serialization(format!("transaction decode: {}", e)))?;
        Ok(Self { tx })
    }

    pub fn txid(&self) -> String {
        self.tx.txid().to_string()
    }

    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }
}
