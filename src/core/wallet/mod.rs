//! Wallet records and the flows that produce them.

pub mod create;
pub mod mnemonic;
pub mod recover;

pub use create::create_wallet;
pub use recover::import_wallet;

use crate::blockchain::bitcoin::address::BitcoinAddress;
use crate::core::bip44::derive_account_keypair;
use crate::core::config::BitcoinNetwork;
use crate::core::errors::WalletError;
use mnemonic::{derive_seed, generate_mnemonic, parse_mnemonic, DEFAULT_ENTROPY_BITS};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// A derived wallet as persisted by the wallet collection.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletDetails {
    pub address: String,
    /// 32-byte secret scalar, hex.
    pub private_key: String,
    /// 33-byte compressed public key, hex.
    pub public_key: String,
    pub mnemonic: String,
    pub account_index: u32,
    pub name: String,
}

impl WalletDetails {
    pub fn default_name(account_index: u32) -> String {
        format!("Wallet {}", u64::from(account_index) + 1)
    }
}

impl fmt::Debug for WalletDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletDetails")
            .field("address", &self.address)
            .field("public_key", &self.public_key)
            .field("account_index", &self.account_index)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Derive the wallet at `m/44'/0'/{account_index}'/0/0`.
///
/// With `mnemonic` set the result is fully deterministic; without it a fresh
/// 12-word mnemonic is generated.
pub fn generate_wallet(
    mnemonic: Option<&str>,
    account_index: u32,
    network: BitcoinNetwork,
) -> Result<WalletDetails, WalletError> {
    let mnemonic = match mnemonic {
        Some(phrase) => parse_mnemonic(phrase)?,
        None => generate_mnemonic(DEFAULT_ENTROPY_BITS)?,
    };
    let seed = derive_seed(&mnemonic, "");
    let keypair = derive_account_keypair(&seed, account_index)?;
    let address = BitcoinAddress::from_public_key(keypair.public_key(), network);

    info!(%address, account_index, %network, "wallet derived");
    Ok(WalletDetails {
        address,
        private_key: hex::encode(keypair.private_key_bytes().as_slice()),
        public_key: hex::encode(keypair.public_key_bytes()),
        mnemonic: mnemonic.to_string(),
        account_index,
        name: WalletDetails::default_name(account_index),
    })
}
