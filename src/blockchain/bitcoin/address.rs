//! P2PKH address generation and validation.
//!
//! Wallet addresses are always Legacy (P2PKH): Base58Check of
//! `version || HASH160(compressed pubkey)`. Version byte 0x00 on mainnet
//! (`1...`) and 0x6f on testnet (`m...`/`n...`).

use crate::core::config::BitcoinNetwork;
use crate::core::errors::WalletError;
use bitcoin::address::{Address, NetworkUnchecked};
use bitcoin::secp256k1::PublicKey as Secp256k1PublicKey;
use bitcoin::{PublicKey as BitcoinPublicKey, ScriptBuf};
use std::str::FromStr;
use tracing::debug;

/// Compressed secp256k1 public key length.
pub const COMPRESSED_PUBLIC_KEY_LEN: usize = 33;

/// Bitcoin address helpers.
pub struct BitcoinAddress;

impl BitcoinAddress {
    /// Address for a compressed public key given as raw bytes.
    pub fn from_public_key_bytes(public_key: &[u8], network: BitcoinNetwork) -> Result<String, WalletError> {
        let key = parse_compressed_public_key(public_key)?;
        Ok(Self::from_public_key(&key, network))
    }

    /// Address for an already-validated public key.
    pub fn from_public_key(public_key: &Secp256k1PublicKey, network: BitcoinNetwork) -> String {
        let address = Address::p2pkh(&BitcoinPublicKey::new(*public_key), network.to_bitcoin());
        debug!(%address, %network, "derived P2PKH address");
        address.to_string()
    }

    /// Locking script paying to `public_key`; independent of the network.
    pub fn p2pkh_script(public_key: &Secp256k1PublicKey) -> ScriptBuf {
        ScriptBuf::new_p2pkh(&BitcoinPublicKey::new(*public_key).pubkey_hash())
    }

    /// Parse an address and require it to belong to `network`.
    pub fn parse(address: &str, network: BitcoinNetwork) -> Result<Address, WalletError> {
        let unchecked: Address<NetworkUnchecked> = Address::from_str(address.trim())
            .map_err(|e| WalletError::InvalidAddress(format!("{}: {}", address, e)))?;
        unchecked
            .require_network(network.to_bitcoin())
            .map_err(|_| WalletError::InvalidAddress(format!("{} is not a {} address", address, network)))
    }

    /// Locking script for a destination address on `network`.
    pub fn script_for(address: &str, network: BitcoinNetwork) -> Result<ScriptBuf, WalletError> {
        Ok(Self::parse(address, network)?.script_pubkey())
    }

    pub fn validate(address: &str, network: BitcoinNetwork) -> bool {
        Self::parse(address, network).is_ok()
    }
}

/// Address for a compressed public key (HASH160 → version byte → Base58Check).
pub fn to_address(public_key: &[u8], network: BitcoinNetwork) -> Result<String, WalletError> {
    BitcoinAddress::from_public_key_bytes(public_key, network)
}

/// Validate a destination address (checksum and network) and return its
/// locking script.
pub fn parse_address(address: &str, network: BitcoinNetwork) -> Result<ScriptBuf, WalletError> {
    BitcoinAddress::script_for(address, network)
}

/// Accepts only the 33-byte compressed encoding of a point on the curve.
pub fn parse_compressed_public_key(bytes: &[u8]) -> Result<Secp256k1PublicKey, WalletError> {
    if bytes.len() != COMPRESSED_PUBLIC_KEY_LEN {
        return Err(WalletError::InvalidPublicKey(format!(
            "expected {} bytes, got {}",
            COMPRESSED_PUBLIC_KEY_LEN,
            bytes.len()
        )));
    }
    Secp256k1PublicKey::from_slice(bytes).map_err(|e| WalletError::InvalidPublicKey(e.to_string()))
}
