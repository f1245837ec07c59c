//! Bitcoin signing key
//!
//! Wraps the secp256k1 key pair that owns a wallet address. The secret bytes
//! are kept behind `secrecy` and only materialized for signing.

use super::address::BitcoinAddress;
use crate::core::bip44::KeyPair;
use crate::core::config::BitcoinNetwork;
use crate::core::errors::WalletError;
use bitcoin::secp256k1::ecdsa::Signature;
use bitcoin::secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use bitcoin::ScriptBuf;
use secrecy::{ExposeSecret, SecretVec};
use std::fmt;
use tracing::debug;
use zeroize::Zeroizing;

/// Bitcoin key pair bound to a network.
pub struct BitcoinKeypair {
    secret_key: SecretVec<u8>,
    public_key: PublicKey,
    network: BitcoinNetwork,
}

impl BitcoinKeypair {
    /// From a 64-character hex private key, as stored in wallet records.
    pub fn from_private_key_hex(private_key: &str, network: BitcoinNetwork) -> Result<Self, WalletError> {
        let bytes = Zeroizing::new(
            hex::decode(private_key.trim())
                .map_err(|e| WalletError::InvalidPrivateKey(format!("not valid hex: {}", e)))?,
        );
        if bytes.len() != 32 {
            return Err(WalletError::InvalidPrivateKey(format!(
                "Bitcoin private key must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|e| WalletError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self::from_secret_key(&secret_key, network))
    }

    /// From a key pair produced by HD derivation.
    pub fn from_key_pair(key_pair: &KeyPair, network: BitcoinNetwork) -> Self {
        Self::from_secret_key(key_pair.secret_key(), network)
    }

    fn from_secret_key(secret_key: &SecretKey, network: BitcoinNetwork) -> Self {
        let secp = Secp256k1::signing_only();
        let public_key = PublicKey::from_secret_key(&secp, secret_key);
        Self {
            secret_key: SecretVec::new(secret_key.secret_bytes().to_vec()),
            public_key,
            network,
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Compressed public key bytes
    pub fn public_key_bytes(&self) -> [u8; 33] {
        self.public_key.serialize()
    }

    pub fn network(&self) -> BitcoinNetwork {
        self.network
    }

    /// P2PKH address owned by this key.
    pub fn address(&self) -> String {
        BitcoinAddress::from_public_key(&self.public_key, self.network)
    }

    /// Locking script that this key can unlock.
    pub fn p2pkh_script(&self) -> ScriptBuf {
        BitcoinAddress::p2pkh_script(&self.public_key)
    }

    /// ECDSA signature over a 32-byte digest.
    pub fn sign_digest(&self, digest: [u8; 32]) -> Result<Signature, WalletError> {
        let secret_key = SecretKey::from_slice(self.secret_key.expose_secret())
            .map_err(|e| WalletError::Signing(format!("stored private key is invalid: {}", e)))?;
        let secp = Secp256k1::signing_only();
        let signature = secp.sign_ecdsa(&Message::from_digest(digest), &secret_key);
        debug!("signed digest");
        Ok(signature)
    }
}

impl fmt::Debug for BitcoinKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitcoinKeypair")
            .field("public_key", &self.public_key)
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // secret key 1 -> generator point G
    const ONE: &str = "0000000000000000000000000000000000000000000000000000000000000001";

    #[test]
    fn test_from_hex_matches_generator() {
        let keypair = BitcoinKeypair::from_private_key_hex(ONE, BitcoinNetwork::Mainnet).unwrap();
        assert_eq!(
            hex::encode(keypair.public_key_bytes()),
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
        assert_eq!(keypair.address(), "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");
        assert!(keypair.p2pkh_script().is_p2pkh());
    }

    #[test]
    fn test_rejects_bad_hex_and_length() {
        assert!(matches!(
            BitcoinKeypair::from_private_key_hex("zz", BitcoinNetwork::Testnet),
            Err(WalletError::InvalidPrivateKey(_))
        ));
        assert!(matches!(
            BitcoinKeypair::from_private_key_hex("0101", BitcoinNetwork::Testnet),
            Err(WalletError::InvalidPrivateKey(_))
        ));
    }

    #[test]
    fn test_rejects_zero_scalar() {
        let zero = "00".repeat(32);
        assert!(matches!(
            BitcoinKeypair::from_private_key_hex(&zero, BitcoinNetwork::Testnet),
            Err(WalletError::InvalidPrivateKey(_))
        ));
    }

    #[test]
    fn test_signature_verifies() {
        let keypair = BitcoinKeypair::from_private_key_hex(ONE, BitcoinNetwork::Testnet).unwrap();
        let digest = [7u8; 32];
        let signature = keypair.sign_digest(digest).unwrap();
        let secp = Secp256k1::verification_only();
        assert!(secp
            .verify_ecdsa(&Message::from_digest(digest), &signature, keypair.public_key())
            .is_ok());
    }

    #[test]
    fn test_debug_hides_secret() {
        let keypair = BitcoinKeypair::from_private_key_hex(ONE, BitcoinNetwork::Testnet).unwrap();
        let debug = format!("{:?}", keypair);
        assert!(!debug.contains(ONE));
    }
}
