//! BIP32 hierarchical key derivation and the BIP44 account path.
//!
//! Path format used by wallets: `m/44'/0'/{account}'/0/0`.
//!
//! Both derivation modes are implemented:
//! - hardened children need the parent private key;
//! - normal children can be derived from the parent public key alone, and agree
//!   with the private derivation of the same index.

use crate::core::config::BitcoinNetwork;
use crate::core::errors::WalletError;
use crate::core::wallet::mnemonic::Seed;
use bitcoin::hashes::{hash160, Hash};
use bitcoin::secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey};
use hmac::{Hmac, Mac};
use sha2::Sha512;
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

type HmacSha512 = Hmac<Sha512>;

/// First hardened child index (2^31).
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// BIP44 purpose level.
pub const BIP44_PURPOSE: u32 = 44;

/// SLIP-44 coin type. Testnet wallets keep coin type 0 as well.
pub const BITCOIN_COIN_TYPE: u32 = 0;

const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";

/// One path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildNumber {
    Normal(u32),
    Hardened(u32),
}

impl ChildNumber {
    pub fn normal(index: u32) -> Result<Self, WalletError> {
        if index >= HARDENED_OFFSET {
            return Err(WalletError::Derivation(format!("child index {} out of range", index)));
        }
        Ok(ChildNumber::Normal(index))
    }

    pub fn hardened(index: u32) -> Result<Self, WalletError> {
        if index >= HARDENED_OFFSET {
            return Err(WalletError::Derivation(format!("child index {} out of range", index)));
        }
        Ok(ChildNumber::Hardened(index))
    }

    pub fn is_hardened(&self) -> bool {
        matches!(self, ChildNumber::Hardened(_))
    }

    /// Wire encoding: hardened flag in the high bit.
    pub fn to_u32(self) -> u32 {
        match self {
            ChildNumber::Normal(i) => i,
            ChildNumber::Hardened(i) => i | HARDENED_OFFSET,
        }
    }

    pub fn from_u32(value: u32) -> Self {
        if value & HARDENED_OFFSET != 0 {
            ChildNumber::Hardened(value & !HARDENED_OFFSET)
        } else {
            ChildNumber::Normal(value)
        }
    }
}

impl fmt::Display for ChildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildNumber::Normal(i) => write!(f, "{}", i),
            ChildNumber::Hardened(i) => write!(f, "{}'", i),
        }
    }
}

/// Parsed derivation path such as `m/44'/0'/0'/0/0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DerivationPath(Vec<ChildNumber>);

impl DerivationPath {
    /// The wallet template `m/44'/0'/{account_index}'/0/0`.
    pub fn bip44_account(account_index: u32) -> Result<Self, WalletError> {
        Ok(Self(vec![
            ChildNumber::Hardened(BIP44_PURPOSE),
            ChildNumber::Hardened(BITCOIN_COIN_TYPE),
            ChildNumber::hardened(account_index)?,
            ChildNumber::Normal(0),
            ChildNumber::Normal(0),
        ]))
    }

    pub fn segments(&self) -> &[ChildNumber] {
        &self.0
    }

    pub fn is_master(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for DerivationPath {
    type Err = WalletError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let mut parts = path.trim().split('/');
        if parts.next() != Some("m") {
            return Err(WalletError::Derivation(format!("path '{}' must start with 'm'", path)));
        }

        let mut segments = Vec::new();
        for part in parts {
            let (digits, hardened) = match part.strip_suffix(|c: char| c == '\'' || c == 'h' || c == 'H') {
                Some(d) => (d, true),
                None => (part, false),
            };
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(WalletError::Derivation(format!(
                    "malformed segment '{}' in path '{}'",
                    part, path
                )));
            }
            let index: u32 = digits.parse().map_err(|_| {
                WalletError::Derivation(format!("segment '{}' in path '{}' is too large", part, path))
            })?;
            segments.push(if hardened {
                ChildNumber::hardened(index)?
            } else {
                ChildNumber::normal(index)?
            });
        }
        Ok(Self(segments))
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for segment in &self.0 {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

#[derive(Clone)]
enum KeyMaterial {
    Private(SecretKey),
    Public(PublicKey),
}

/// BIP32 extended key (private or public) with its chain code.
#[derive(Clone)]
pub struct ExtendedKey {
    key: KeyMaterial,
    chain_code: Zeroizing<[u8; 32]>,
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_number: ChildNumber,
}

impl ExtendedKey {
    /// Master key: HMAC-SHA512("Bitcoin seed", seed).
    pub fn master(seed: &Seed) -> Result<Self, WalletError> {
        Self::master_from_bytes(seed.as_bytes())
    }

    /// Master key from raw seed bytes (16..=64 bytes per BIP32).
    pub fn master_from_bytes(seed: &[u8]) -> Result<Self, WalletError> {
        if !(16..=64).contains(&seed.len()) {
            return Err(WalletError::Derivation(format!(
                "seed length must be 16..=64 bytes, got {}",
                seed.len()
            )));
        }

        let (il, ir) = hmac_sha512(MASTER_HMAC_KEY, &[seed])?;
        let secret = SecretKey::from_slice(il.as_slice())
            .map_err(|e| WalletError::Derivation(format!("invalid master key: {}", e)))?;

        Ok(Self {
            key: KeyMaterial::Private(secret),
            chain_code: ir,
            depth: 0,
            parent_fingerprint: [0u8; 4],
            child_number: ChildNumber::Normal(0),
        })
    }

    /// Derive one child.
    pub fn derive_child(&self, child: ChildNumber) -> Result<Self, WalletError> {
        let secp = Secp256k1::new();
        let depth = self
            .depth
            .checked_add(1)
            .ok_or_else(|| WalletError::Derivation("maximum derivation depth exceeded".into()))?;
        let index_bytes = child.to_u32().to_be_bytes();
        let parent_public = self.public_key();

        let (il, ir) = match (&self.key, child) {
            (KeyMaterial::Private(secret), ChildNumber::Hardened(_)) => {
                let secret_bytes = Zeroizing::new(secret.secret_bytes());
                hmac_sha512(self.chain_code.as_slice(), &[&[0u8][..], &secret_bytes[..], &index_bytes[..]])?
            }
            (KeyMaterial::Public(_), ChildNumber::Hardened(_)) => {
                return Err(WalletError::Derivation(format!(
                    "cannot derive hardened child {} from a public key",
                    child
                )))
            }
            (_, ChildNumber::Normal(_)) => {
                hmac_sha512(self.chain_code.as_slice(), &[&parent_public.serialize()[..], &index_bytes[..]])?
            }
        };

        let tweak = Scalar::from_be_bytes(*il)
            .map_err(|_| WalletError::Derivation(format!("derived tweak for child {} is out of range", child)))?;

        let key = match &self.key {
            KeyMaterial::Private(secret) => KeyMaterial::Private(
                secret
                    .add_tweak(&tweak)
                    .map_err(|e| WalletError::Derivation(format!("invalid child key {}: {}", child, e)))?,
            ),
            KeyMaterial::Public(public) => KeyMaterial::Public(
                public
                    .add_exp_tweak(&secp, &tweak)
                    .map_err(|e| WalletError::Derivation(format!("invalid child key {}: {}", child, e)))?,
            ),
        };

        Ok(Self {
            key,
            chain_code: ir,
            depth,
            parent_fingerprint: fingerprint_of(&parent_public),
            child_number: child,
        })
    }

    /// Walk every segment of `path` starting from this key.
    pub fn derive_path(&self, path: &DerivationPath) -> Result<Self, WalletError> {
        path.segments()
            .iter()
            .try_fold(self.clone(), |key, child| key.derive_child(*child))
    }

    /// Public-only copy of this key.
    pub fn neuter(&self) -> Self {
        Self {
            key: KeyMaterial::Public(self.public_key()),
            chain_code: self.chain_code.clone(),
            depth: self.depth,
            parent_fingerprint: self.parent_fingerprint,
            child_number: self.child_number,
        }
    }

    pub fn is_private(&self) -> bool {
        matches!(self.key, KeyMaterial::Private(_))
    }

    pub fn private_key(&self) -> Option<&SecretKey> {
        match &self.key {
            KeyMaterial::Private(secret) => Some(secret),
            KeyMaterial::Public(_) => None,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match &self.key {
            KeyMaterial::Private(secret) => PublicKey::from_secret_key(&Secp256k1::new(), secret),
            KeyMaterial::Public(public) => *public,
        }
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn parent_fingerprint(&self) -> [u8; 4] {
        self.parent_fingerprint
    }

    pub fn child_number(&self) -> ChildNumber {
        self.child_number
    }

    /// First four bytes of HASH160 of this key's public key.
    pub fn fingerprint(&self) -> [u8; 4] {
        fingerprint_of(&self.public_key())
    }

    /// Base58Check `xprv`/`xpub` (mainnet) or `tprv`/`tpub` (testnet) encoding.
    pub fn encode(&self, network: BitcoinNetwork) -> String {
        let version: [u8; 4] = match (network, self.is_private()) {
            (BitcoinNetwork::Mainnet, true) => [0x04, 0x88, 0xAD, 0xE4],
            (BitcoinNetwork::Mainnet, false) => [0x04, 0x88, 0xB2, 0x1E],
            (BitcoinNetwork::Testnet, true) => [0x04, 0x35, 0x83, 0x94],
            (BitcoinNetwork::Testnet, false) => [0x04, 0x35, 0x87, 0xCF],
        };

        let mut payload = Zeroizing::new(Vec::with_capacity(78));
        payload.extend_from_slice(&version);
        payload.push(self.depth);
        payload.extend_from_slice(&self.parent_fingerprint);
        payload.extend_from_slice(&self.child_number.to_u32().to_be_bytes());
        payload.extend_from_slice(self.chain_code.as_slice());
        match &self.key {
            KeyMaterial::Private(secret) => {
                payload.push(0x00);
                payload.extend_from_slice(&secret.secret_bytes());
            }
            KeyMaterial::Public(public) => payload.extend_from_slice(&public.serialize()),
        }

        bs58::encode(payload.as_slice()).with_check().into_string()
    }
}

impl fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedKey")
            .field("is_private", &self.is_private())
            .field("public_key", &self.public_key())
            .field("depth", &self.depth)
            .field("parent_fingerprint", &hex::encode(self.parent_fingerprint))
            .field("child_number", &self.child_number)
            .finish()
    }
}

/// Private/public key pair at the end of a derivation path.
pub struct KeyPair {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl KeyPair {
    /// Requires a private extended key.
    pub fn from_extended(key: &ExtendedKey) -> Result<Self, WalletError> {
        let secret_key = *key.private_key().ok_or_else(|| {
            WalletError::Derivation("key pair requires a private extended key".into())
        })?;
        Ok(Self { secret_key, public_key: key.public_key() })
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn private_key_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.secret_key.secret_bytes())
    }

    /// 33-byte compressed encoding.
    pub fn public_key_bytes(&self) -> [u8; 33] {
        self.public_key.serialize()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

/// Derive the wallet key pair at `m/44'/0'/{account_index}'/0/0`.
pub fn derive_account_keypair(seed: &Seed, account_index: u32) -> Result<KeyPair, WalletError> {
    let path = DerivationPath::bip44_account(account_index)?;
    let node = ExtendedKey::master(seed)?.derive_path(&path)?;
    KeyPair::from_extended(&node)
}

fn fingerprint_of(public_key: &PublicKey) -> [u8; 4] {
    let hash = hash160::Hash::hash(&public_key.serialize());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash.as_byte_array()[..4]);
    out
}

/// Returns (IL, IR) of HMAC-SHA512(key, concat(parts)).
fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> Result<(Zeroizing<[u8; 32]>, Zeroizing<[u8; 32]>), WalletError> {
    let mut mac = HmacSha512::new_from_slice(key)
        .map_err(|e| WalletError::Derivation(format!("HMAC initialization failed: {}", e)))?;
    for part in parts {
        mac.update(part);
    }
    let result = mac.finalize().into_bytes();

    let mut il = Zeroizing::new([0u8; 32]);
    let mut ir = Zeroizing::new([0u8; 32]);
    il.copy_from_slice(&result[..32]);
    ir.copy_from_slice(&result[32..]);
    Ok((il, ir))
}
