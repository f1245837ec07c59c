//! BIP39 mnemonic generation, validation and seed stretching.

use crate::core::errors::WalletError;
use bip39::{Language, Mnemonic};
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use tracing::debug;
use zeroize::Zeroizing;

/// Entropy sizes accepted by BIP39 (12, 15, 18, 21 and 24 words).
pub const SUPPORTED_ENTROPY_BITS: [usize; 5] = [128, 160, 192, 224, 256];

/// Entropy used for new wallets (12 words).
pub const DEFAULT_ENTROPY_BITS: usize = 128;

/// 64-byte BIP39 seed. Wiped on drop.
#[derive(Clone)]
pub struct Seed(Zeroizing<[u8; 64]>);

impl Seed {
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl PartialEq for Seed {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_slice() == other.0.as_slice()
    }
}

impl Eq for Seed {}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed(<redacted>)")
    }
}

/// Generate a fresh English mnemonic from OS randomness.
pub fn generate_mnemonic(entropy_bits: usize) -> Result<Mnemonic, WalletError> {
    if !SUPPORTED_ENTROPY_BITS.contains(&entropy_bits) {
        return Err(WalletError::EntropyRange(entropy_bits));
    }

    let mut entropy = Zeroizing::new(vec![0u8; entropy_bits / 8]);
    OsRng.fill_bytes(entropy.as_mut_slice());

    let mnemonic = Mnemonic::from_entropy(&entropy)
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
    debug!(words = mnemonic.word_count(), "generated mnemonic");
    Ok(mnemonic)
}

/// Parse an English phrase, checking every word and the checksum.
///
/// Runs of whitespace between words are collapsed first.
pub fn parse_mnemonic(phrase: &str) -> Result<Mnemonic, WalletError> {
    let normalized = phrase.split_whitespace().collect::<Vec<_>>().join(" ");
    Mnemonic::parse_in_normalized(Language::English, &normalized)
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))
}

/// Checksum/word-list check that never errors.
pub fn validate_mnemonic(phrase: &str) -> bool {
    parse_mnemonic(phrase).is_ok()
}

/// PBKDF2-HMAC-SHA512 stretch of (mnemonic, passphrase) into a seed.
pub fn derive_seed(mnemonic: &Mnemonic, passphrase: &str) -> Seed {
    Seed::from_bytes(mnemonic.to_seed(passphrase))
}
