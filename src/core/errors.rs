//! Error taxonomy for the wallet engine.
//!
//! Every failure the engine can produce is a distinct variant so callers can
//! branch on it (dust vs. insufficient funds vs. provider failures) without
//! matching on message text.

use thiserror::Error;

/// Custom error type for wallet operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Requested entropy size is not one of 128/160/192/224/256 bits.
    #[error("Unsupported entropy size: {0} bits (expected 128, 160, 192, 224 or 256)")]
    EntropyRange(usize),

    /// Mnemonic phrase failed word-list or checksum validation.
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// HD derivation failed (malformed path or invalid intermediate key).
    #[error("Key derivation error: {0}")]
    Derivation(String),

    /// Public key is not a 33-byte compressed secp256k1 point.
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Private key is not a valid 32-byte secp256k1 scalar.
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Address failed checksum or network validation.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Selected inputs cannot cover the amount plus the dust threshold.
    #[error("Insufficient funds: available {available} sat, required {required} sat")]
    InsufficientFunds {
        /// Accumulated input value in satoshis.
        available: u64,
        /// Minimum value needed in satoshis.
        required: u64,
    },

    /// Payment amount is below the dust threshold.
    #[error("Amount {amount} sat is below the dust threshold ({threshold} sat)")]
    AmountBelowDust {
        /// Requested amount in satoshis.
        amount: u64,
        /// Dust threshold in satoshis.
        threshold: u64,
    },

    /// Signing failed or the key does not unlock an input.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// A read from the blockchain data provider failed.
    #[error("Network fetch failed: {0}")]
    NetworkFetch(String),

    /// The provider rejected a broadcast.
    #[error("Broadcast failed (status {status}): {message}")]
    BroadcastFailure {
        /// HTTP status returned by the provider (0 when no response arrived).
        status: u16,
        /// Error body returned by the provider.
        message: String,
    },

    /// Provider returned data inconsistent with the request.
    #[error("Invalid provider data: {0}")]
    InvalidProviderData(String),

    /// Caller-supplied input rejected.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found errors.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Wallet with the same address already exists in the collection.
    #[error("Wallet already exists: {0}")]
    DuplicateWallet(String),

    /// Storage-related errors.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl WalletError {
    /// Whether a caller may reasonably retry the same call.
    ///
    /// The engine itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WalletError::NetworkFetch(_))
    }

    /// Whether the failure is caused by the funds available to the wallet.
    pub fn is_funds_error(&self) -> bool {
        matches!(
            self,
            WalletError::InsufficientFunds { .. } | WalletError::AmountBelowDust { .. }
        )
    }
}

impl From<std::io::Error> for WalletError {
    fn from(err: std::io::Error) -> Self {
        WalletError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(err: serde_json::Error) -> Self {
        WalletError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_insufficient_funds() {
        let err = WalletError::InsufficientFunds { available: 1000, required: 1446 };
        assert_eq!(
            format!("{}", err),
            "Insufficient funds: available 1000 sat, required 1446 sat"
        );
    }

    #[test]
    fn test_display_dust() {
        let err = WalletError::AmountBelowDust { amount: 100, threshold: 546 };
        assert!(err.to_string().contains("dust threshold"));
    }

    #[test]
    fn test_retryable_only_network_fetch() {
        assert!(WalletError::NetworkFetch("timeout".into()).is_retryable());
        assert!(!WalletError::Signing("bad key".into()).is_retryable());
        assert!(!WalletError::BroadcastFailure { status: 400, message: "x".into() }.is_retryable());
    }

    #[test]
    fn test_funds_errors() {
        assert!(WalletError::AmountBelowDust { amount: 1, threshold: 546 }.is_funds_error());
        assert!(!WalletError::InvalidMnemonic("x".into()).is_funds_error());
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: WalletError = io.into();
        assert!(matches!(err, WalletError::Storage(_)));
    }
}
