//! Wallet engine configuration.
//!
//! Network selection and the data-provider endpoint are explicit values passed
//! into the client at construction time. They are resolved from built-in
//! per-network defaults, an optional TOML file, and `WALLET_*` environment
//! variables, in that order of increasing precedence.

use crate::blockchain::bitcoin::utxo::UtxoOrder;
use crate::core::errors::WalletError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const ENV_NETWORK: &str = "WALLET_BITCOIN_NETWORK";
pub const ENV_API_URL: &str = "WALLET_BLOCKCHAIN_API_URL";
pub const ENV_EXPLORER_URL: &str = "WALLET_EXPLORER_URL";
pub const ENV_REQUEST_TIMEOUT: &str = "WALLET_REQUEST_TIMEOUT_SECS";

/// Bitcoin network selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BitcoinNetwork {
    Mainnet,
    #[default]
    Testnet,
}

impl BitcoinNetwork {
    /// The matching `bitcoin` crate network (selects address version bytes).
    pub fn to_bitcoin(self) -> bitcoin::Network {
        match self {
            BitcoinNetwork::Mainnet => bitcoin::Network::Bitcoin,
            BitcoinNetwork::Testnet => bitcoin::Network::Testnet,
        }
    }

    /// Esplora API base URL used when none is configured.
    pub fn default_api_url(self) -> &'static str {
        match self {
            BitcoinNetwork::Mainnet => "https://blockstream.info/api",
            BitcoinNetwork::Testnet => "https://blockstream.info/testnet/api",
        }
    }

    /// Block explorer base URL used when none is configured.
    pub fn default_explorer_url(self) -> &'static str {
        match self {
            BitcoinNetwork::Mainnet => "https://blockstream.info",
            BitcoinNetwork::Testnet => "https://blockstream.info/testnet",
        }
    }
}

impl fmt::Display for BitcoinNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitcoinNetwork::Mainnet => write!(f, "mainnet"),
            BitcoinNetwork::Testnet => write!(f, "testnet"),
        }
    }
}

impl FromStr for BitcoinNetwork {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "bitcoin" => Ok(BitcoinNetwork::Mainnet),
            "testnet" => Ok(BitcoinNetwork::Testnet),
            other => Err(WalletError::Config(format!(
                "unknown network '{}', expected 'mainnet' or 'testnet'",
                other
            ))),
        }
    }
}

/// Resolved engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConfig {
    pub network: BitcoinNetwork,
    pub api_base_url: String,
    pub explorer_url: String,
    /// Transport-level timeout for every provider request.
    pub request_timeout_secs: u64,
    /// Upper bound on concurrent previous-transaction fetches.
    pub fetch_concurrency: usize,
    pub utxo_order: UtxoOrder,
}

impl WalletConfig {
    fn default_request_timeout_secs() -> u64 {
        30
    }

    fn default_fetch_concurrency() -> usize {
        4
    }

    /// Defaults for the given network.
    pub fn for_network(network: BitcoinNetwork) -> Self {
        Self {
            network,
            api_base_url: network.default_api_url().to_string(),
            explorer_url: network.default_explorer_url().to_string(),
            request_timeout_secs: Self::default_request_timeout_secs(),
            fetch_concurrency: Self::default_fetch_concurrency(),
            utxo_order: UtxoOrder::default(),
        }
    }

    /// Parse a TOML document; missing keys fall back to per-network defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, WalletError> {
        let raw: RawConfig = toml::from_str(contents)
            .map_err(|e| WalletError::Config(format!("invalid config file: {}", e)))?;
        raw.resolve()
    }

    /// Build from environment variables only.
    pub fn from_env() -> Result<Self, WalletError> {
        Self::resolve_layers(None, |key| std::env::var(key).ok())
    }

    /// Load an optional TOML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, WalletError> {
        let contents = match path {
            Some(p) if p.exists() => Some(std::fs::read_to_string(p).map_err(|e| {
                WalletError::Config(format!("cannot read {}: {}", p.display(), e))
            })?),
            Some(p) => {
                return Err(WalletError::Config(format!(
                    "config file {} does not exist",
                    p.display()
                )))
            }
            None => None,
        };
        Self::resolve_layers(contents.as_deref(), |key| std::env::var(key).ok())
    }

    /// Layer resolution with an injectable variable lookup.
    pub fn resolve_layers<F>(toml_contents: Option<&str>, lookup: F) -> Result<Self, WalletError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut raw = match toml_contents {
            Some(contents) => toml::from_str::<RawConfig>(contents)
                .map_err(|e| WalletError::Config(format!("invalid config file: {}", e)))?,
            None => RawConfig::default(),
        };

        if let Some(network) = lookup(ENV_NETWORK) {
            raw.network = Some(network.parse()?);
        }
        if let Some(url) = lookup(ENV_API_URL) {
            raw.api_base_url = Some(url);
        }
        if let Some(url) = lookup(ENV_EXPLORER_URL) {
            raw.explorer_url = Some(url);
        }
        if let Some(timeout) = lookup(ENV_REQUEST_TIMEOUT) {
            let secs = timeout.trim().parse::<u64>().map_err(|_| {
                WalletError::Config(format!("{} must be an integer, got '{}'", ENV_REQUEST_TIMEOUT, timeout))
            })?;
            raw.request_timeout_secs = Some(secs);
        }

        raw.resolve()
    }

    /// Link to a transaction on the configured explorer.
    pub fn explorer_tx_url(&self, txid: &str) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), txid)
    }

    fn validate(&self) -> Result<(), WalletError> {
        for (name, url) in [("api_base_url", &self.api_base_url), ("explorer_url", &self.explorer_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(WalletError::Config(format!("{} must be an http(s) URL, got '{}'", name, url)));
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(WalletError::Config("request_timeout_secs must be greater than zero".into()));
        }
        if self.fetch_concurrency == 0 {
            return Err(WalletError::Config("fetch_concurrency must be greater than zero".into()));
        }
        Ok(())
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self::for_network(BitcoinNetwork::default())
    }
}

/// File/env layer before defaults are applied.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    network: Option<BitcoinNetwork>,
    api_base_url: Option<String>,
    explorer_url: Option<String>,
    request_timeout_secs: Option<u64>,
    fetch_concurrency: Option<usize>,
    utxo_order: Option<UtxoOrder>,
}

impl RawConfig {
    fn resolve(self) -> Result<WalletConfig, WalletError> {
        let network = self.network.unwrap_or_default();
        let defaults = WalletConfig::for_network(network);
        let config = WalletConfig {
            network,
            api_base_url: self
                .api_base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            explorer_url: self.explorer_url.unwrap_or(defaults.explorer_url),
            request_timeout_secs: self.request_timeout_secs.unwrap_or(defaults.request_timeout_secs),
            fetch_concurrency: self.fetch_concurrency.unwrap_or(defaults.fetch_concurrency),
            utxo_order: self.utxo_order.unwrap_or(defaults.utxo_order),
        };
        config.validate()?;
        Ok(config)
    }
}
