//! Wallet collection and its persistence.
//!
//! `WalletStore` is a plain value owned by the caller; repositories only load
//! and save it whole.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::core::bip44::HARDENED_OFFSET;
use crate::core::errors::WalletError;
use crate::core::wallet::WalletDetails;

/// Ordered wallets, the current selection and cached display balances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletStore {
    #[serde(default)]
    wallets: Vec<WalletDetails>,
    #[serde(default)]
    selected_index: Option<usize>,
    /// Satoshis by address.
    #[serde(default)]
    balances: BTreeMap<String, u64>,
}

impl WalletStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wallets(&self) -> &[WalletDetails] {
        &self.wallets
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    pub fn selected_wallet(&self) -> Option<&WalletDetails> {
        self.selected_index.and_then(|i| self.wallets.get(i))
    }

    pub fn contains_address(&self, address: &str) -> bool {
        self.wallets.iter().any(|w| w.address == address)
    }

    /// Account index following the highest one in use for `mnemonic`.
    ///
    /// Removed accounts are never handed out again.
    pub fn next_account_index(&self, mnemonic: &str) -> Result<u32, WalletError> {
        let highest = self
            .wallets
            .iter()
            .filter(|w| w.mnemonic == mnemonic)
            .map(|w| w.account_index)
            .max();
        match highest {
            None => Ok(0),
            Some(i) => i
                .checked_add(1)
                .filter(|next| *next < HARDENED_OFFSET)
                .ok_or_else(|| WalletError::InvalidInput("no account index left for this mnemonic".into())),
        }
    }

    /// Append a wallet; it becomes selected when nothing was.
    pub fn add_wallet(&mut self, wallet: WalletDetails) -> usize {
        self.wallets.push(wallet);
        let index = self.wallets.len() - 1;
        if self.selected_index.is_none() {
            self.selected_index = Some(index);
        }
        debug!(index, "wallet added");
        index
    }

    /// Select by index, or clear the selection with `None`.
    pub fn select_wallet(&mut self, index: Option<usize>) -> Result<(), WalletError> {
        if let Some(i) = index {
            self.check_index(i)?;
        }
        self.selected_index = index;
        Ok(())
    }

    pub fn rename_wallet(&mut self, index: usize, name: &str) -> Result<(), WalletError> {
        self.check_index(index)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(WalletError::InvalidInput("wallet name cannot be empty".into()));
        }
        self.wallets[index].name = name.to_string();
        Ok(())
    }

    /// Remove a wallet and keep the selection pointing at a sensible entry.
    pub fn remove_wallet(&mut self, index: usize) -> Result<WalletDetails, WalletError> {
        self.check_index(index)?;
        let removed = self.wallets.remove(index);
        self.balances.remove(&removed.address);

        self.selected_index = match self.selected_index {
            _ if self.wallets.is_empty() => None,
            Some(selected) if selected == index => Some(0),
            Some(selected) if selected > index => Some(selected - 1),
            other => other,
        };
        info!(address = %removed.address, "wallet removed");
        Ok(removed)
    }

    pub fn set_balance(&mut self, address: &str, sats: u64) {
        self.balances.insert(address.to_string(), sats);
    }

    pub fn balance(&self, address: &str) -> Option<u64> {
        self.balances.get(address).copied()
    }

    fn check_index(&self, index: usize) -> Result<(), WalletError> {
        if index >= self.wallets.len() {
            return Err(WalletError::NotFound(format!(
                "no wallet at index {} ({} wallets)",
                index,
                self.wallets.len()
            )));
        }
        Ok(())
    }
}

/// Load/save of the whole wallet collection.
#[async_trait]
pub trait WalletRepository: Send + Sync {
    async fn load(&self) -> Result<WalletStore, WalletError>;
    async fn save(&self, store: &WalletStore) -> Result<(), WalletError>;
}

/// Pretty-printed JSON file. A missing file loads as an empty collection.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl WalletRepository for JsonFileRepository {
    async fn load(&self) -> Result<WalletStore, WalletError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no wallet file yet");
                return Ok(WalletStore::default());
            }
            Err(e) => {
                return Err(WalletError::Storage(format!("reading {}: {}", self.path.display(), e)))
            }
        };
        Ok(serde_json::from_str(&contents)?)
    }

    async fn save(&self, store: &WalletStore) -> Result<(), WalletError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(store)?;
        // write-then-rename so a crash never leaves a truncated file
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), wallets = store.len(), "wallet file saved");
        Ok(())
    }
}

/// Process-local repository, mainly for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    store: Mutex<WalletStore>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletRepository for InMemoryRepository {
    async fn load(&self) -> Result<WalletStore, WalletError> {
        Ok(self.store.lock().await.clone())
    }

    async fn save(&self, store: &WalletStore) -> Result<(), WalletError> {
        *self.store.lock().await = store.clone();
        Ok(())
    }
}
