//! Esplora HTTP client
//!
//! Talks to a Blockstream-compatible REST API:
//!
//! | call | endpoint |
//! |---|---|
//! | UTXOs | `GET /address/{addr}/utxo` |
//! | raw transaction | `GET /tx/{txid}/hex` |
//! | address history | `GET /address/{addr}/txs` |
//! | broadcast | `POST /tx` (hex body, `text/plain`) |

use super::history::ProviderTransaction;
use super::utxo::Utxo;
use crate::blockchain::traits::BlockchainDataProvider;
use crate::core::config::WalletConfig;
use crate::core::errors::WalletError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Esplora REST client
#[derive(Debug, Clone)]
pub struct EsploraClient {
    base_url: String,
    http_client: HttpClient,
}

impl EsploraClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, WalletError> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WalletError::Config(format!("cannot build HTTP client: {}", e)))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { base_url, http_client })
    }

    /// Client for the configured endpoint and timeout.
    pub fn from_config(config: &WalletConfig) -> Result<Self, WalletError> {
        Self::new(config.api_base_url.clone(), Duration::from_secs(config.request_timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_text(&self, path: &str) -> Result<String, WalletError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| WalletError::NetworkFetch(format!("GET {}: {}", url, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WalletError::NetworkFetch(format!("GET {}: reading body: {}", url, e)))?;
        if !status.is_success() {
            return Err(WalletError::NetworkFetch(format!(
                "GET {} returned {}: {}",
                url,
                status.as_u16(),
                body.trim()
            )));
        }
        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, WalletError> {
        let body = self.get_text(path).await?;
        serde_json::from_str(&body)
            .map_err(|e| WalletError::InvalidProviderData(format!("GET {}: {}", path, e)))
    }
}

#[async_trait]
impl BlockchainDataProvider for EsploraClient {
    async fn list_utxos(&self, address: &str) -> Result<Vec<Utxo>, WalletError> {
        let utxos: Vec<Utxo> = self.get_json(&format!("/address/{}/utxo", address)).await?;
        debug!(address, count = utxos.len(), "fetched UTXOs");
        Ok(utxos)
    }

    async fn fetch_raw_transaction(&self, txid: &str) -> Result<String, WalletError> {
        Ok(self.get_text(&format!("/tx/{}/hex", txid)).await?.trim().to_string())
    }

    async fn list_transactions(&self, address: &str) -> Result<Vec<ProviderTransaction>, WalletError> {
        self.get_json(&format!("/address/{}/txs", address)).await
    }

    async fn broadcast(&self, tx_hex: &str) -> Result<String, WalletError> {
        let url = self.url("/tx");
        info!(%url, bytes = tx_hex.len() / 2, "broadcasting transaction");
        let response = self
            .http_client
            .post(&url)
            .header(CONTENT_TYPE, "text/plain")
            .body(tx_hex.to_string())
            .send()
            .await
            .map_err(|e| WalletError::BroadcastFailure {
                status: 0,
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| WalletError::BroadcastFailure {
            status,
            message: format!("reading body: {}", e),
        })?;
        parse_broadcast_response(status, &body)
    }
}

/// Interpret the provider's answer to a broadcast.
///
/// 2xx carries the txid as plain text; anything else carries an error message.
pub fn parse_broadcast_response(status: u16, body: &str) -> Result<String, WalletError> {
    if (200..300).contains(&status) {
        let txid = body.trim();
        if txid.is_empty() {
            return Err(WalletError::InvalidProviderData("empty broadcast response".into()));
        }
        info!(txid, "transaction accepted");
        Ok(txid.to_string())
    } else {
        warn!(status, "broadcast rejected");
        Err(WalletError::BroadcastFailure {
            status,
            message: body.trim().to_string(),
        })
    }
}
