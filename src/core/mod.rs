pub mod bip44;
pub mod config;
pub mod errors;
pub mod wallet;
pub mod wallet_manager;

pub use config::{BitcoinNetwork, WalletConfig};
pub use errors::WalletError;
pub use wallet::WalletDetails;
pub use wallet_manager::WalletManager;
