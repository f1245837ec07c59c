//! Bitcoin support: P2PKH addresses, UTXO selection, legacy transaction
//! signing and the Esplora data provider.

pub mod account;
pub mod address;
pub mod client;
pub mod history;
pub mod transaction;
pub mod utxo;

pub use account::BitcoinKeypair;
pub use address::{parse_address, to_address, BitcoinAddress};
pub use client::{parse_broadcast_response, EsploraClient};
pub use history::{summarize, Direction, TransactionSummary, HISTORY_LIMIT};
pub use transaction::{sign, InputSelection, PaymentRequest, SignedTransaction, UnsignedTransaction};
pub use utxo::{Utxo, UtxoOrder, UtxoSelector, DUST_THRESHOLD, FLAT_FEE};
