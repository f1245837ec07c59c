pub mod bitcoin;
pub mod traits;

pub use traits::{BlockchainDataProvider, TransactionStatus};
