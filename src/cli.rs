use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default wallet collection file.
pub const DEFAULT_STORE_PATH: &str = "wallets.json";

/// Bitcoin HD wallet CLI (library-facing definitions)
#[derive(Debug, Parser)]
#[command(name = "wallet-cli", about = "Bitcoin HD wallet CLI", disable_help_subcommand = true)]
pub struct Cli {
    /// Wallet collection file
    #[arg(long, global = true, default_value = DEFAULT_STORE_PATH)]
    pub store: PathBuf,

    /// Optional TOML configuration file; `WALLET_*` variables override it
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print a new mnemonic without storing anything
    GenerateMnemonic {
        #[arg(long, default_value_t = 128)]
        entropy_bits: usize,
    },
    /// Create a wallet (next account of the first wallet's mnemonic)
    Create {
        /// Start from a brand new mnemonic instead
        #[arg(long)]
        fresh: bool,
    },
    /// Import a wallet from a mnemonic phrase
    Import {
        phrase: String,
    },
    List,
    Select {
        index: usize,
    },
    Rename {
        index: usize,
        name: String,
    },
    Remove {
        index: usize,
    },
    /// Query the balance of a wallet (selected one by default)
    Balance {
        #[arg(long)]
        index: Option<usize>,
    },
    History {
        #[arg(long)]
        index: Option<usize>,
    },
    /// Build, sign and broadcast a payment in satoshis
    Send {
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: u64,
        #[arg(long)]
        index: Option<usize>,
        /// Print the signed hex instead of broadcasting it
        #[arg(long)]
        dry_run: bool,
    },
    /// Broadcast an already signed transaction
    Broadcast {
        hex: String,
    },
    /// Print the account-level extended public key
    ExportXpub {
        #[arg(long)]
        index: Option<usize>,
    },
}
