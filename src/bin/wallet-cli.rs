use anyhow::{anyhow, Context, Result};
use btc_hd_wallet::blockchain::bitcoin::FLAT_FEE;
use btc_hd_wallet::cli::{Cli, Commands};
use btc_hd_wallet::core::bip44::{DerivationPath, ExtendedKey, BIP44_PURPOSE, BITCOIN_COIN_TYPE};
use btc_hd_wallet::core::config::WalletConfig;
use btc_hd_wallet::core::wallet::mnemonic::{derive_seed, generate_mnemonic, parse_mnemonic};
use btc_hd_wallet::core::wallet::{create_wallet, import_wallet, WalletDetails};
use btc_hd_wallet::core::WalletManager;
use btc_hd_wallet::storage::{JsonFileRepository, WalletRepository, WalletStore};
use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();

    let config = WalletConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let repo = JsonFileRepository::new(&cli.store);
    let mut store = repo
        .load()
        .await
        .with_context(|| format!("loading {}", cli.store.display()))?;

    match cli.command {
        Commands::GenerateMnemonic { entropy_bits } => {
            println!("{}", generate_mnemonic(entropy_bits)?);
        }
        Commands::Create { fresh } => {
            let wallet = create_wallet(&mut store, config.network, fresh)?;
            repo.save(&store).await?;
            println!("{}\t{}", wallet.name, wallet.address);
            println!("Back up this mnemonic: {}", wallet.mnemonic);
        }
        Commands::Import { phrase } => {
            let wallet = import_wallet(&mut store, config.network, &phrase)?;
            repo.save(&store).await?;
            println!("{}\t{}", wallet.name, wallet.address);
        }
        Commands::List => {
            for (i, wallet) in store.wallets().iter().enumerate() {
                let marker = if store.selected_index() == Some(i) { "*" } else { " " };
                let balance = store
                    .balance(&wallet.address)
                    .map(|b| format!("{} sat", b))
                    .unwrap_or_else(|| "-".into());
                println!("{}{}\t{}\t{}\t{}", marker, i, wallet.name, wallet.address, balance);
            }
        }
        Commands::Select { index } => {
            store.select_wallet(Some(index))?;
            repo.save(&store).await?;
        }
        Commands::Rename { index, name } => {
            store.rename_wallet(index, &name)?;
            repo.save(&store).await?;
        }
        Commands::Remove { index } => {
            let removed = store.remove_wallet(index)?;
            repo.save(&store).await?;
            println!("removed {}", removed.address);
        }
        Commands::Balance { index } => {
            let address = pick(&store, index)?.address.clone();
            let manager = WalletManager::new(&config)?;
            let balance = manager.get_balance(&address).await?;
            store.set_balance(&address, balance);
            repo.save(&store).await?;
            println!("{} sat", balance);
        }
        Commands::History { index } => {
            let address = pick(&store, index)?.address.clone();
            let manager = WalletManager::new(&config)?;
            for tx in manager.transaction_history(&address).await? {
                let when = tx
                    .time
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "pending".into());
                println!(
                    "{}\t{:?}\t{} sat\tfee {}\t{}",
                    when, tx.direction, tx.amount, tx.fee, tx.explorer_url
                );
            }
        }
        Commands::Send { to, amount, index, dry_run } => {
            let wallet = pick(&store, index)?;
            let manager = WalletManager::new(&config)?;
            let outcome = if dry_run {
                manager
                    .create_transaction(&wallet.address, &to, amount, &wallet.private_key)
                    .await
            } else {
                manager
                    .send(&wallet.address, &to, amount, &wallet.private_key)
                    .await
                    .map(|txid| config.explorer_tx_url(&txid))
            };
            match outcome {
                Ok(line) => println!("{}", line),
                Err(e) if e.is_funds_error() => {
                    return Err(anyhow!(e).context(format!(
                        "cannot pay {} sat plus the {} sat fee from {}",
                        amount, FLAT_FEE, wallet.address
                    )));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Broadcast { hex } => {
            let manager = WalletManager::new(&config)?;
            let txid = manager.broadcast_transaction(&hex).await?;
            println!("{}", config.explorer_tx_url(&txid));
        }
        Commands::ExportXpub { index } => {
            let wallet = pick(&store, index)?;
            let seed = derive_seed(&parse_mnemonic(&wallet.mnemonic)?, "");
            let path: DerivationPath = format!(
                "m/{}'/{}'/{}'",
                BIP44_PURPOSE, BITCOIN_COIN_TYPE, wallet.account_index
            )
            .parse()?;
            let account = ExtendedKey::master(&seed)?.derive_path(&path)?.neuter();
            println!("{}", account.encode(config.network));
        }
    }

    Ok(())
}

/// Wallet at `index`, or the selected one.
fn pick(store: &WalletStore, index: Option<usize>) -> Result<&WalletDetails> {
    match index {
        Some(i) => store.wallets().get(i).ok_or_else(|| anyhow!("no wallet at index {}", i)),
        None => store
            .selected_wallet()
            .ok_or_else(|| anyhow!("no wallet selected; run `create`, `import` or `select` first")),
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
