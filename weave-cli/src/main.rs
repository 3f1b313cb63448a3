use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::runtime::Runtime;

use weave_config::NodeConfig;
use weave_core::{RewardAddr, WalletEntry, WalletList};
use weave_crypto::address_to_string;
use weave_node::{bootstrap_standalone, init_logging};
use weave_wallet::WalletStore;

#[derive(Parser)]
#[command(name = "weave", version, about = "blockweave node and wallet CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file.
    Init {
        #[arg(long, default_value = "config/weave.toml")]
        config: PathBuf,
    },
    /// Run a node.
    Node {
        #[command(subcommand)]
        cmd: NodeCmd,
    },
    /// Wallet key management.
    Wallet {
        #[command(subcommand)]
        cmd: WalletCmd,
    },
}

#[derive(Subcommand)]
enum NodeCmd {
    /// Starts a standalone node holding a fresh genesis block crediting
    /// `genesis_wallet` (if given) with `config`'s configured supply, and
    /// blocks until interrupted. Peer wiring is out of scope for this CLI
    /// (spec.md specifies `PeerRpc` only by contract); multi-node setups
    /// are exercised through `weave-node`'s integration tests instead.
    Start {
        #[arg(long, default_value = "config/weave.toml")]
        config: PathBuf,
        #[arg(long)]
        peer_id: String,
        #[arg(long)]
        reward_wallet: Option<String>,
        #[arg(long)]
        genesis_wallet: Option<String>,
    },
}

#[derive(Subcommand)]
enum WalletCmd {
    New {
        #[arg(long, default_value = "default")]
        name: String,
        #[arg(long)]
        password: String,
    },
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Init { config } => init_config(config)?,
        Commands::Node { cmd } => match cmd {
            NodeCmd::Start {
                config,
                peer_id,
                reward_wallet,
                genesis_wallet,
            } => {
                let rt = Runtime::new()?;
                rt.block_on(async move { run_node_start(config, peer_id, reward_wallet, genesis_wallet).await })?;
            }
        },
        Commands::Wallet { cmd } => match cmd {
            WalletCmd::New { name, password } => {
                let store = WalletStore::new(wallet_dir()?)?;
                let wallet = store.create(&name, &password)?;
                println!(
                    "Created wallet {} address {}",
                    wallet.name,
                    address_to_string(&wallet.address)
                );
            }
            WalletCmd::List => {
                let store = WalletStore::new(wallet_dir()?)?;
                for w in store.list()? {
                    println!("{} -> {}", w.name, address_to_string(&w.address));
                }
            }
        },
    }
    Ok(())
}

async fn run_node_start(
    config_path: PathBuf,
    peer_id: String,
    reward_wallet: Option<String>,
    genesis_wallet: Option<String>,
) -> Result<()> {
    init_logging();
    let config = NodeConfig::load(&config_path)?;
    tracing::info!(peer_id = %peer_id, ?config_path, "starting weave node");

    let wallets = WalletStore::new(wallet_dir()?)?;
    let reward_addr = match reward_wallet {
        Some(name) => RewardAddr::Address(wallets.load(&name)?.address),
        None => RewardAddr::Unclaimed,
    };
    let genesis_wallets = match genesis_wallet {
        Some(name) => WalletList::from_entries(vec![WalletEntry {
            address: wallets.load(&name)?.address,
            balance: config.consensus.genesis_tokens,
            last_tx: None,
        }]),
        None => WalletList::new(),
    };

    let handle = bootstrap_standalone(peer_id, genesis_wallets, config, reward_addr);
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    let tip = handle.tip().await;
    tracing::info!(height = tip.height, "final tip");
    handle.stop().await;
    Ok(())
}

fn init_config(path: PathBuf) -> Result<()> {
    if path.exists() {
        println!("Config already exists at {:?}", path);
        return Ok(());
    }
    let cfg = NodeConfig::example();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, toml::to_string_pretty(&cfg)?)?;
    println!("Wrote config to {:?}", path);
    Ok(())
}

fn wallet_dir() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .unwrap_or(std::env::temp_dir())
        .join(".weave")
        .join("wallets");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
