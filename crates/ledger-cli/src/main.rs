use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ledger_core::{ChainStore, Ledger, LedgerConfig, MiningOptions, TransferRecord};
use ledger_storage::SledStore;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "Drive a local proof-of-work ledger")]
struct Cli {
    /// Data directory for sled
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// JSON file with `difficulty` and `mining_reward`
    #[arg(long)]
    config: Option<PathBuf>,

    /// Required leading hex zeros (overrides the config file)
    #[arg(long)]
    difficulty: Option<u32>,

    /// Reward paid to the miner of each block (overrides the config file)
    #[arg(long)]
    reward: Option<u64>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Queue a transfer for the next block
    Submit {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: u64,
        /// Reject zero amounts, duplicates and overdrafts
        #[arg(long)]
        checked: bool,
    },
    /// Seal the pending transfers into a new block
    Mine {
        #[arg(long)]
        reward_address: String,
        /// Search nonces on all cores
        #[arg(long)]
        parallel: bool,
        /// Give up after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Print the replayed balance of an address
    Balance {
        #[arg(long)]
        address: String,
    },
    /// Verify hashes and links of the whole chain
    Validate,
    /// Print every block
    Chain,
    /// Run the sample session in memory
    Demo {
        #[arg(long, default_value = "miner-address")]
        miner: String,
    },
}

fn load_config(cli: &Cli) -> Result<LedgerConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => LedgerConfig::default(),
    };
    if let Some(difficulty) = cli.difficulty {
        config.difficulty = difficulty;
    }
    if let Some(reward) = cli.reward {
        config.mining_reward = reward;
    }
    config.validate()?;
    Ok(config)
}

fn demo(ledger: &mut Ledger, miner: &str) {
    ledger.create_transaction(TransferRecord::new("address1", "address2", 10));
    ledger.create_transaction(TransferRecord::new("address1", "address2", 5));

    println!("Starting the miner...");
    let block = ledger.mine_pending_transactions(miner);
    println!("Block mined: {}", block.hash());
    println!("Balance of {miner} is {}", ledger.get_balance_of_address(miner));

    println!("Starting the miner again...");
    let block = ledger.mine_pending_transactions(miner);
    println!("Block mined: {}", block.hash());
    println!("Balance of {miner} is {}", ledger.get_balance_of_address(miner));
    println!("Chain valid: {}", ledger.is_chain_valid());
}

fn run_with_store(data_dir: &Path, config: LedgerConfig, cmd: Command) -> Result<()> {
    let store = SledStore::open(data_dir)?;
    if let Command::Validate = cmd {
        let ledger = Ledger::load(&store, config)?;
        match ledger.verify_chain() {
            Ok(()) => println!("chain valid ({} blocks)", ledger.len()),
            Err(fault) => println!("chain invalid: {fault}"),
        }
        return Ok(());
    }

    let mut ledger = Ledger::restore(&store, config)?;
    info!("ledger at height {}", ledger.len() - 1);

    match cmd {
        Command::Submit {
            from,
            to,
            amount,
            checked,
        } => {
            let record = TransferRecord::new(from, to, amount);
            if checked {
                ledger.submit_checked(record)?;
            } else {
                ledger.create_transaction(record);
            }
            ledger.persist(&store)?;
            println!("pending: {}", ledger.pending_transactions().len());
        }
        Command::Mine {
            reward_address,
            parallel,
            timeout_secs,
        } => {
            let mut options = MiningOptions {
                parallel,
                ..MiningOptions::default()
            };
            if let Some(secs) = timeout_secs {
                options = options.with_timeout(Duration::from_secs(secs));
            }
            let block = ledger.mine_pending_transactions_with(&reward_address, &options)?;
            println!("Block mined: {} (nonce {})", block.hash(), block.nonce());
            ledger.persist(&store)?;
        }
        Command::Balance { address } => {
            println!("{address}: {}", ledger.get_balance_of_address(&address));
        }
        Command::Chain => {
            for (height, block) in ledger.blocks().iter().enumerate() {
                println!(
                    "#{height} ts={} nonce={} prev={} hash={} transfers={}",
                    block.timestamp(),
                    block.nonce(),
                    block.previous_hash(),
                    block.hash(),
                    block.transfers().len()
                );
            }
        }
        Command::Validate | Command::Demo { .. } => {}
    }
    store.close()?;
    Ok(())
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.cmd {
        Command::Demo { miner } => {
            let mut ledger = Ledger::new(config)?;
            demo(&mut ledger, &miner);
            Ok(())
        }
        cmd => run_with_store(&cli.data_dir, config, cmd),
    }
}
