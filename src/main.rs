use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use budget_tool::config::{default_config_path, ResolvedConfig};
use budget_tool::format::{account_summary, to_pretty_json};
use budget_tool::query::AccountService;
use budget_tool::simplefin::{
    claim_access_url, claim_client, load_or_fetch, AccountSet, AccountSource, LoadMode,
    SimpleFinClient, SnapshotCache,
};
use budget_tool::storage::{SqliteStorage, Storage};
use budget_tool::sync::SyncService;
use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "budget-tool")]
#[command(about = "Sync tracked SimpleFIN accounts into a local database")]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load accounts (snapshot first) and store the tracked ones
    Sync {
        /// Ignore the snapshot and fetch from the bridge
        #[arg(long)]
        refresh: bool,
    },
    /// Fetch from the bridge and overwrite the snapshot without storing
    Fetch,
    /// List stored accounts
    Accounts {
        #[arg(long)]
        json: bool,
    },
    /// Show one stored account and its transactions
    Show {
        /// Exact account name
        name: String,
        #[arg(long)]
        json: bool,
    },
    /// Exchange a setup token for an access URL
    Claim {
        /// Falls back to the SETUP_TOKEN environment variable
        setup_token: Option<String>,
    },
    /// Show current configuration
    Config,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .init();
    } else {
        tracing_subscriber::registry().with(filter).with(layer).init();
    }
}

fn load_config(path: &Path) -> Result<ResolvedConfig> {
    ResolvedConfig::load_or_default(path)
        .with_context(|| format!("Failed to load config: {}", path.display()))
}

fn open_storage(config: &ResolvedConfig) -> Result<Arc<dyn Storage>> {
    let storage = SqliteStorage::open(&config.database_path, config.busy_timeout)
        .with_context(|| format!("Failed to open {}", config.database_path.display()))?;
    Ok(Arc::new(storage))
}

fn simplefin_client(config: &ResolvedConfig) -> Result<SimpleFinClient> {
    let access_url = config.require_access_url()?;
    Ok(SimpleFinClient::new(access_url, config.simplefin.clone())?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config_path = cli.config.unwrap_or_else(default_config_path);

    match cli.command {
        Command::Sync { refresh } => {
            let config = load_config(&config_path)?;
            let cache = SnapshotCache::new(&config.cache_path);
            let mode = if refresh {
                LoadMode::Refresh
            } else {
                LoadMode::PreferCache
            };
            let source: Arc<dyn AccountSource> =
                if mode == LoadMode::PreferCache && cache.exists().await? {
                    Arc::new(OfflineSource)
                } else {
                    Arc::new(simplefin_client(&config)?)
                };

            let service = SyncService::new(
                source,
                cache,
                open_storage(&config)?,
                config.tracked.clone(),
            )
            .with_conflict_policy(config.sync.transaction_conflict);
            let report = service.sync(mode).await?;
            println!("{}", to_pretty_json(&report)?);
            if !report.is_clean() {
                anyhow::bail!("{} account(s) failed to store", report.failures.len());
            }
        }
        Command::Fetch => {
            let config = load_config(&config_path)?;
            let cache = SnapshotCache::new(&config.cache_path);
            let client = simplefin_client(&config)?;
            let set = load_or_fetch(&client, &cache, LoadMode::Refresh).await?;
            println!(
                "Fetched {} accounts ({} transactions) into {}",
                set.accounts.len(),
                set.transaction_count(),
                cache.path().display()
            );
        }
        Command::Accounts { json } => {
            let config = load_config(&config_path)?;
            let service = AccountService::new(open_storage(&config)?);
            let accounts = service.list_accounts().await?;
            if json {
                println!("{}", to_pretty_json(&accounts)?);
            } else {
                for account in &accounts {
                    print!("{}", account_summary(account, &config.display));
                }
            }
        }
        Command::Show { name, json } => {
            let config = load_config(&config_path)?;
            let service = AccountService::new(open_storage(&config)?);
            let account = service.get_account_by_name(&name).await?;
            let account = service.get_account_transactions(account).await?;
            if json {
                println!("{}", to_pretty_json(&account)?);
            } else {
                print!("{}", account_summary(&account, &config.display));
            }
        }
        Command::Claim { setup_token } => {
            let token = setup_token
                .or_else(|| std::env::var("SETUP_TOKEN").ok())
                .context("No setup token given. Pass one or set SETUP_TOKEN.")?;
            let config = load_config(&config_path)?;
            let client = claim_client(&config.simplefin)?;
            let access_url = claim_access_url(&client, &token).await?;
            println!("{}", access_url.expose_secret());
        }
        Command::Config => {
            let config = load_config(&config_path)?;
            println!("Config file: {}", config_path.display());
            println!("Data directory: {}", config.data_dir.display());
            println!("Database: {}", config.database_path.display());
            println!("Snapshot: {}", config.cache_path.display());
            println!(
                "Access URL: {}",
                if config.access_url.is_some() {
                    "set"
                } else {
                    "not set"
                }
            );
            println!("Tracked names: {:?}", config.tracked.names);
            if !config.tracked.ids.is_empty() {
                println!("Tracked ids: {:?}", config.tracked.ids);
            }
        }
    }

    Ok(())
}

/// Stand-in source when a snapshot is present, so `sync` works without an
/// access URL.
struct OfflineSource;

#[async_trait::async_trait]
impl AccountSource for OfflineSource {
    fn name(&self) -> &str {
        "offline"
    }

    async fn fetch_accounts(&self) -> budget_tool::Result<AccountSet> {
        Err(budget_tool::Error::Config(
            "No SimpleFIN access URL configured".to_string(),
        ))
    }
}
