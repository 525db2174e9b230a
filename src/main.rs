//! Operator CLI for the draw engine.
//!
//! Usage:
//!   gacha-engine open-wallet <user>
//!   gacha-engine deposit <user> <paid> <free>
//!   gacha-engine draw <user> <pool> <count> [request-id]
//!   gacha-engine history <user> [limit]

use anyhow::Context;
use clap::{Parser, Subcommand};
use gacha_engine::{
    config::Config, init_db_with, CatalogItemMaster, DbOptions, DrawCoordinator, GachaError,
    PoolId, Repository, RequestId, UserId, WalletService,
};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "gacha-engine")]
#[command(about = "Gacha draw engine operator CLI")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Create a zero-balance wallet (no-op if it exists)
    OpenWallet {
        #[arg(value_parser = UserId::parse)]
        user: UserId,
    },

    /// Credit paid and free currency
    Deposit {
        #[arg(value_parser = UserId::parse)]
        user: UserId,
        paid: i64,
        free: i64,
    },

    /// Draw from a pool
    Draw {
        #[arg(value_parser = UserId::parse)]
        user: UserId,
        #[arg(value_parser = PoolId::parse)]
        pool: PoolId,
        /// Number of draws
        count: u32,
        /// Idempotency key; reuse it when retrying the same request
        #[arg(value_parser = RequestId::parse)]
        request_id: Option<RequestId>,
    },

    /// Show draw history, newest first
    History {
        #[arg(value_parser = UserId::parse)]
        user: UserId,
        /// Maximum number of records
        #[arg(default_value_t = 20, value_parser = clap::value_parser!(u32).range(1..))]
        limit: u32,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli.command).await {
        match e.downcast_ref::<GachaError>() {
            Some(err) => eprintln!("{} {}", err.kind.code(), err.message),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    let config = Config::from_env().context("Configuration error")?;
    let pool = init_db_with(&config.database_path, DbOptions::from(&config))
        .await
        .context("Failed to initialize database")?;
    let repo = Arc::new(Repository::new(pool));

    let output = match command {
        Commands::OpenWallet { user } => {
            let wallet = WalletService::new(repo).open_wallet(&user).await?;
            serde_json::to_string_pretty(&wallet)?
        }
        Commands::Deposit { user, paid, free } => {
            let wallet = WalletService::new(repo).deposit(&user, paid, free).await?;
            serde_json::to_string_pretty(&wallet)?
        }
        Commands::Draw {
            user,
            pool,
            count,
            request_id,
        } => {
            let items = repo.query_items().await?;
            let master = CatalogItemMaster::new(config.top_rarities.clone()).with_items(items);
            tracing::info!(items = master.len(), "Item master loaded");
            let coordinator = DrawCoordinator::from_config(repo, Arc::new(master), &config);
            let request_id = request_id.unwrap_or_else(RequestId::generate);
            let receipt = coordinator.draw(&user, &pool, count, request_id).await?;
            serde_json::to_string_pretty(&receipt)?
        }
        Commands::History { user, limit } => {
            let history = repo.query_history(&user, limit, 0).await?;
            serde_json::to_string_pretty(&history)?
        }
    };

    println!("{}", output);
    Ok(())
}
