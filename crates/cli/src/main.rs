use std::sync::Arc;

use anyhow::Result;
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};

use signal_trade_broker::paper::PaperBroker;
use signal_trade_core::ConfigLoader;
use signal_trade_data::{signal_repo, DatabaseClient};
use signal_trade_executor::LifecycleController;
use signal_trade_interpreter::{ExtractionClient, InterpreterEngine};
use signal_trade_refdata::snapshot::ReferenceSnapshot;
use signal_trade_stops::StopEngine;

#[derive(Parser)]
#[command(name = "signal-trade")]
#[command(about = "Turns free-text trade alerts into protected broker positions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the lifecycle controller and stop engine loops
    Run {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Interpret one message and print the outcome without trading
    Interpret {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
        /// The raw alert text
        text: String,
    },
    /// Create the database schema if absent
    InitDb {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Insert a raw signal as if it arrived from the message feed
    SeedSignal {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
        /// Source channel id
        #[arg(long)]
        channel_id: i64,
        /// Message id, unique within the channel
        #[arg(long)]
        message_id: i64,
        /// The raw alert text
        text: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { config } => run_pipeline(&config).await?,
        Commands::Interpret { config, text } => run_interpret(&config, &text).await?,
        Commands::InitDb { config } => run_init_db(&config).await?,
        Commands::SeedSignal {
            config,
            channel_id,
            message_id,
            text,
        } => run_seed_signal(&config, channel_id, message_id, &text).await?,
    }

    Ok(())
}

fn load_snapshot(path: &str) -> ReferenceSnapshot {
    match ReferenceSnapshot::load_csv(path) {
        Ok(snapshot) => {
            tracing::info!(path, rows = snapshot.len(), "Reference snapshot loaded");
            snapshot
        }
        Err(e) => {
            tracing::warn!(
                path,
                error = %e,
                "Reference snapshot unavailable, resolving via calendar fallback only"
            );
            ReferenceSnapshot::empty()
        }
    }
}

fn build_interpreter(
    cfg: &signal_trade_core::config::ExtractionConfig,
) -> Result<InterpreterEngine> {
    let extraction = ExtractionClient::from_config(cfg)?;
    if extraction.is_some() {
        tracing::info!(model = %cfg.model, "Tier-2 extraction enabled");
    }
    Ok(InterpreterEngine::new(extraction))
}

async fn run_pipeline(config_path: &str) -> Result<()> {
    let config = ConfigLoader::load_from(config_path)?;

    let db = DatabaseClient::new(&config.database.url, config.database.max_connections).await?;
    db.ensure_schema().await?;
    let stops_db =
        DatabaseClient::new(&config.database.url, config.database.max_connections).await?;

    let snapshot = load_snapshot(&config.reference.snapshot_path);
    let interpreter = build_interpreter(&config.extraction)?;

    // The real execution service sits behind the BrokerClient seam; this
    // binary ships with the paper implementation wired in.
    let broker: Arc<PaperBroker> = Arc::new(PaperBroker::new());
    tracing::warn!("Paper broker in use, orders are simulated");

    let controller = LifecycleController::new(
        db,
        broker.clone(),
        interpreter,
        snapshot.clone(),
        config.executor.clone(),
    );
    let mut stop_engine = StopEngine::new(
        stops_db,
        broker,
        snapshot,
        config.stops.clone(),
        config.sessions.clone(),
    );

    let controller_handle = tokio::spawn(async move { controller.run().await });
    let stops_handle = tokio::spawn(async move { stop_engine.run().await });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Received Ctrl+C, shutting down");
    controller_handle.abort();
    stops_handle.abort();

    Ok(())
}

async fn run_interpret(config_path: &str, text: &str) -> Result<()> {
    let config = ConfigLoader::load_from(config_path)?;
    let snapshot = load_snapshot(&config.reference.snapshot_path);
    let interpreter = build_interpreter(&config.extraction)?;

    match interpreter
        .interpret(text, &snapshot, Local::now().date_naive())
        .await
    {
        Ok(resolved) => {
            println!("{}", serde_json::to_string_pretty(&resolved.intent)?);
            println!("instrument: {}", resolved.instrument.instrument_id);
            println!(
                "exchange: {}  lot_size: {}  tick: {}  expiry: {}",
                resolved.instrument.exchange,
                resolved.instrument.lot_size,
                resolved.instrument.tick_size,
                resolved.instrument.expiry
            );
        }
        Err(e) => {
            println!("outcome: {}", e.outcome());
            println!("detail: {e}");
        }
    }
    Ok(())
}

async fn run_init_db(config_path: &str) -> Result<()> {
    let config = ConfigLoader::load_from(config_path)?;
    let db = DatabaseClient::new(&config.database.url, config.database.max_connections).await?;
    db.ensure_schema().await?;
    tracing::info!("Schema ready");
    Ok(())
}

async fn run_seed_signal(
    config_path: &str,
    channel_id: i64,
    message_id: i64,
    text: &str,
) -> Result<()> {
    let config = ConfigLoader::load_from(config_path)?;
    let db = DatabaseClient::new(&config.database.url, config.database.max_connections).await?;
    db.ensure_schema().await?;

    match signal_repo::insert_signal(db.pool(), channel_id, message_id, text, Utc::now()).await? {
        Some(id) => tracing::info!(id, channel_id, message_id, "Signal stored"),
        None => tracing::info!(channel_id, message_id, "Signal already stored, skipped"),
    }
    Ok(())
}
