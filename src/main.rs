//! Greenhouse daemon
//!
//! Connects the engine to its store and runs the daily reset on schedule.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use greenhouse::{
    config::Args,
    db::MongoClient,
    logging::RewardLogger,
    services::spawn_daily_reset_task,
    store::{GardenStore, InMemoryGardenStore, MongoGardenStore},
    Greenhouse,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("greenhouse={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }
    let config = args.engine_config()?;

    info!("======================================");
    info!("  Greenhouse - habit garden engine");
    info!("  \"Tend it and it shall grow\"");
    info!("======================================");
    info!(
        "Version: {} ({}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_COMMIT_SHORT"),
        env!("BUILD_TIMESTAMP")
    );
    info!("Node ID: {}", args.node_id);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {}", args.mongodb_uri);
    info!("Day offset: {} min, reset hour: {:02}:00", args.utc_offset_minutes, args.reset_hour);
    info!("Ownership: {:?}, max habits: {}", config.ownership, config.max_habits);
    info!("======================================");

    let store: Arc<dyn GardenStore> =
        match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
            Ok(client) => {
                info!("MongoDB connected successfully");
                Arc::new(
                    MongoGardenStore::new(&client)
                        .await
                        .context("failed to open collections")?,
                )
            }
            Err(e) => {
                if args.dev_mode {
                    warn!("MongoDB connection failed (dev mode, using in-memory store): {}", e);
                    Arc::new(InMemoryGardenStore::new())
                } else {
                    error!("MongoDB connection failed: {}", e);
                    std::process::exit(1);
                }
            }
        };

    let rewards = RewardLogger::new(args.node_id.to_string());
    if let Some(path) = &args.reward_log {
        rewards
            .init_file(path.clone())
            .await
            .with_context(|| format!("failed to open reward log {}", path.display()))?;
    }

    let engine = Greenhouse::new(store, config, rewards);

    if args.run_once {
        let summary = engine.run_daily_reset(Utc::now()).await?;
        info!("Reset summary: {}", serde_json::to_string(&summary)?);
        return Ok(());
    }

    if args.reset_on_startup {
        match engine.run_daily_reset(Utc::now()).await {
            Ok(summary) => info!("Startup reset: {} habits cleared", summary.habits_reset),
            Err(e) => warn!("Startup reset failed: {}", e),
        }
    }

    let reset_task = spawn_daily_reset_task(engine.daily_reset.clone());

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutdown signal received");
    reset_task.abort();

    Ok(())
}
