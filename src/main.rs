mod config;
mod db;
mod kafka;
mod models;
mod ports;
mod processor;
mod scheduler;
mod stations;
mod upstream;

use config::AppConfig;
use db::PgAlertStore;
use kafka::KafkaNotifier;
use processor::alert_engine::AlertEngine;
use stations::StationDirectory;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use upstream::HttpAvailabilityClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load config
    let config = AppConfig::load()?;

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .init();

    info!("Starting Seat Alerts Service...");

    let stations = StationDirectory::load(&config.stations_file)?;
    info!("Loaded {} stations from {}", stations.len(), config.stations_file);

    // Init DB
    let pool = db::init_pool(&config.database_url, config.db_max_connections).await?;
    info!("Connected to database");

    let availability = HttpAvailabilityClient::new(
        &config.availability_url,
        Duration::from_secs(config.availability_timeout_secs),
    )?;
    let notifier = Arc::new(KafkaNotifier::new(&config)?);

    let engine = AlertEngine::new(
        Arc::new(PgAlertStore::new(pool)),
        Arc::new(availability),
        notifier.clone(),
        Arc::new(stations),
        config.local_offset()?,
    );

    if config.run_once {
        scheduler::run_once(&engine).await;
    } else {
        scheduler::run_alert_checks(
            &engine,
            Duration::from_secs(config.alert_check_interval_secs),
        )
        .await?;
    }

    notifier.flush()?;
    info!("Seat Alerts Service stopped");
    Ok(())
}
