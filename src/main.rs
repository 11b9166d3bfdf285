//! Powerwatch monitor
//!
//! Run with: cargo run
//!
//! Configuration is read from the environment, optionally seeded from a
//! `.env` file in the working directory. See `powerwatch::config` for the
//! full list of variables. RUST_LOG sets the log level (default: info).

use std::sync::Arc;

use powerwatch::config::{load_dotenv, DotenvStatus, MonitorConfig};
use powerwatch::monitor::Monitor;
use powerwatch::notify::{LogTransport, NotificationTransport, TwitterClient};
use powerwatch::storage::{InfluxGateway, TimeSeriesGateway};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "powerwatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Powerwatch startup failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    match load_dotenv(None) {
        DotenvStatus::Loaded => tracing::info!("Loaded .env file"),
        DotenvStatus::NotFound => tracing::warn!("No .env file found"),
        DotenvStatus::Invalid(reason) => {
            tracing::warn!(error = %reason, "Failed to parse .env file")
        }
    }

    let config = MonitorConfig::from_env()?;

    tracing::info!("Powerwatch configuration:");
    tracing::info!("  InfluxDB: {} (org {})", config.influx.base_url, config.influx.org);
    tracing::info!(
        "  Sensor: bucket {}, measurement {}, window {:?}",
        config.influx.bucket_power,
        config.influx.sensor_measurement,
        config.influx.sensor_window
    );
    tracing::info!("  Notification log: bucket {}", config.influx.bucket_events);
    tracing::info!("  Poll interval: {:?}", config.poll_interval);
    tracing::info!("  Call timeout: {:?}", config.call_timeout);
    tracing::info!("  Time zone: {}", config.timezone.name());

    let gateway = InfluxGateway::new(config.influx.clone(), config.call_timeout)?;
    if let Err(e) = gateway.ping().await {
        tracing::warn!(error = %e, "InfluxDB did not answer ping, continuing");
    }

    let transport: Arc<dyn NotificationTransport> = match &config.twitter {
        Some(credentials) if !config.dry_run => {
            let client = TwitterClient::new(credentials.clone(), config.call_timeout)?;
            // No point polling if nothing can ever be posted
            let user = client.verify_credentials().await?;
            tracing::info!("  Posting as: @{} ({})", user.username, user.name);
            Arc::new(client)
        }
        _ => {
            tracing::info!("  Dry run: notifications are only logged");
            Arc::new(LogTransport::new())
        }
    };

    let gateway: Arc<dyn TimeSeriesGateway> = Arc::new(gateway);
    let monitor = Monitor::new(&config, gateway, transport);

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received");
            on_signal.cancel();
        }
    });

    monitor.run(shutdown).await;
    Ok(())
}
