use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dotd_collector::api::PollClient;
use dotd_collector::config::Config;
use dotd_collector::schedule::{parse_timezone, ScheduleWindow};
use dotd_collector::store::SnapshotHistory;
use dotd_collector::workers::CollectorWorker;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dotd_collector=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting dotd-collector");

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded");

    let window = match &config.schedule {
        Some(schedule) => {
            let tz = parse_timezone(&config.schedule_timezone)?;
            let year = Utc::now().with_timezone(&tz).year();
            Some(
                ScheduleWindow::parse(
                    &schedule.start_date,
                    &schedule.start_time,
                    &schedule.end_date,
                    &schedule.end_time,
                    tz,
                    year,
                )
                .context("Invalid schedule window")?,
            )
        }
        None => None,
    };

    let history = SnapshotHistory::open(&config.output_dir, &config.history_file)
        .await
        .context("Failed to open snapshot history")?;
    info!("Output file: {}", history.path().display());

    let client = PollClient::new(
        &config.poll_api_url,
        Duration::from_secs(config.request_timeout_secs),
    )?;
    info!("API URL: {}", client.url());

    let cancel = CancellationToken::new();
    let worker = CollectorWorker::new(
        client,
        history,
        config.collection_interval_minutes,
        window,
        cancel.clone(),
    );

    let mut collector_handle = tokio::spawn(async move { worker.run().await });

    // Wait for shutdown signal or for the schedule to finish
    let finished = tokio::select! {
        signal = shutdown_signal() => {
            signal?;
            None
        }
        result = &mut collector_handle => Some(result),
    };

    let summary = match finished {
        Some(result) => result,
        None => {
            info!("Shutdown signal received");
            cancel.cancel();
            collector_handle.await
        }
    };

    match summary {
        Ok(summary) => info!(
            "Total snapshots collected: {} (data saved in {})",
            summary.collected,
            config.output_dir.display()
        ),
        Err(e) => error!("Collector exited unexpectedly: {:?}", e),
    }

    info!("Shutting down dotd-collector");
    Ok(())
}

/// Resolve on Ctrl+C, or on SIGTERM where available
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

        tokio::select! {
            result = tokio::signal::ctrl_c() => result.context("Failed to listen for Ctrl+C")?,
            _ = sigterm.recv() => info!("Received SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl+C")?;
    }

    Ok(())
}
