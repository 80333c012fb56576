use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dotd_collector::api::PollClient;
use dotd_collector::config::Config;
use dotd_collector::store::SnapshotHistory;
use dotd_collector::workers::{log_summary, CollectorWorker};

#[derive(Debug, Default, PartialEq, Eq)]
struct Flags {
    /// Skip appending to the history file
    no_save: bool,
    /// Write the snapshot as JSON to stdout
    print: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "collect_once=info,dotd_collector=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().collect();
    let flags = parse_flags(&args)?;

    let config = Config::from_env()?;

    let client = PollClient::new(
        &config.poll_api_url,
        Duration::from_secs(config.request_timeout_secs),
    )?;
    let history = SnapshotHistory::open(&config.output_dir, &config.history_file)
        .await
        .context("Failed to open snapshot history")?;

    let worker = CollectorWorker::new(
        client,
        history,
        config.collection_interval_minutes,
        None,
        CancellationToken::new(),
    );

    let record = if flags.no_save {
        info!("Collecting snapshot without saving");
        let record = worker.fetch_snapshot().await.context("Collection failed")?;
        log_summary(&record);
        record
    } else {
        worker.collect_once().await.context("Collection failed")?
    };

    if flags.print {
        let json = serde_json::to_string_pretty(&record)?;
        println!("{}", json);
    }

    Ok(())
}

fn parse_flags(args: &[String]) -> Result<Flags> {
    let mut flags = Flags::default();

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--no-save" => flags.no_save = true,
            "--print" => flags.print = true,
            other => anyhow::bail!("Unknown argument '{}' (expected --no-save or --print)", other),
        }
    }

    Ok(flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("collect_once")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_flags() {
        assert_eq!(parse_flags(&args(&[])).unwrap(), Flags::default());
        assert_eq!(
            parse_flags(&args(&["--print", "--no-save"])).unwrap(),
            Flags {
                no_save: true,
                print: true
            }
        );
        assert!(parse_flags(&args(&["--verbose"])).is_err());
    }
}
