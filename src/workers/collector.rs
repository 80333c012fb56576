use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::api::PollClient;
use crate::engine::process_snapshot;
use crate::error::{CollectorError, Result};
use crate::models::SnapshotRecord;
use crate::schedule::{ScheduleWindow, WindowStatus};
use crate::store::SnapshotHistory;

/// Number of teams echoed in the per-cycle summary
const SUMMARY_TOP_TEAMS: usize = 3;

/// Outcome counts for one collector session
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSummary {
    pub collected: usize,
    pub failed: usize,
}

/// Worker that periodically snapshots the poll into the history file
pub struct CollectorWorker {
    client: PollClient,
    history: SnapshotHistory,
    interval: Duration,
    window: Option<ScheduleWindow>,
    cancel: CancellationToken,
}

impl CollectorWorker {
    /// Create a new collector worker
    pub fn new(
        client: PollClient,
        history: SnapshotHistory,
        interval_minutes: u64,
        window: Option<ScheduleWindow>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            history,
            interval: Duration::from_secs(interval_minutes.saturating_mul(60)),
            window,
            cancel,
        }
    }

    /// Run until cancelled or until the schedule window closes
    pub async fn run(&self) -> CollectionSummary {
        let summary = match &self.window {
            Some(window) => self.run_scheduled(window).await,
            None => self.run_continuous().await,
        };

        info!(
            "Collection session complete: {} snapshots collected, {} cycles skipped",
            summary.collected, summary.failed
        );
        summary
    }

    /// Collect immediately, then on every interval tick
    async fn run_continuous(&self) -> CollectionSummary {
        info!("Collector started in continuous mode (interval: {:?})", self.interval);

        let mut summary = CollectionSummary::default();
        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            self.cycle(&mut summary).await;
        }

        summary
    }

    /// Collect only while inside the configured window
    async fn run_scheduled(&self, window: &ScheduleWindow) -> CollectionSummary {
        info!(
            "Collector started in scheduled mode: {} -> {} (interval: {:?})",
            window.start().format("%Y-%m-%d %H:%M:%S %Z"),
            window.end().format("%Y-%m-%d %H:%M:%S %Z"),
            self.interval
        );

        let mut summary = CollectionSummary::default();

        while !self.cancel.is_cancelled() {
            match window.status(Utc::now()) {
                WindowStatus::NotStarted { until } => {
                    info!(
                        "Waiting for schedule start: {} ({} seconds)",
                        window.start().format("%Y-%m-%d %H:%M:%S %Z"),
                        until.as_secs()
                    );
                    if !self.sleep(until).await {
                        break;
                    }
                }
                WindowStatus::Ended => {
                    info!(
                        "Schedule window ended at {}",
                        window.end().format("%Y-%m-%d %H:%M:%S %Z")
                    );
                    break;
                }
                WindowStatus::Open => {
                    self.cycle(&mut summary).await;

                    let next_run = match next_run_after(Utc::now(), self.interval) {
                        Some(next_run) if window.contains(next_run) => next_run,
                        _ => {
                            info!("Schedule window will end before next collection - stopping");
                            break;
                        }
                    };

                    info!(
                        "Next collection at {} (waiting {} seconds)",
                        next_run.with_timezone(&window.start().timezone()).format("%H:%M:%S %Z"),
                        self.interval.as_secs()
                    );
                    if !self.sleep(self.interval).await {
                        break;
                    }
                }
            }
        }

        summary
    }

    /// Sleep unless cancelled first; returns false on cancellation
    async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = time::sleep(duration) => true,
        }
    }

    /// One cycle; failures are logged and the cycle skipped
    async fn cycle(&self, summary: &mut CollectionSummary) {
        match self.collect_once().await {
            Ok(_) => summary.collected += 1,
            Err(CollectorError::InvalidPayload(reason)) => {
                summary.failed += 1;
                warn!("No snapshot produced ({}), skipping cycle", reason);
            }
            Err(e) => {
                summary.failed += 1;
                error!("Collection failed: {}", e);
                warn!("Will retry on next interval");
            }
        }
    }

    /// Fetch and process one snapshot without storing it
    pub async fn fetch_snapshot(&self) -> Result<SnapshotRecord> {
        let raw = self.client.fetch_poll().await?;
        process_snapshot(&raw, self.client.url(), Utc::now())
    }

    /// Fetch, process and append one snapshot
    pub async fn collect_once(&self) -> Result<SnapshotRecord> {
        info!("Collecting snapshot...");

        let record = self.fetch_snapshot().await?;
        self.history.append(&record).await?;

        log_summary(&record);
        Ok(record)
    }
}

/// `None` when the interval cannot be represented as a future instant
fn next_run_after(now: DateTime<Utc>, interval: Duration) -> Option<DateTime<Utc>> {
    let delta = TimeDelta::from_std(interval).ok()?;
    now.checked_add_signed(delta)
}

/// Leader and top-team overview of a stored snapshot
pub fn log_summary(record: &SnapshotRecord) {
    info!(
        "Snapshot complete: {} teams, {} votes",
        record.event_info.total_teams, record.event_info.total_votes_at_snapshot
    );

    if let Some(leader) = record.leader() {
        info!(
            "Leader (Rank {}): {} ({:.1}%, {} votes)",
            leader.rank,
            leader.team_identifier.as_deref().unwrap_or("?"),
            leader.current_vote_percentage,
            leader.vote_count
        );
    }

    if record.teams.len() > 1 {
        for (i, team) in record.teams.iter().take(SUMMARY_TOP_TEAMS).enumerate() {
            info!(
                "  {}. Rank {}: {} ({} votes, {:.1}%)",
                i + 1,
                team.rank,
                team.team_identifier.as_deref().unwrap_or("?"),
                team.vote_count,
                team.current_vote_percentage
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::parse_timezone;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve `responses` one connection at a time, then stop
    async fn serve(responses: Vec<(u16, String)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });

        format!("http://{}/polls/270619", addr)
    }

    async fn worker(
        url: &str,
        dir: &std::path::Path,
        window: Option<ScheduleWindow>,
        cancel: CancellationToken,
    ) -> CollectorWorker {
        let client = PollClient::new(url, Duration::from_secs(5)).unwrap();
        let history = SnapshotHistory::open(dir, "history.json").await.unwrap();
        CollectorWorker::new(client, history, 30, window, cancel)
    }

    fn poll_body() -> String {
        json!({
            "poll": {
                "id": 270619,
                "sport": "mlb",
                "options": [
                    { "id": 1, "label": "NYY", "odds": "+150", "count": 20 },
                    { "id": 2, "label": "BOS", "odds": "-200", "count": 50 }
                ]
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_collect_once_appends() {
        let dir = tempfile::tempdir().unwrap();
        let url = serve(vec![(200, poll_body())]).await;
        let worker = worker(&url, dir.path(), None, CancellationToken::new()).await;

        let record = worker.collect_once().await.unwrap();
        assert_eq!(record.collection_info.api_url, url);
        assert_eq!(record.leader().unwrap().team_identifier.as_deref(), Some("BOS"));

        let stored = worker.history.load().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0]["teams"][0]["team_identifier"], "BOS");
    }

    #[tokio::test]
    async fn test_failed_cycles_append_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let url = serve(vec![
            (500, "upstream down".to_string()),
            (200, json!({ "poll": { "options": [] } }).to_string()),
        ])
        .await;
        let worker = worker(&url, dir.path(), None, CancellationToken::new()).await;

        assert!(matches!(
            worker.collect_once().await,
            Err(CollectorError::Api { status: 500, .. })
        ));
        assert!(matches!(
            worker.collect_once().await,
            Err(CollectorError::InvalidPayload(_))
        ));
        assert!(worker.history.load().await.unwrap().is_empty());
    }

    #[test]
    fn test_next_run_after_handles_huge_intervals() {
        let now = chrono::TimeZone::with_ymd_and_hms(&Utc, 2025, 8, 11, 22, 0, 0).unwrap();

        assert_eq!(
            next_run_after(now, Duration::from_secs(30 * 60)),
            Some(now + TimeDelta::minutes(30))
        );
        assert_eq!(next_run_after(now, Duration::from_secs(u64::MAX)), None);
    }

    #[tokio::test]
    async fn test_huge_interval_does_not_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let client = PollClient::new("http://127.0.0.1:9/unused", Duration::from_secs(5)).unwrap();
        let history = SnapshotHistory::open(dir.path(), "history.json").await.unwrap();

        let worker = CollectorWorker::new(client, history, u64::MAX, None, CancellationToken::new());
        assert_eq!(worker.interval, Duration::from_secs(u64::MAX));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let worker = worker("http://127.0.0.1:9/unused", dir.path(), None, cancel).await;
        assert_eq!(worker.run().await, CollectionSummary::default());
    }

    #[tokio::test]
    async fn test_ended_window_stops_without_collecting() {
        let dir = tempfile::tempdir().unwrap();
        let window =
            ScheduleWindow::parse("1/1", "1:00 AM", "1/1", "2:00 AM", parse_timezone("UTC").unwrap(), 2000)
                .unwrap();

        let worker = worker("http://127.0.0.1:9/unused", dir.path(), Some(window), CancellationToken::new()).await;
        assert_eq!(worker.run().await, CollectionSummary::default());
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_for_window() {
        let dir = tempfile::tempdir().unwrap();
        let window =
            ScheduleWindow::parse("1/1", "1:00 AM", "1/1", "2:00 AM", parse_timezone("UTC").unwrap(), 2999)
                .unwrap();
        let cancel = CancellationToken::new();

        let worker = worker("http://127.0.0.1:9/unused", dir.path(), Some(window), cancel.clone()).await;
        let handle = tokio::spawn(async move { worker.run().await });

        cancel.cancel();
        let summary = time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary, CollectionSummary::default());
    }
}
