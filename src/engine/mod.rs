//! Snapshot processing: raw poll payload in, ranked `SnapshotRecord` out.
//!
//! Pure and deterministic: the snapshot time is passed in, nothing here
//! performs I/O or reads the clock.

pub mod differential;
pub mod features;
pub mod normalizer;
pub mod ranking;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::models::{CollectionInfo, EventInfo, SnapshotRecord, DATA_FORMAT_VERSION};

pub use differential::annotate_differentials;
pub use features::{derive, implied_probability, parse_american_odds, parse_lock_time};
pub use normalizer::normalize;
pub use ranking::assign_ranks;

/// Sport tag used when the poll carries none
const UNKNOWN_SPORT: &str = "unknown";

/// Build a snapshot record from a raw payload.
///
/// Fails only when the payload has no usable option list; malformed odds
/// or lock times degrade the affected team and nothing else.
pub fn process_snapshot(
    raw: &Value,
    source_url: &str,
    snapshot_time: DateTime<Utc>,
) -> Result<SnapshotRecord> {
    let poll = normalize(raw)?;
    let derived = derive(&poll.options, snapshot_time);
    let teams = annotate_differentials(assign_ranks(derived.teams));

    debug!(
        "Processed poll {} with {} teams ({} votes)",
        poll.id,
        teams.len(),
        derived.total_votes
    );

    let timestamp = snapshot_time.to_rfc3339();

    Ok(SnapshotRecord {
        collection_info: CollectionInfo {
            api_url: source_url.to_string(),
            collection_time: timestamp.clone(),
            data_format_version: DATA_FORMAT_VERSION.to_string(),
        },
        event_info: EventInfo {
            date: snapshot_time.date_naive().to_string(),
            total_teams: teams.len(),
            sport: poll.sport.unwrap_or_else(|| UNKNOWN_SPORT.to_string()),
            snapshot_timestamp: timestamp,
            poll_id: poll.id,
            is_daily_dog: poll.additional_info.is_daily_dog,
            total_votes_at_snapshot: derived.total_votes,
            first_game_start_time: derived.first_lock_time.map(|t| t.to_rfc3339()),
        },
        teams,
    })
}

/// Round half away from zero to `places` decimals
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
