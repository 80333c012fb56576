use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Version stamped into every record's `collection_info`
pub const DATA_FORMAT_VERSION: &str = "1.1";

/// One point-in-time capture of the poll, ranked and cross-referenced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub collection_info: CollectionInfo,
    pub event_info: EventInfo,
    /// Sorted by rank ascending (leader first)
    pub teams: Vec<TeamRecord>,
}

impl SnapshotRecord {
    /// First team in rank order
    pub fn leader(&self) -> Option<&TeamRecord> {
        self.teams.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    /// Endpoint the raw payload came from
    pub api_url: String,
    /// RFC 3339 UTC timestamp
    pub collection_time: String,
    pub data_format_version: String,
}

/// Snapshot-level aggregates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventInfo {
    /// Calendar date (UTC) of the snapshot, `YYYY-MM-DD`
    pub date: String,
    pub total_teams: usize,
    pub sport: String,
    pub snapshot_timestamp: String,
    pub poll_id: Value,
    pub is_daily_dog: bool,
    pub total_votes_at_snapshot: i64,
    /// Earliest parseable lock time across all teams
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_game_start_time: Option<String>,
}

/// Derived per-team statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub team_id: Value,
    pub team_identifier: Option<String>,
    pub american_odds: Option<String>,

    /// Share of all votes, 0-100, two decimals
    pub current_vote_percentage: f64,
    pub vote_count: i64,

    /// API-supplied priority, kept for reference; never used as rank
    pub original_priority: i64,

    pub game_id: Value,
    pub team_db_id: Value,
    pub multiplier: f64,
    pub is_locked: bool,
    pub game_lock_time: Option<String>,

    /// Odds-implied win probability, 0-1, four decimals
    pub implied_win_probability: f64,

    /// Signed hours from snapshot to lock; negative once locked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_until_game_starts: Option<f64>,

    /// Competition rank by vote count, 1-based, ties share a rank
    pub rank: usize,
    /// (rank - 1) / team count, four decimals
    pub rank_percentile: f64,

    pub votes_behind_leader: i64,
    pub percentage_behind_leader: f64,
}
