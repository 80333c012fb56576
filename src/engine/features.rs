use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::round_to;
use crate::models::{RawOption, TeamRecord};

/// Odds assumed when an option carries no odds string at all
const DEFAULT_ODDS: &str = "+100";

/// Offset-qualified layouts tried after RFC 3339
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M%:z"];

/// Naive layouts, interpreted as UTC
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OddsError {
    #[error("empty odds string")]
    Empty,

    #[error("odds '{0}' are not an integer")]
    NotAnInteger(String),

    #[error("odds {0} are not a string")]
    NotAString(Value),
}

/// Team features plus the aggregates the event info needs
#[derive(Debug, Clone)]
pub struct DerivedTeams {
    /// Unranked, in option order
    pub teams: Vec<TeamRecord>,
    pub total_votes: i64,
    pub first_lock_time: Option<DateTime<FixedOffset>>,
}

/// Parse an American odds string such as "+150" or "-200"
pub fn parse_american_odds(odds: &str) -> Result<i64, OddsError> {
    let trimmed = odds.trim();
    if trimmed.is_empty() {
        return Err(OddsError::Empty);
    }

    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    digits
        .parse::<i64>()
        .map_err(|_| OddsError::NotAnInteger(odds.to_string()))
}

/// Implied win probability of American odds, ignoring the bookmaker margin.
/// Zero is treated like a favourite line and yields 0.
pub fn implied_probability(odds: i64) -> f64 {
    if odds > 0 {
        100.0 / (odds as f64 + 100.0)
    } else {
        let magnitude = odds.unsigned_abs() as f64;
        magnitude / (magnitude + 100.0)
    }
}

/// Parse the odds field as sent; only a missing key falls back to "+100"
pub fn parse_odds_field(odds: Option<&Value>) -> Result<i64, OddsError> {
    match odds {
        None => parse_american_odds(DEFAULT_ODDS),
        Some(Value::String(odds)) => parse_american_odds(odds),
        Some(other) => Err(OddsError::NotAString(other.clone())),
    }
}

/// Implied probability rounded to four decimals; unparseable odds give 0.0
pub fn implied_probability_from_str(odds: &str) -> f64 {
    rounded_probability(parse_american_odds(odds))
}

fn rounded_probability(parsed: Result<i64, OddsError>) -> f64 {
    match parsed {
        Ok(value) => round_to(implied_probability(value), 4),
        Err(e) => {
            debug!("Unusable odds, implied probability set to 0: {}", e);
            0.0
        }
    }
}

/// Parse a lock timestamp.
///
/// Accepts RFC 3339 / ISO-8601 with an explicit offset, a `Z` suffix, or no
/// offset at all (taken as UTC). Empty or unparseable input yields `None`.
pub fn parse_lock_time(raw: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let normalized = match trimmed.strip_suffix(['Z', 'z']) {
        Some(base) => format!("{}+00:00", base),
        None => trimmed.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt);
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, fmt) {
            return Some(dt);
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Some(naive.and_utc().fixed_offset());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc().fixed_offset());
    }

    debug!("Unparseable lock time '{}'", raw);
    None
}

/// Signed hours between the snapshot and a lock time, two decimals
pub fn hours_until(lock_time: DateTime<FixedOffset>, snapshot_time: DateTime<Utc>) -> f64 {
    let millis = lock_time
        .signed_duration_since(snapshot_time)
        .num_milliseconds();
    round_to(millis as f64 / 3_600_000.0, 2)
}

/// Per-option vote share, implied probability and time-to-lock
pub fn derive(options: &[RawOption], snapshot_time: DateTime<Utc>) -> DerivedTeams {
    let total_votes: i64 = options.iter().map(|o| o.count).sum();

    let mut first_lock_time: Option<DateTime<FixedOffset>> = None;
    let mut teams = Vec::with_capacity(options.len());

    for option in options {
        let vote_percentage = if total_votes > 0 {
            option.count as f64 / total_votes as f64 * 100.0
        } else {
            0.0
        };

        let lock_time = option.locks_at.as_deref().and_then(parse_lock_time);
        if let Some(lock) = lock_time {
            first_lock_time = Some(match first_lock_time {
                Some(current) if current <= lock => current,
                _ => lock,
            });
        }

        teams.push(TeamRecord {
            team_id: option.id.clone(),
            team_identifier: option.label.clone(),
            american_odds: option
                .odds
                .as_ref()
                .and_then(Value::as_str)
                .map(str::to_string),
            current_vote_percentage: round_to(vote_percentage, 2),
            vote_count: option.count,
            original_priority: option.priority,
            game_id: option.additional_info.game_id.clone(),
            team_db_id: option.additional_info.team_id.clone(),
            multiplier: option.multiplier,
            is_locked: option.is_locked,
            game_lock_time: option.locks_at.clone(),
            implied_win_probability: rounded_probability(parse_odds_field(option.odds.as_ref())),
            hours_until_game_starts: lock_time.map(|lock| hours_until(lock, snapshot_time)),
            rank: 0,
            rank_percentile: 0.0,
            votes_behind_leader: 0,
            percentage_behind_leader: 0.0,
        });
    }

    DerivedTeams {
        teams,
        total_votes,
        first_lock_time,
    }
}
