use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Poll object as served by the poll API (after unwrapping `poll`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPoll {
    /// Poll identifier (string or number depending on endpoint)
    #[serde(default)]
    pub id: Value,

    /// Sport tag, e.g. "mlb"
    #[serde(default, deserialize_with = "string_or_none")]
    pub sport: Option<String>,

    /// Candidate teams
    pub options: Vec<RawOption>,

    #[serde(default, deserialize_with = "or_default")]
    pub additional_info: PollAdditionalInfo,
}

/// Poll-level flags
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollAdditionalInfo {
    #[serde(default, deserialize_with = "or_default")]
    pub is_daily_dog: bool,
}

/// One team entry in the poll.
///
/// Only `count` is strictly typed. Every other field degrades to "absent"
/// or its default when the API sends the wrong type, so one bad option
/// never rejects the whole poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOption {
    #[serde(default)]
    pub id: Value,

    /// Display label (team name or abbreviation)
    #[serde(default, deserialize_with = "string_or_none")]
    pub label: Option<String>,

    /// American odds as sent; `None` only when the key is missing, so an
    /// explicit `null` or a number stays distinguishable and unparseable
    #[serde(default, deserialize_with = "present")]
    pub odds: Option<Value>,

    /// Votes received so far
    #[serde(default)]
    pub count: i64,

    /// Sort hint supplied by the API; informational only
    #[serde(default, deserialize_with = "or_default")]
    pub priority: i64,

    #[serde(default = "default_multiplier", deserialize_with = "multiplier_or_one")]
    pub multiplier: f64,

    #[serde(default, deserialize_with = "or_default")]
    pub is_locked: bool,

    /// ISO-8601 lock time, offset-qualified, `Z`-suffixed or naive
    #[serde(default, deserialize_with = "string_or_none")]
    pub locks_at: Option<String>,

    #[serde(default, deserialize_with = "or_default")]
    pub additional_info: OptionAdditionalInfo,
}

/// Cross-reference identifiers attached to an option
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionAdditionalInfo {
    #[serde(default)]
    pub game_id: Value,

    #[serde(default)]
    pub team_id: Value,

    #[serde(default, deserialize_with = "or_default")]
    pub is_daily_dog: bool,
}

fn default_multiplier() -> f64 {
    1.0
}

/// Keep whatever value was sent, `null` included
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Wrong type or `null` falls back to `T::default()`
fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_string))
}

fn multiplier_or_one<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().unwrap_or_else(default_multiplier))
}
