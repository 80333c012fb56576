use serde::Deserialize;
use serde_json::Value;

use crate::error::{CollectorError, Result};
use crate::models::RawPoll;

/// Key some endpoints wrap the poll object in
const POLL_WRAPPER_KEY: &str = "poll";

/// Extract the canonical poll from either `{ "poll": {...} }` or the bare poll object
pub fn normalize(raw: &Value) -> Result<RawPoll> {
    let root = raw
        .as_object()
        .ok_or_else(|| invalid("payload is not a JSON object"))?;

    let poll = match root.get(POLL_WRAPPER_KEY) {
        Some(inner) => inner,
        None => raw,
    };

    let poll_object = poll
        .as_object()
        .ok_or_else(|| invalid("poll is not a JSON object"))?;

    if !poll_object.contains_key("options") {
        return Err(invalid("poll has no option list"));
    }

    let poll = RawPoll::deserialize(poll)
        .map_err(|e| CollectorError::InvalidPayload(format!("malformed poll: {}", e)))?;

    if poll.options.is_empty() {
        return Err(invalid("option list is empty"));
    }

    Ok(poll)
}

fn invalid(reason: &str) -> CollectorError {
    CollectorError::InvalidPayload(reason.to_string())
}
