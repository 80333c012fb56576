use thiserror::Error;

/// Failures that cause a whole collection cycle to be skipped
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("HTTP request error: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Poll API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Invalid poll payload: {0}")]
    InvalidPayload(String),

    #[error("History store error: {0}")]
    Store(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CollectorError>;

/// Problems with the configured collection window
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid schedule date '{0}' (expected M/D)")]
    InvalidDate(String),

    #[error("Invalid schedule time '{0}' (expected H:MM AM/PM or HH:MM)")]
    InvalidTime(String),

    #[error("Unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("Local time {0} does not exist in the schedule timezone")]
    NonexistentLocalTime(String),
}
