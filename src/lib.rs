//! Daily-dog betting poll collector.
//!
//! Fetches a poll snapshot, derives ranked per-team voting and odds
//! statistics, and appends the result to a JSON history file.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod schedule;
pub mod store;
pub mod workers;
