pub mod collector;

pub use collector::{log_summary, CollectionSummary, CollectorWorker};
