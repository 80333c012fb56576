pub mod poll;
pub mod snapshot;

pub use poll::{OptionAdditionalInfo, PollAdditionalInfo, RawOption, RawPoll};
pub use snapshot::{CollectionInfo, EventInfo, SnapshotRecord, TeamRecord, DATA_FORMAT_VERSION};
