pub mod poll_client;

pub use poll_client::PollClient;
