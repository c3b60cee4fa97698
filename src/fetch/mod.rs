//! Streaming HTTP fetches for resolved data files.

mod client;
mod error;
mod filename;

pub use client::{CONNECT_TIMEOUT_SECS, FetchClient, FetchOutcome, READ_TIMEOUT_SECS};
pub use error::FetchError;
pub use filename::file_name_for_url;
