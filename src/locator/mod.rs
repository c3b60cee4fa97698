//! Locator handling: `gwdata://` URL parsing and frame discovery queries.
//!
//! A transfer request arrives as a locator URL naming a discovery host and a
//! data selection. [`DataQuery`] validates the locator; [`LocatorClient`]
//! turns a validated query into the list of concrete file URLs to fetch.

mod client;
mod error;
mod query;

pub use client::LocatorClient;
pub use error::LocatorError;
pub use query::{DEFAULT_METADATA_FILE, DataQuery, LOCATOR_SCHEME};
