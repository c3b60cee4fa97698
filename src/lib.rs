//! Gwdata Plugin Core Library
//!
//! This library implements an HTCondor file transfer plugin for
//! gravitational-wave frame data. A `gwdata://` locator URL names a
//! discovery endpoint plus an observatory, frame type and GPS interval; the
//! plugin resolves it to concrete frame-file URLs, downloads each file into
//! the job sandbox and reports one result ClassAd per file.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`classad`] - Minimal ClassAd parsing and unparsing for the plugin protocol
//! - [`locator`] - `gwdata://` locator parsing and frame-file discovery
//! - [`fetch`] - HTTP download of individual frame files
//! - [`manifest`] - LAL/frame cache manifest generation
//! - [`pipeline`] - Per-request orchestration and result records
//! - [`batch`] - Input/output file handling over a whole request batch

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod classad;
pub mod fetch;
pub mod locator;
pub mod manifest;
pub mod pipeline;
mod user_agent;

// Re-export commonly used types
pub use batch::{BatchError, BatchRunner};
pub use classad::{ClassAd, ClassAdError, Value, parse_ads};
pub use fetch::{FetchClient, FetchError, FetchOutcome};
pub use locator::{DataQuery, LocatorClient, LocatorError};
pub use pipeline::{
    ErrorRecord, OutputRecord, PipelineConfig, PipelineReport, TRANSFER_PROTOCOL, TransferPipeline,
    TransferResult,
};
