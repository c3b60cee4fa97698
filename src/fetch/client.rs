//! HTTP client for fetching resolved data files.
//!
//! Frame files run from megabytes to gigabytes, so response bodies are
//! streamed to disk rather than buffered. Every fetch produces a
//! [`FetchOutcome`] carrying the timing and byte counts the result record
//! needs, whether or not the transfer succeeded.

use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

use crate::user_agent::plugin_user_agent;

use super::error::FetchError;
use super::filename::file_name_for_url;

/// Connect timeout for data requests, in seconds.
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Read timeout for data requests, in seconds. Five minutes, because frame
/// files are large and observatory mirrors can be slow.
pub const READ_TIMEOUT_SECS: u64 = 300;

/// What one fetch attempt did.
///
/// Timing fields are always populated. On failure `bytes_written` reports 0
/// and `error` holds the cause; the destination file is left in place for the
/// invoking orchestrator to clean up with the rest of the sandbox.
#[derive(Debug)]
pub struct FetchOutcome {
    /// Local file name the fetch wrote (empty when no name could be derived).
    pub file_name: String,
    /// Bytes streamed to disk.
    pub bytes_written: u64,
    /// Unix time the fetch began.
    pub started_unix: i64,
    /// Unix time the fetch finished.
    pub finished_unix: i64,
    /// Wall-clock seconds spent on the attempt.
    pub connection_seconds: f64,
    /// The failure, when the attempt did not complete.
    pub error: Option<FetchError>,
}

impl FetchOutcome {
    /// Whether the fetch completed without error.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// HTTP client for streaming file downloads.
///
/// Designed to be created once and reused across a batch, taking advantage
/// of connection pooling.
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: Client,
}

impl FetchClient {
    /// Creates a client with default timeouts.
    ///
    /// # Panics
    ///
    /// Panics if the underlying HTTP client cannot be constructed, which only
    /// happens when the TLS backend fails to initialize.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the underlying HTTP client cannot be constructed with the
    /// supplied timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(plugin_user_agent())
            .build()
            .expect("failed to build data HTTP client with static configuration");
        Self { client }
    }

    /// Downloads `url` into `output_dir`, naming the file after the final URL
    /// path segment.
    ///
    /// Never fails outright: errors are folded into the returned outcome so
    /// the caller can record them alongside the timing statistics.
    pub async fn fetch(&self, url: &str, output_dir: &Path) -> FetchOutcome {
        let started_unix = unix_seconds(SystemTime::now());
        let stopwatch = Instant::now();

        let (file_name, result) = match file_name_for_url(url) {
            Ok(name) => {
                let path = output_dir.join(&name);
                let result = self.transfer(url, &path).await;
                (name, result)
            }
            Err(e) => (String::new(), Err(e)),
        };

        let connection_seconds = stopwatch.elapsed().as_secs_f64();
        let finished_unix = unix_seconds(SystemTime::now());
        match &result {
            Ok(bytes) => info!(url = %url, bytes, "download complete"),
            Err(error) => warn!(url = %url, error = %error, "download failed"),
        }
        FetchOutcome {
            file_name,
            bytes_written: result.as_ref().copied().unwrap_or(0),
            started_unix,
            finished_unix,
            connection_seconds,
            error: result.err(),
        }
    }

    async fn transfer(&self, url: &str, path: &Path) -> Result<u64, FetchError> {
        debug!(url = %url, path = %path.display(), "starting download");

        // The destination is created before the request goes out, so even a
        // failed attempt leaves a (possibly empty) file the orchestrator can
        // account for.
        let file = File::create(path)
            .await
            .map_err(|e| FetchError::io(path, e))?;

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(url)
            } else {
                FetchError::network(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        let mut writer = BufWriter::new(file);
        let mut stream = response.bytes_stream();
        let mut bytes_written: u64 = 0;
        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| FetchError::network(url, e))?;
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| FetchError::io(path, e))?;
            bytes_written += chunk.len() as u64;
        }
        writer.flush().await.map_err(|e| FetchError::io(path, e))?;

        Ok(bytes_written)
    }
}

impl Default for FetchClient {
    fn default() -> Self {
        Self::new()
    }
}

fn unix_seconds(now: SystemTime) -> i64 {
    now.duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}
