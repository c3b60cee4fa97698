//! Per-request transfer pipeline.
//!
//! One locator URL flows through three stages: parse and validate the
//! locator, ask the discovery service for the file URLs it covers, then
//! fetch each file in order. A manifest is written afterwards when the
//! locator asked for one. The first failed fetch aborts the remaining files
//! in the request; resolution failures are captured as a single error record
//! instead.

mod records;

pub use records::{ErrorRecord, OutputRecord, TRANSFER_PROTOCOL, TransferResult};

use std::path::PathBuf;

use tracing::{info, warn};

use crate::fetch::{FetchClient, FetchOutcome};
use crate::locator::{DataQuery, LocatorClient};
use crate::manifest;

/// Explicit configuration for a pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory downloaded files and manifests are written to. The
    /// orchestrator invokes plugins inside the job sandbox, so this defaults
    /// to the current directory.
    pub download_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("."),
        }
    }
}

/// Everything one transfer request produced.
#[derive(Debug)]
pub struct PipelineReport {
    /// Result records in the order they should be written.
    pub records: Vec<OutputRecord>,
    /// Whether the whole request succeeded.
    pub success: bool,
}

impl PipelineReport {
    fn failed(record: ErrorRecord) -> Self {
        Self {
            records: vec![OutputRecord::Error(record)],
            success: false,
        }
    }
}

/// Resolve-and-fetch pipeline for single transfer requests.
pub struct TransferPipeline {
    locator: LocatorClient,
    fetcher: FetchClient,
    config: PipelineConfig,
}

impl TransferPipeline {
    /// Creates a pipeline from its two clients and configuration.
    #[must_use]
    pub fn new(locator: LocatorClient, fetcher: FetchClient, config: PipelineConfig) -> Self {
        Self {
            locator,
            fetcher,
            config,
        }
    }

    /// Runs the full resolve, fetch, manifest sequence for one locator URL.
    ///
    /// Always returns a report; failures are captured in its records. An
    /// interval no data matches (zero resolved URLs) is a success with no
    /// records.
    pub async fn run(&self, locator_url: &str) -> PipelineReport {
        let query = match DataQuery::parse(locator_url) {
            Ok(query) => query,
            Err(error) => {
                warn!(url = %locator_url, error = %error, "rejecting locator url");
                return PipelineReport::failed(ErrorRecord::new(error.to_string(), locator_url));
            }
        };

        let urls = match self.locator.find_urls(&query).await {
            Ok(urls) => urls,
            Err(error) => {
                warn!(url = %locator_url, error = %error, "discovery failed");
                return PipelineReport::failed(ErrorRecord::new(error.to_string(), locator_url));
            }
        };
        info!(url = %locator_url, files = urls.len(), "resolved transfer request");

        let mut records = Vec::with_capacity(urls.len());
        for file_url in &urls {
            let outcome = self.fetcher.fetch(file_url, &self.config.download_dir).await;
            let failed = !outcome.is_success();
            records.push(OutputRecord::Transfer(outcome_to_result(file_url, outcome)));
            if failed {
                // The remaining files in this request are not attempted.
                return PipelineReport {
                    records,
                    success: false,
                };
            }
        }

        if let Some(mode) = &query.cache {
            self.write_manifest(mode, &query, &urls);
        }

        PipelineReport {
            records,
            success: true,
        }
    }

    fn write_manifest(&self, mode: &str, query: &DataQuery, urls: &[String]) {
        let path = self.config.download_dir.join(&query.metadata_file);
        // Manifest problems are diagnosed in-band and logged; the downloaded
        // data is intact, so they never fail the request.
        if let Err(error) =
            manifest::write_manifest(mode, urls, query.end, &path, &self.config.download_dir)
        {
            warn!(path = %path.display(), error = %error, "manifest generation failed");
        }
    }
}

fn outcome_to_result(url: &str, outcome: FetchOutcome) -> TransferResult {
    let success = outcome.is_success();
    TransferResult {
        success,
        file_name: outcome.file_name,
        file_bytes: outcome.bytes_written,
        total_bytes: outcome.bytes_written,
        start_time: outcome.started_unix,
        end_time: outcome.finished_unix,
        connection_seconds: outcome.connection_seconds,
        url: url.to_string(),
        error: outcome.error.map(|e| e.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pipeline_for(temp_dir: &TempDir) -> TransferPipeline {
        TransferPipeline::new(
            LocatorClient::new(),
            FetchClient::new(),
            PipelineConfig {
                download_dir: temp_dir.path().to_path_buf(),
            },
        )
    }

    fn locator_for(server: &MockServer, suffix: &str) -> String {
        let endpoint = server.uri().strip_prefix("http://").unwrap().to_string();
        format!("gwdata://{endpoint}?observatory=H&type=H1_TEST&s=0&e=64{suffix}")
    }

    async fn mount_discovery(server: &MockServer, file_names: &[&str]) {
        let urls: Vec<String> = file_names
            .iter()
            .map(|name| format!("{}/frames/{name}", server.uri()))
            .collect();
        Mock::given(method("GET"))
            .and(path("/services/data/v1/gwf/H/H1_TEST/0,64/file.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(urls))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_run_fetches_every_resolved_file() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        mount_discovery(&mock_server, &["H-H1_TEST-0-32.gwf", "H-H1_TEST-32-32.gwf"]).await;
        Mock::given(method("GET"))
            .and(path("/frames/H-H1_TEST-0-32.gwf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"one"))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/frames/H-H1_TEST-32-32.gwf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"two"))
            .mount(&mock_server)
            .await;

        let report = pipeline_for(&temp_dir)
            .run(&locator_for(&mock_server, ""))
            .await;

        assert!(report.success);
        assert_eq!(report.records.len(), 2);
        assert!(report.records.iter().all(OutputRecord::is_success));
        assert!(temp_dir.path().join("H-H1_TEST-0-32.gwf").exists());
        assert!(temp_dir.path().join("H-H1_TEST-32-32.gwf").exists());
        // No manifest without a cache argument.
        assert!(!temp_dir.path().join("metadata.txt").exists());
    }

    #[tokio::test]
    async fn test_run_invalid_locator_yields_error_record() {
        let temp_dir = TempDir::new().unwrap();
        let report = pipeline_for(&temp_dir)
            .run("gwdata://h?type=T&s=0&e=64")
            .await;

        assert!(!report.success);
        assert_eq!(report.records.len(), 1);
        match &report.records[0] {
            OutputRecord::Error(record) => {
                assert!(record.error.contains("observatory"), "got: {}", record.error);
                assert_eq!(record.url, "gwdata://h?type=T&s=0&e=64");
            }
            other => panic!("expected error record, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_discovery_failure_yields_error_record() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let report = pipeline_for(&temp_dir)
            .run(&locator_for(&mock_server, ""))
            .await;

        assert!(!report.success);
        assert_eq!(report.records.len(), 1);
        match &report.records[0] {
            OutputRecord::Error(record) => {
                assert!(record.error.contains("500"), "got: {}", record.error);
            }
            other => panic!("expected error record, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_zero_resolved_urls_is_vacuous_success() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        mount_discovery(&mock_server, &[]).await;

        let report = pipeline_for(&temp_dir)
            .run(&locator_for(&mock_server, ""))
            .await;

        assert!(report.success);
        assert!(report.records.is_empty());
    }

    #[tokio::test]
    async fn test_run_aborts_after_first_failed_fetch() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        mount_discovery(
            &mock_server,
            &[
                "H-H1_TEST-0-32.gwf",
                "H-H1_TEST-32-32.gwf",
                "H-H1_TEST-64-32.gwf",
            ],
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/frames/H-H1_TEST-0-32.gwf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"one"))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/frames/H-H1_TEST-32-32.gwf"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;
        // The third file must never be requested.
        Mock::given(method("GET"))
            .and(path("/frames/H-H1_TEST-64-32.gwf"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let report = pipeline_for(&temp_dir)
            .run(&locator_for(&mock_server, ""))
            .await;

        assert!(!report.success);
        assert_eq!(report.records.len(), 2);
        assert!(report.records[0].is_success());
        assert!(!report.records[1].is_success());
    }

    #[tokio::test]
    async fn test_run_failed_fetch_skips_manifest() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        mount_discovery(&mock_server, &["H-H1_TEST-0-32.gwf"]).await;
        Mock::given(method("GET"))
            .and(path("/frames/H-H1_TEST-0-32.gwf"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let report = pipeline_for(&temp_dir)
            .run(&locator_for(&mock_server, "&cache=frame"))
            .await;

        assert!(!report.success);
        assert!(!temp_dir.path().join("metadata.txt").exists());
    }

    #[tokio::test]
    async fn test_run_writes_requested_manifest() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        mount_discovery(&mock_server, &["H-H1_TEST-0-32.gwf", "H-H1_TEST-32-32.gwf"]).await;
        for name in ["H-H1_TEST-0-32.gwf", "H-H1_TEST-32-32.gwf"] {
            Mock::given(method("GET"))
                .and(path(format!("/frames/{name}")))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(b"data"))
                .mount(&mock_server)
                .await;
        }

        let report = pipeline_for(&temp_dir)
            .run(&locator_for(&mock_server, "&cache=frame"))
            .await;

        assert!(report.success);
        let manifest = std::fs::read_to_string(temp_dir.path().join("metadata.txt")).unwrap();
        let lines: Vec<&str> = manifest.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("H H1_TEST 0 64 32 "), "got: {}", lines[0]);
    }

    #[tokio::test]
    async fn test_run_honors_custom_metadata_file_name() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        mount_discovery(&mock_server, &["H-H1_TEST-0-32.gwf"]).await;
        Mock::given(method("GET"))
            .and(path("/frames/H-H1_TEST-0-32.gwf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"data"))
            .mount(&mock_server)
            .await;

        let report = pipeline_for(&temp_dir)
            .run(&locator_for(&mock_server, "&cache=lal&metadata_file=frames.lcf"))
            .await;

        assert!(report.success);
        assert!(temp_dir.path().join("frames.lcf").exists());
        assert!(!temp_dir.path().join("metadata.txt").exists());
    }

    #[tokio::test]
    async fn test_run_unknown_cache_mode_still_succeeds() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        mount_discovery(&mock_server, &["H-H1_TEST-0-32.gwf"]).await;
        Mock::given(method("GET"))
            .and(path("/frames/H-H1_TEST-0-32.gwf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"data"))
            .mount(&mock_server)
            .await;

        let report = pipeline_for(&temp_dir)
            .run(&locator_for(&mock_server, "&cache=bogus"))
            .await;

        assert!(report.success, "bad cache mode must not fail the request");
        let manifest = std::fs::read_to_string(temp_dir.path().join("metadata.txt")).unwrap();
        assert!(manifest.contains("not a valid cache type"), "got: {manifest}");
    }
}
