//! Batch execution over a transfer request file.
//!
//! The orchestrator hands over one input file holding a ClassAd per
//! requested transfer and expects result ads appended to the output file as
//! work proceeds, so a partial output survives even if the process is killed
//! mid-batch. The first failed request ends the batch; requests after it are
//! not attempted.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::classad::{self, ClassAd, ClassAdError};
use crate::pipeline::{ErrorRecord, TransferPipeline};

/// Errors that end a batch early.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The input file could not be read.
    #[error("cannot read input file {path}: {source}")]
    InputRead {
        /// The input file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The input file is not a valid ClassAd stream.
    #[error("cannot parse input file {path}: {source}")]
    InputParse {
        /// The input file path.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: ClassAdError,
    },

    /// The output file could not be created.
    #[error("cannot open output file {path}: {source}")]
    OutputOpen {
        /// The output file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A result record could not be written.
    #[error("cannot write output file {path}: {source}")]
    OutputWrite {
        /// The output file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A request ad carries no `Url` attribute.
    #[error("transfer request {index} has no Url attribute")]
    MissingUrl {
        /// Zero-based position of the request in the input file.
        index: usize,
    },

    /// A transfer request failed; its records were already written.
    #[error("transfer request {url} failed")]
    TransferFailed {
        /// The locator URL that failed.
        url: String,
    },
}

impl BatchError {
    fn input_read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::InputRead {
            path: path.into(),
            source,
        }
    }

    fn input_parse(path: impl Into<PathBuf>, source: ClassAdError) -> Self {
        Self::InputParse {
            path: path.into(),
            source,
        }
    }

    fn output_open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::OutputOpen {
            path: path.into(),
            source,
        }
    }

    fn output_write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::OutputWrite {
            path: path.into(),
            source,
        }
    }
}

/// Drives the pipeline over every request in an input file.
pub struct BatchRunner {
    pipeline: TransferPipeline,
}

impl BatchRunner {
    /// Creates a runner around a configured pipeline.
    #[must_use]
    pub fn new(pipeline: TransferPipeline) -> Self {
        Self { pipeline }
    }

    /// Processes every request in `infile`, writing result ads to `outfile`.
    ///
    /// The output file is created (truncated) up front; an empty input
    /// produces an empty output and succeeds. Result ads are flushed after
    /// each request. Processing stops at the first failed request.
    ///
    /// # Errors
    ///
    /// Returns a [`BatchError`] for unreadable input, unwritable output, a
    /// request without a `Url` attribute, or a failed transfer. When the
    /// input cannot be read or parsed, a best-effort error record is still
    /// written to `outfile` so the orchestrator sees a reason.
    pub async fn run(&self, infile: &Path, outfile: &Path) -> Result<(), BatchError> {
        let requests = match read_requests(infile) {
            Ok(requests) => requests,
            Err(error) => {
                salvage_error_record(outfile, &error);
                return Err(error);
            }
        };
        info!(requests = requests.len(), infile = %infile.display(), "parsed transfer requests");

        let file = fs::File::create(outfile).map_err(|e| BatchError::output_open(outfile, e))?;
        let mut sink = io::BufWriter::new(file);
        self.run_requests(&requests, &mut sink, outfile).await?;
        sink.flush().map_err(|e| BatchError::output_write(outfile, e))
    }

    async fn run_requests<W: Write>(
        &self,
        requests: &[ClassAd],
        sink: &mut W,
        outfile: &Path,
    ) -> Result<(), BatchError> {
        for (index, request) in requests.iter().enumerate() {
            let Some(url) = request.get_str("Url") else {
                warn!(index, "request ad has no Url attribute");
                let record = ErrorRecord::new("transfer request has no Url attribute", "");
                // Best effort: the diagnostic must not mask the real error.
                if write_record(sink, &record.to_classad())
                    .and_then(|()| sink.flush())
                    .is_err()
                {
                    warn!(index, "could not record the missing-Url diagnostic");
                }
                return Err(BatchError::MissingUrl { index });
            };

            info!(index, url = %url, "processing transfer request");
            let report = self.pipeline.run(url).await;
            for record in &report.records {
                write_record(sink, &record.to_classad())
                    .map_err(|e| BatchError::output_write(outfile, e))?;
            }
            // Keep the output current for orchestrators that poll it.
            sink.flush()
                .map_err(|e| BatchError::output_write(outfile, e))?;

            if !report.success {
                error!(url = %url, "transfer request failed, aborting batch");
                return Err(BatchError::TransferFailed {
                    url: url.to_string(),
                });
            }
        }
        info!(requests = requests.len(), "batch complete");
        Ok(())
    }
}

fn read_requests(path: &Path) -> Result<Vec<ClassAd>, BatchError> {
    let text = fs::read_to_string(path).map_err(|e| BatchError::input_read(path, e))?;
    classad::parse_ads(&text).map_err(|e| BatchError::input_parse(path, e))
}

fn write_record<W: Write>(sink: &mut W, ad: &ClassAd) -> io::Result<()> {
    writeln!(sink, "{}", ad.unparse_new())
}

/// Tries to leave one error record in the output file when the batch dies
/// before processing starts. Failures here are swallowed; the caller already
/// has a better error to report.
fn salvage_error_record(outfile: &Path, error: &BatchError) {
    let record = ErrorRecord::new(error.to_string(), "");
    match fs::File::create(outfile) {
        Ok(mut file) => {
            if write_record(&mut file, &record.to_classad()).is_err() {
                warn!(outfile = %outfile.display(), "could not write salvage error record");
            }
        }
        Err(e) => {
            warn!(outfile = %outfile.display(), error = %e, "could not open output for salvage record");
        }
    }
}
