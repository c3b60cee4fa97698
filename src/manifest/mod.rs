//! Metadata manifest generation for completed transfers.
//!
//! When a locator carries a `cache` argument, a manifest describing the
//! fetched files is written next to them after every download succeeds. Two
//! flavors exist:
//!
//! - **flat** (`lal`, `lal-cache`): one line per file, `SITE TAG START
//!   DURATION DIR`.
//! - **segment** (`frame`, `frame-cache`): one line per contiguous run of
//!   files, `SITE TAG SEG_START SEG_END INTERVAL DIR`.
//!
//! Frame file names follow the `SITE-TAG-START-DURATION.ext` convention, so
//! segment detection is a single walk over the resolved URLs comparing each
//! file's start time against where the previous file ended. Manifest problems
//! are reported in-band as `Error:` lines rather than failing the transfer;
//! the data files themselves are already on disk and usable.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

/// Errors raised while writing a manifest file.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file could not be created or written.
    #[error("cannot write manifest {path}: {source}")]
    Io {
        /// The manifest path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl ManifestError {
    fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Manifest flavor selected by the locator's `cache` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// One line per file.
    Flat,
    /// One line per contiguous segment.
    Segment,
}

impl CacheMode {
    /// Maps a raw `cache` argument onto a flavor, `None` for unknown values.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "lal" | "lal-cache" => Some(Self::Flat),
            "frame" | "frame-cache" => Some(Self::Segment),
            _ => None,
        }
    }
}

/// One frame file name parsed into its metadata fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameFile {
    /// Observatory site code, the part before the first dash.
    pub site: String,
    /// Frame type tag.
    pub tag: String,
    /// GPS start time of the file.
    pub start: i64,
    /// Duration of the file in seconds.
    pub duration: i64,
}

impl FrameFile {
    /// Parses `SITE-TAG-START-DURATION[.ext]` from the final path segment of
    /// a URL. Returns `None` when the name does not follow the convention.
    #[must_use]
    pub fn parse(url: &str) -> Option<Self> {
        let name = url.rsplit('/').next()?;
        let mut parts = name.split('-');
        let site = parts.next()?;
        let tag = parts.next()?;
        let start = parts.next()?;
        let duration = parts.next()?;
        if parts.next().is_some() || site.is_empty() || tag.is_empty() {
            return None;
        }
        let start = start.parse().ok()?;
        let duration = duration.split('.').next()?.parse().ok()?;
        Some(Self {
            site: site.to_string(),
            tag: tag.to_string(),
            start,
            duration,
        })
    }
}

/// Writes the manifest for one completed transfer request.
///
/// `urls` is the resolved URL list in server order, `end_time` the GPS end of
/// the requested interval, and `download_dir` the directory the data files
/// were written to (recorded in each line as an absolute path). An unknown
/// `mode` writes a single diagnostic line instead of metadata.
///
/// # Errors
///
/// Returns [`ManifestError::Io`] when `output_path` cannot be created or
/// written.
pub fn write_manifest(
    mode: &str,
    urls: &[String],
    end_time: i64,
    output_path: &Path,
    download_dir: &Path,
) -> Result<(), ManifestError> {
    let file = File::create(output_path).map_err(|e| ManifestError::io(output_path, e))?;
    let mut writer = BufWriter::new(file);
    let dir = absolute_dir(download_dir);

    let written = match CacheMode::parse(mode) {
        Some(CacheMode::Flat) => write_flat(&mut writer, urls, &dir),
        Some(CacheMode::Segment) => write_segments(&mut writer, urls, end_time, &dir),
        None => {
            warn!(mode = %mode, "unknown cache mode requested");
            writeln!(
                writer,
                "Error: {mode} is not a valid cache type. Allowed types are \"lal\", \"lal-cache\", \"frame\" and \"frame-cache\"."
            )
        }
    };
    written
        .and_then(|()| writer.flush())
        .map_err(|e| ManifestError::io(output_path, e))
}

fn write_flat(writer: &mut impl Write, urls: &[String], dir: &Path) -> io::Result<()> {
    for url in urls {
        match FrameFile::parse(url) {
            Some(frame) => writeln!(
                writer,
                "{} {} {} {} {}",
                frame.site,
                frame.tag,
                frame.start,
                frame.duration,
                dir.display()
            )?,
            None => {
                warn!(url = %url, "cannot parse frame metadata from url");
                writeln!(writer, "Error: cannot parse frame metadata from {url}")?;
            }
        }
    }
    Ok(())
}

/// Running state for one contiguous run of frame files.
#[derive(Debug)]
struct OpenSegment {
    site: String,
    tag: String,
    start: i64,
    /// GPS time the next file must begin at to continue the run.
    expected_next: i64,
    /// Duration of the most recent file in the run.
    interval: i64,
}

impl OpenSegment {
    fn starting_at(frame: &FrameFile) -> Self {
        Self {
            site: frame.site.clone(),
            tag: frame.tag.clone(),
            start: frame.start,
            expected_next: frame.start + frame.duration,
            interval: frame.duration,
        }
    }
}

fn write_segments(
    writer: &mut impl Write,
    urls: &[String],
    end_time: i64,
    dir: &Path,
) -> io::Result<()> {
    let mut open: Option<OpenSegment> = None;
    for url in urls {
        let Some(frame) = FrameFile::parse(url) else {
            warn!(url = %url, "cannot parse frame metadata from url");
            writeln!(writer, "Error: cannot parse frame metadata from {url}")?;
            continue;
        };
        open = Some(match open.take() {
            None => OpenSegment::starting_at(&frame),
            Some(mut segment) if frame.start == segment.expected_next => {
                segment.expected_next += frame.duration;
                segment.interval = frame.duration;
                segment
            }
            Some(segment) => {
                // Gap: the finished run ends where its last file ended.
                writeln!(
                    writer,
                    "{} {} {} {} {} {}",
                    segment.site,
                    segment.tag,
                    segment.start,
                    segment.expected_next,
                    frame.duration,
                    dir.display()
                )?;
                OpenSegment::starting_at(&frame)
            }
        });
    }
    // The requested end time is authoritative for the final run: the last
    // file may extend past what the requester asked for.
    if let Some(segment) = open {
        writeln!(
            writer,
            "{} {} {} {} {} {}",
            segment.site,
            segment.tag,
            segment.start,
            end_time,
            segment.interval,
            dir.display()
        )?;
    }
    Ok(())
}

/// `download_dir` as an absolute path, without touching the filesystem.
fn absolute_dir(dir: &Path) -> PathBuf {
    std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf())
}
