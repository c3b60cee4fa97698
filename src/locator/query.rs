//! Parsed form of a `gwdata://` locator.
//!
//! A locator names the discovery host plus the data selection:
//!
//! ```text
//! gwdata://host[:port]?observatory=H&type=H1_HOFT_C00&s=1186740069&e=1186740369
//! ```
//!
//! with optional `cache` (manifest flavor) and `metadata_file` (manifest
//! name) arguments.

use url::Url;

use super::error::LocatorError;

/// The URL scheme this plugin advertises and accepts.
pub const LOCATOR_SCHEME: &str = "gwdata";

/// Manifest file name used when the locator does not supply one.
pub const DEFAULT_METADATA_FILE: &str = "metadata.txt";

/// One fully validated transfer request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataQuery {
    /// Discovery service authority, `host` or `host:port`.
    pub endpoint: String,
    /// Observatory code, e.g. `H` or `L`.
    pub observatory: String,
    /// Frame type tag, e.g. `H1_HOFT_C00`.
    pub frame_type: String,
    /// GPS start of the requested interval.
    pub start: i64,
    /// GPS end of the requested interval.
    pub end: i64,
    /// Requested manifest flavor, verbatim from the locator.
    pub cache: Option<String>,
    /// Manifest file name to write when `cache` is present.
    pub metadata_file: String,
}

impl DataQuery {
    /// Parses and validates a locator string.
    ///
    /// # Errors
    ///
    /// Returns a [`LocatorError`] when the string is not a URL, carries the
    /// wrong scheme, names no host, omits any of the four required arguments
    /// (`observatory`, `type`, `s`, `e`), or supplies a non-integer GPS time.
    pub fn parse(locator: &str) -> Result<Self, LocatorError> {
        let parsed = Url::parse(locator).map_err(|e| LocatorError::invalid_url(locator, e))?;
        if parsed.scheme() != LOCATOR_SCHEME {
            return Err(LocatorError::unsupported_scheme(locator, parsed.scheme()));
        }
        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| LocatorError::missing_host(locator))?;
        let endpoint = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let mut observatory = None;
        let mut frame_type = None;
        let mut start_raw = None;
        let mut end_raw = None;
        let mut cache = None;
        let mut metadata_file = None;
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "observatory" => observatory = Some(value.into_owned()),
                "type" => frame_type = Some(value.into_owned()),
                "s" => start_raw = Some(value.into_owned()),
                "e" => end_raw = Some(value.into_owned()),
                "cache" => cache = Some(value.into_owned()),
                "metadata_file" => metadata_file = Some(value.into_owned()),
                // Unknown arguments are ignored so older locators keep working.
                _ => {}
            }
        }

        let (observatory, frame_type, start_raw, end_raw) =
            match (observatory, frame_type, start_raw, end_raw) {
                (Some(o), Some(t), Some(s), Some(e)) => (o, t, s, e),
                (o, t, s, e) => {
                    let mut missing = Vec::new();
                    if o.is_none() {
                        missing.push("observatory");
                    }
                    if t.is_none() {
                        missing.push("type");
                    }
                    if s.is_none() {
                        missing.push("s");
                    }
                    if e.is_none() {
                        missing.push("e");
                    }
                    return Err(LocatorError::missing_parameters(&missing));
                }
            };

        let start = parse_gps("s", &start_raw)?;
        let end = parse_gps("e", &end_raw)?;

        Ok(Self {
            endpoint,
            observatory,
            frame_type,
            start,
            end,
            cache,
            metadata_file: metadata_file.unwrap_or_else(|| DEFAULT_METADATA_FILE.to_string()),
        })
    }
}

fn parse_gps(key: &'static str, raw: &str) -> Result<i64, LocatorError> {
    raw.parse()
        .map_err(|_| LocatorError::invalid_parameter(key, raw))
}
