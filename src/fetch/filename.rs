//! Local file name derivation for resolved data URLs.
//!
//! Frame files keep their server-side names: the final URL path segment,
//! percent-decoded and stripped of anything that could escape the download
//! directory.

use tracing::debug;
use url::Url;

use super::error::FetchError;

/// Derives the local file name for a resolved URL.
///
/// # Errors
///
/// Returns [`FetchError::InvalidUrl`] when the URL does not parse and
/// [`FetchError::NoFileName`] when its path has no usable final segment.
pub fn file_name_for_url(url: &str) -> Result<String, FetchError> {
    let parsed = Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;
    let last = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| FetchError::no_file_name(url))?;
    let decoded = urlencoding::decode(last).unwrap_or_else(|e| {
        debug!(segment = %last, error = %e, "URL decoding failed, using raw segment");
        last.into()
    });
    let name = sanitize_file_name(&decoded);
    if name.is_empty() {
        return Err(FetchError::no_file_name(url));
    }
    Ok(name)
}

/// Strips path separators and control characters so a hostile server cannot
/// name a file outside the download directory.
fn sanitize_file_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match cleaned.trim() {
        "" | "." | ".." => String::new(),
        trimmed => trimmed.to_string(),
    }
}
