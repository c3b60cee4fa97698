//! Error types for locator parsing and resolution.

use thiserror::Error;

/// Errors raised while interpreting a `gwdata://` locator or querying the
/// discovery service it points at.
#[derive(Debug, Error)]
pub enum LocatorError {
    /// The locator string is not a URL at all.
    #[error("invalid locator url {url}: {source}")]
    InvalidUrl {
        /// The offending locator string.
        url: String,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// The locator carries a scheme other than `gwdata`.
    #[error("unsupported scheme {scheme:?} in locator url {url}, expected \"gwdata\"")]
    UnsupportedScheme {
        /// The offending locator string.
        url: String,
        /// The scheme that was found.
        scheme: String,
    },

    /// The locator names no discovery host.
    #[error("locator url {url} has no host")]
    MissingHost {
        /// The offending locator string.
        url: String,
    },

    /// One or more required query arguments are absent.
    #[error(
        "locator url must supply the 'observatory', 'type', 's' (start) and 'e' (end) arguments; missing: {missing}"
    )]
    MissingParameters {
        /// Comma-separated list of the absent argument names.
        missing: String,
    },

    /// A query argument is present but unusable.
    #[error("locator argument {key}={value:?} is not a valid GPS time")]
    InvalidParameter {
        /// The query argument name.
        key: &'static str,
        /// The raw value found.
        value: String,
    },

    /// The discovery request could not be completed.
    #[error("locator query {url} failed: {source}")]
    Query {
        /// The discovery request URL.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The discovery service answered with a non-success status.
    #[error("locator service returned HTTP {status} for {url}")]
    HttpStatus {
        /// The discovery request URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The discovery response body was not a JSON list of URLs.
    #[error("locator response for {url} was not a JSON url list: {source}")]
    Decode {
        /// The discovery request URL.
        url: String,
        /// The underlying decode error.
        #[source]
        source: reqwest::Error,
    },
}

impl LocatorError {
    /// Creates an invalid-locator error.
    pub fn invalid_url(url: impl Into<String>, source: url::ParseError) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            source,
        }
    }

    /// Creates an unsupported-scheme error.
    pub fn unsupported_scheme(url: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self::UnsupportedScheme {
            url: url.into(),
            scheme: scheme.into(),
        }
    }

    /// Creates a missing-host error.
    pub fn missing_host(url: impl Into<String>) -> Self {
        Self::MissingHost { url: url.into() }
    }

    /// Creates a missing-parameters error from the absent argument names.
    pub fn missing_parameters(missing: &[&str]) -> Self {
        Self::MissingParameters {
            missing: missing.join(", "),
        }
    }

    /// Creates an invalid-parameter error.
    pub fn invalid_parameter(key: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidParameter {
            key,
            value: value.into(),
        }
    }

    /// Creates a query transport error.
    pub fn query(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Query {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a response decode error.
    pub fn decode(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameters_display_lists_names() {
        let error = LocatorError::missing_parameters(&["observatory", "s"]);
        let msg = error.to_string();
        assert!(msg.contains("missing: observatory, s"), "got: {msg}");
        assert!(msg.contains("'type'"), "got: {msg}");
    }

    #[test]
    fn test_invalid_parameter_display_names_key_and_value() {
        let error = LocatorError::invalid_parameter("s", "twelve");
        let msg = error.to_string();
        assert!(msg.contains("s=\"twelve\""), "got: {msg}");
        assert!(msg.contains("GPS"), "got: {msg}");
    }

    #[test]
    fn test_unsupported_scheme_display() {
        let error = LocatorError::unsupported_scheme("http://example.com", "http");
        let msg = error.to_string();
        assert!(msg.contains("\"http\""), "got: {msg}");
        assert!(msg.contains("gwdata"), "got: {msg}");
    }

    #[test]
    fn test_http_status_display() {
        let error = LocatorError::http_status("http://svc/services/data", 503);
        let msg = error.to_string();
        assert!(msg.contains("503"), "got: {msg}");
        assert!(msg.contains("http://svc/services/data"), "got: {msg}");
    }
}
