//! Result records written back to the invoking orchestrator.
//!
//! Every attempted file transfer produces a [`TransferResult`]; a request
//! that fails before any file transfer can start produces an
//! [`ErrorRecord`]. Both serialize to ClassAds with the attribute names and
//! ordering HTCondor's transfer statistics machinery expects.

use crate::classad::{ClassAd, Value};

/// Transfer method name advertised to and stamped on every record.
pub const TRANSFER_PROTOCOL: &str = "gwdata";

/// Statistics for one attempted file download.
#[derive(Debug, Clone)]
pub struct TransferResult {
    /// Whether the download completed.
    pub success: bool,
    /// Local file name (empty when none could be derived).
    pub file_name: String,
    /// Bytes written for this file.
    pub file_bytes: u64,
    /// Total bytes for the attempt; equal to `file_bytes` for this protocol.
    pub total_bytes: u64,
    /// Unix time the attempt began.
    pub start_time: i64,
    /// Unix time the attempt finished.
    pub end_time: i64,
    /// Wall-clock seconds spent on the attempt.
    pub connection_seconds: f64,
    /// The resolved URL that was fetched.
    pub url: String,
    /// Failure description, absent on success.
    pub error: Option<String>,
}

impl TransferResult {
    /// Serializes this result with the protocol's attribute ordering.
    #[must_use]
    pub fn to_classad(&self) -> ClassAd {
        let mut ad = ClassAd::new();
        ad.insert("TransferSuccess", Value::Bool(self.success));
        ad.insert("TransferProtocol", Value::Str(TRANSFER_PROTOCOL.to_string()));
        ad.insert("TransferType", Value::Str("download".to_string()));
        ad.insert("TransferFileName", Value::Str(self.file_name.clone()));
        ad.insert("TransferFileBytes", Value::Int(clamp_bytes(self.file_bytes)));
        ad.insert("TransferTotalBytes", Value::Int(clamp_bytes(self.total_bytes)));
        ad.insert("TransferStartTime", Value::Int(self.start_time));
        ad.insert("TransferEndTime", Value::Int(self.end_time));
        ad.insert(
            "ConnectionTimeSeconds",
            Value::Real(self.connection_seconds),
        );
        ad.insert("TransferUrl", Value::Str(self.url.clone()));
        if let Some(error) = &self.error {
            ad.insert("TransferError", Value::Str(error.clone()));
        }
        ad
    }
}

/// Failure that prevented any file transfer from being attempted, such as a
/// bad locator or an unreachable discovery service.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    /// Failure description.
    pub error: String,
    /// The locator URL the failure concerns.
    pub url: String,
}

impl ErrorRecord {
    /// Creates an error record.
    pub fn new(error: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            url: url.into(),
        }
    }

    /// Serializes this record with the protocol's attribute ordering.
    #[must_use]
    pub fn to_classad(&self) -> ClassAd {
        let mut ad = ClassAd::new();
        ad.insert("TransferSuccess", Value::Bool(false));
        ad.insert("TransferError", Value::Str(self.error.clone()));
        ad.insert("TransferUrl", Value::Str(self.url.clone()));
        ad
    }
}

/// One serializable line of pipeline output.
#[derive(Debug, Clone)]
pub enum OutputRecord {
    /// Per-file transfer statistics.
    Transfer(TransferResult),
    /// Request-level failure.
    Error(ErrorRecord),
}

impl OutputRecord {
    /// Serializes whichever record this is.
    #[must_use]
    pub fn to_classad(&self) -> ClassAd {
        match self {
            Self::Transfer(result) => result.to_classad(),
            Self::Error(record) => record.to_classad(),
        }
    }

    /// Whether this record reports success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            Self::Transfer(result) => result.success,
            Self::Error(_) => false,
        }
    }
}

fn clamp_bytes(bytes: u64) -> i64 {
    i64::try_from(bytes).unwrap_or(i64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_result() -> TransferResult {
        TransferResult {
            success: true,
            file_name: "H-H1_HOFT-0-32.gwf".to_string(),
            file_bytes: 4096,
            total_bytes: 4096,
            start_time: 1_700_000_000,
            end_time: 1_700_000_002,
            connection_seconds: 1.75,
            url: "http://data.example.org/H-H1_HOFT-0-32.gwf".to_string(),
            error: None,
        }
    }

    #[test]
    fn test_transfer_result_attribute_order() {
        let ad = sample_result().to_classad();
        let names: Vec<&str> = ad.iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec![
                "TransferSuccess",
                "TransferProtocol",
                "TransferType",
                "TransferFileName",
                "TransferFileBytes",
                "TransferTotalBytes",
                "TransferStartTime",
                "TransferEndTime",
                "ConnectionTimeSeconds",
                "TransferUrl",
            ]
        );
    }

    #[test]
    fn test_transfer_result_success_has_no_error_attribute() {
        let ad = sample_result().to_classad();
        assert_eq!(ad.get_bool("TransferSuccess"), Some(true));
        assert_eq!(ad.get("TransferError"), None);
    }

    #[test]
    fn test_transfer_result_failure_appends_error_attribute() {
        let mut result = sample_result();
        result.success = false;
        result.error = Some("HTTP 404 downloading ...".to_string());
        let ad = result.to_classad();
        assert_eq!(ad.get_bool("TransferSuccess"), Some(false));
        assert_eq!(ad.get_str("TransferError"), Some("HTTP 404 downloading ..."));
        let last = ad.iter().last().map(|(name, _)| name);
        assert_eq!(last, Some("TransferError"));
    }

    #[test]
    fn test_transfer_result_records_protocol_and_type() {
        let ad = sample_result().to_classad();
        assert_eq!(ad.get_str("TransferProtocol"), Some("gwdata"));
        assert_eq!(ad.get_str("TransferType"), Some("download"));
        assert_eq!(ad.get_real("ConnectionTimeSeconds"), Some(1.75));
    }

    #[test]
    fn test_error_record_shape() {
        let ad = ErrorRecord::new("no host", "gwdata://?s=1").to_classad();
        assert_eq!(ad.len(), 3);
        assert_eq!(ad.get_bool("TransferSuccess"), Some(false));
        assert_eq!(ad.get_str("TransferError"), Some("no host"));
        assert_eq!(ad.get_str("TransferUrl"), Some("gwdata://?s=1"));
    }

    #[test]
    fn test_output_record_success_flag() {
        let ok = OutputRecord::Transfer(sample_result());
        assert!(ok.is_success());
        let failed = OutputRecord::Error(ErrorRecord::new("boom", "u"));
        assert!(!failed.is_success());
    }

    #[test]
    fn test_byte_counts_clamp_to_i64() {
        let mut result = sample_result();
        result.file_bytes = u64::MAX;
        let ad = result.to_classad();
        assert_eq!(ad.get_int("TransferFileBytes"), Some(i64::MAX));
    }
}
