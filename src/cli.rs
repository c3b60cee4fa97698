//! Command-line handling for the plugin protocol.
//!
//! HTCondor invokes transfer plugins with a fixed argument vocabulary:
//! `-classad` alone, or `-infile <path> -outfile <path>` in either order.
//! The single-dash long flags predate GNU conventions, so arguments are
//! matched by hand rather than through an option parser.

use std::io::{self, Write};
use std::path::PathBuf;

use thiserror::Error;

use gwdata_core::classad::{ClassAd, Value};
use gwdata_core::pipeline::TRANSFER_PROTOCOL;

/// Exit code HTCondor expects from a failed plugin invocation.
pub const FAILURE_EXIT_CODE: i32 = 255;

/// What the command line asks the plugin to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Print the capability ad and exit.
    Capabilities,
    /// Process transfer requests from `infile`, writing results to `outfile`.
    Transfer {
        /// Path of the request ClassAd file.
        infile: PathBuf,
        /// Path of the result ClassAd file.
        outfile: PathBuf,
    },
}

/// The arguments do not match the plugin protocol.
#[derive(Debug, Error)]
#[error("{reason}")]
pub struct UsageError {
    reason: String,
}

impl UsageError {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Interprets the arguments after the program name.
///
/// # Errors
///
/// Returns a [`UsageError`] for any argument vector other than the three
/// accepted forms.
pub fn parse<I>(args: I) -> Result<Invocation, UsageError>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();
    let as_strs: Vec<&str> = args.iter().map(String::as_str).collect();

    match as_strs.as_slice() {
        ["-classad"] => Ok(Invocation::Capabilities),
        [first_flag, first_value, second_flag, second_value] => {
            match (*first_flag, *second_flag) {
                ("-infile", "-outfile") => Ok(Invocation::Transfer {
                    infile: PathBuf::from(first_value),
                    outfile: PathBuf::from(second_value),
                }),
                ("-outfile", "-infile") => Ok(Invocation::Transfer {
                    infile: PathBuf::from(second_value),
                    outfile: PathBuf::from(first_value),
                }),
                _ => Err(UsageError::new(format!(
                    "unrecognized arguments: {first_flag} {second_flag}"
                ))),
            }
        }
        [] => Err(UsageError::new("no arguments given")),
        other => Err(UsageError::new(format!(
            "unrecognized arguments: {}",
            other.join(" ")
        ))),
    }
}

/// Writes the usage message, conventionally to stderr.
///
/// # Errors
///
/// Returns any error from the underlying writer.
pub fn print_usage<W: Write>(stream: &mut W, program: &str) -> io::Result<()> {
    writeln!(
        stream,
        "Usage: {program} -infile <input-filename> -outfile <output-filename>\n       \
         {program} -classad\n\n\
         Options:\n  \
         -classad                    Print a ClassAd containing the capabilities of this\n                              \
         file transfer plugin.\n  \
         -infile <input-filename>    Input ClassAd file\n  \
         -outfile <output-filename>  Output ClassAd file"
    )
}

/// Builds the capability ad advertised in response to `-classad`.
#[must_use]
pub fn capability_ad() -> ClassAd {
    let mut ad = ClassAd::new();
    ad.insert("MultipleFileSupport", Value::Bool(true));
    ad.insert("PluginType", Value::Str("FileTransfer".to_string()));
    ad.insert("SupportedMethods", Value::Str(TRANSFER_PROTOCOL.to_string()));
    ad.insert("Version", Value::Str(env!("CARGO_PKG_VERSION").to_string()));
    ad
}
