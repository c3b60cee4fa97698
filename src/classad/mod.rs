//! Minimal ClassAd reader and writer for the file transfer plugin protocol.
//!
//! HTCondor hands a transfer plugin a file containing one ClassAd per
//! requested transfer and reads result ads back in the same syntax. Only the
//! subset the protocol exercises is implemented: literal boolean, integer,
//! real and quoted-string values, in both the bracketed form
//! `[ Key = value; ... ]` and the bare form of one `Key = value` pair per
//! line. Expressions, nested ads and lists are out of scope.

mod parse;

pub use parse::parse_ads;

use std::fmt;

use thiserror::Error;

/// Errors raised while reading a ClassAd stream.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassAdError {
    /// The input does not conform to the supported ClassAd subset.
    #[error("malformed classad at line {line}: {reason}")]
    Malformed {
        /// 1-based line number where parsing stopped.
        line: usize,
        /// What the parser expected or found.
        reason: String,
    },
}

/// A single literal attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(String),
}

impl Value {
    /// Returns the string payload, if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean payload, if this is a boolean value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer payload, if this is an integer value.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the real payload, widening integers as ClassAd comparisons do.
    #[must_use]
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(r) => Some(*r),
            #[allow(clippy::cast_precision_loss)]
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            // Debug formatting keeps the decimal point on round numbers, so a
            // reader never mistakes a real for an integer.
            Self::Real(v) => write!(f, "{v:?}"),
            Self::Str(v) => {
                let mut escaped = String::with_capacity(v.len());
                escape_into(&mut escaped, v);
                write!(f, "\"{escaped}\"")
            }
        }
    }
}

fn escape_into(out: &mut String, raw: &str) {
    for c in raw.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
}

/// An attribute list preserving insertion order.
///
/// Attribute names compare case-insensitively, matching HTCondor semantics,
/// but the stored spelling is whoever wrote the attribute first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassAd {
    attrs: Vec<(String, Value)>,
}

impl ClassAd {
    /// Creates an empty ad.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an attribute, replacing any existing value under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if let Some(slot) = self
            .attrs
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            slot.1 = value;
        } else {
            self.attrs.push((name, value));
        }
    }

    /// Looks up an attribute by case-insensitive name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attrs
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// Looks up a string attribute.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Looks up a boolean attribute.
    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Looks up an integer attribute.
    #[must_use]
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    /// Looks up a real attribute, widening integers.
    #[must_use]
    pub fn get_real(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_real)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Iterates attributes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attrs.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Renders the bracketed single-line form: `[ A = 1; B = "x" ]`.
    #[must_use]
    pub fn unparse_new(&self) -> String {
        if self.attrs.is_empty() {
            return String::from("[ ]");
        }
        let mut out = String::from("[");
        for (index, (name, value)) in self.attrs.iter().enumerate() {
            if index > 0 {
                out.push(';');
            }
            out.push(' ');
            out.push_str(&format!("{name} = {value}"));
        }
        out.push_str(" ]");
        out
    }

    /// Renders the bare form: one `Key = value` line per attribute, each
    /// terminated by a newline.
    #[must_use]
    pub fn unparse_old(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.attrs {
            out.push_str(&format!("{name} = {value}\n"));
        }
        out
    }
}

impl fmt::Display for ClassAd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.unparse_new())
    }
}
