//! Parser for streams of literal-only ClassAds.
//!
//! The input file HTCondor writes for a plugin is a concatenation of ads.
//! Bracketed ads are delimited by `[` and `]`; bare ads are runs of
//! `Key = value` lines ending at a blank line, a `[`, or end of input. Both
//! forms may be mixed freely in one stream.

use std::iter::Peekable;
use std::str::Chars;

use super::{ClassAd, ClassAdError, Value};

/// Reads every ad in `input`, in order.
///
/// # Errors
///
/// Returns [`ClassAdError::Malformed`] when the stream deviates from the
/// supported subset, with the line where parsing stopped.
pub fn parse_ads(input: &str) -> Result<Vec<ClassAd>, ClassAdError> {
    let mut parser = Parser::new(input);
    let mut ads = Vec::new();
    loop {
        parser.skip_whitespace();
        match parser.peek() {
            None => break,
            Some('[') => ads.push(parser.parse_bracketed_ad()?),
            Some(c) if is_ident_start(c) => ads.push(parser.parse_bare_ad()?),
            Some(c) => return Err(parser.error(format!("unexpected character {c:?}"))),
        }
    }
    Ok(ads)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn classify_scalar(token: &str) -> Option<Value> {
    if token.eq_ignore_ascii_case("true") {
        return Some(Value::Bool(true));
    }
    if token.eq_ignore_ascii_case("false") {
        return Some(Value::Bool(false));
    }
    if let Ok(int) = token.parse::<i64>() {
        return Some(Value::Int(int));
    }
    if let Ok(real) = token.parse::<f64>() {
        return Some(Value::Real(real));
    }
    None
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.line += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    /// Skips spaces and tabs but stops at newlines, which are significant in
    /// the bare form.
    fn skip_inline_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\r')) {
            self.bump();
        }
    }

    fn error(&self, reason: impl Into<String>) -> ClassAdError {
        ClassAdError::Malformed {
            line: self.line,
            reason: reason.into(),
        }
    }

    fn parse_bracketed_ad(&mut self) -> Result<ClassAd, ClassAdError> {
        self.bump();
        let mut ad = ClassAd::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(']') => {
                    self.bump();
                    return Ok(ad);
                }
                Some(';') => {
                    self.bump();
                }
                Some(c) if is_ident_start(c) => {
                    let (name, value) = self.parse_attribute(true)?;
                    ad.insert(name, value);
                }
                Some(c) => return Err(self.error(format!("unexpected character {c:?} in ad"))),
                None => return Err(self.error("unterminated ad, expected ']'")),
            }
        }
    }

    fn parse_bare_ad(&mut self) -> Result<ClassAd, ClassAdError> {
        let mut ad = ClassAd::new();
        loop {
            let (name, value) = self.parse_attribute(false)?;
            ad.insert(name, value);
            self.skip_inline_whitespace();
            match self.peek() {
                None => return Ok(ad),
                Some('\n') => {
                    self.bump();
                }
                Some(c) => return Err(self.error(format!("unexpected character {c:?} after value"))),
            }
            self.skip_inline_whitespace();
            match self.peek() {
                None => return Ok(ad),
                // A blank line ends the ad.
                Some('\n') => {
                    self.bump();
                    return Ok(ad);
                }
                // So does the start of a bracketed ad.
                Some('[') => return Ok(ad),
                Some(c) if is_ident_start(c) => {}
                Some(c) => return Err(self.error(format!("unexpected character {c:?}"))),
            }
        }
    }

    fn parse_attribute(&mut self, bracketed: bool) -> Result<(String, Value), ClassAdError> {
        let name = self.parse_ident()?;
        if bracketed {
            self.skip_whitespace();
        } else {
            self.skip_inline_whitespace();
        }
        if self.peek() != Some('=') {
            return Err(self.error(format!("expected '=' after attribute {name}")));
        }
        self.bump();
        if bracketed {
            self.skip_whitespace();
        } else {
            self.skip_inline_whitespace();
        }
        let value = self.parse_value(bracketed)?;
        Ok((name, value))
    }

    fn parse_ident(&mut self) -> Result<String, ClassAdError> {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if name.is_empty() {
            return Err(self.error("expected attribute name"));
        }
        Ok(name)
    }

    fn parse_value(&mut self, bracketed: bool) -> Result<Value, ClassAdError> {
        if self.peek() == Some('"') {
            return self.parse_string();
        }
        let mut token = String::new();
        while let Some(c) = self.peek() {
            let stop = if bracketed {
                c == ';' || c == ']' || c == '\n'
            } else {
                c == '\n'
            };
            if stop {
                break;
            }
            token.push(c);
            self.bump();
        }
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(self.error("empty attribute value"));
        }
        classify_scalar(trimmed).ok_or_else(|| self.error(format!("unsupported value {trimmed:?}")))
    }

    fn parse_string(&mut self) -> Result<Value, ClassAdError> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some('"') => return Ok(Value::Str(out)),
                Some('\\') => {
                    let Some(escaped) = self.bump() else {
                        return Err(self.error("unterminated escape sequence"));
                    };
                    out.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => other,
                    });
                }
                Some(c) => out.push(c),
            }
        }
    }
}
