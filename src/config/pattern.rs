//! Path templates with `{year}` and `{month}` placeholders
//!
//! Patterns use the brace syntax of the dataset URLs, e.g.
//! `fhv_tripdata_{year:04d}-{month:02d}.parquet`. Supported format specs
//! are an optional `0` fill flag, an optional width and an optional `d`.
//! `{{` and `}}` produce literal braces.

use std::fmt;

use crate::error::{RideDurationError, Result};

/// A path template that is formatted once per (year, month) partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern(String);

impl PathPattern {
    /// Wrap a template string. Validation happens on [`PathPattern::format`].
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    /// The raw template string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitute `year` and `month` into the template
    pub fn format(&self, year: i32, month: u32) -> Result<String> {
        let mut out = String::with_capacity(self.0.len() + 8);
        let mut chars = self.0.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '{' => {
                    let mut placeholder = String::new();
                    let mut closed = false;
                    for inner in chars.by_ref() {
                        if inner == '}' {
                            closed = true;
                            break;
                        }
                        placeholder.push(inner);
                    }
                    if !closed {
                        return Err(self.error("unterminated '{'"));
                    }
                    self.render_placeholder(&placeholder, year, month, &mut out)?;
                }
                '}' => return Err(self.error("unmatched '}'")),
                other => out.push(other),
            }
        }

        Ok(out)
    }

    fn render_placeholder(
        &self,
        placeholder: &str,
        year: i32,
        month: u32,
        out: &mut String,
    ) -> Result<()> {
        let (name, spec) = match placeholder.split_once(':') {
            Some((name, spec)) => (name, spec),
            None => (placeholder, ""),
        };

        let value = match name {
            "year" => i64::from(year),
            "month" => i64::from(month),
            other => return Err(self.error(&format!("unknown placeholder '{other}'"))),
        };

        let spec = spec.strip_suffix('d').unwrap_or(spec);
        let (zero_fill, width) = match spec.strip_prefix('0') {
            Some(rest) => (true, rest),
            None => (false, spec),
        };
        let width = if width.is_empty() {
            0
        } else {
            width
                .parse::<usize>()
                .map_err(|_| self.error(&format!("unsupported format spec in '{{{placeholder}}}'")))?
        };

        if zero_fill {
            out.push_str(&format!("{value:0width$}"));
        } else {
            out.push_str(&format!("{value:>width$}"));
        }
        Ok(())
    }

    fn error(&self, message: &str) -> RideDurationError {
        RideDurationError::config(format!("invalid path pattern {:?}: {message}", self.0))
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PathPattern {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PathPattern {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
