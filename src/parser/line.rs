//! Unfold the physical lines of an ICS buffer into logical lines.
//!
//! A physical line starting with a space or a horizontal tab continues the previous one. Exactly
//! one leading whitespace character is removed and the rest is appended without separator.
//!
//! # Examples
//!
//! ```rust
//! let reader = ical_agenda::LineReader::new("SUMMARY:Team\r\n  meeting\r\nUID:1\r\n");
//! let lines: Vec<_> = reader.map(|line| line.inner).collect();
//! assert_eq!(lines, vec!["SUMMARY:Team meeting", "UID:1"]);
//! ```

use std::fmt;
use std::iter::{Enumerate, Peekable};
use std::str::Lines;

/// A logical line together with the physical line number it started on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    pub inner: String,
    number: usize,
}

impl Line {
    pub fn new(inner: String, number: usize) -> Self {
        Self { inner, number }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// 1-based physical line number.
    #[inline]
    pub fn number(&self) -> usize {
        self.number
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Line {}: {}", self.number, self.inner)
    }
}

#[inline]
fn is_continuation(line: &str) -> bool {
    line.starts_with([' ', '\t'])
}

pub struct LineReader<'a> {
    lines: Peekable<Enumerate<Lines<'a>>>,
}

impl<'a> LineReader<'a> {
    pub fn new(input: &'a str) -> Self {
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        LineReader {
            // `str::lines` already drops the trailing CR of CRLF endings
            lines: input.lines().enumerate().peekable(),
        }
    }
}

impl Iterator for LineReader<'_> {
    type Item = Line;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (index, first) = self.lines.next()?;
            let mut inner = first.to_owned();

            while let Some((_, next)) = self.lines.peek() {
                if !is_continuation(next) {
                    break;
                }
                // Space and tab are single bytes, so slicing at 1 is safe.
                inner.push_str(&next[1..]);
                self.lines.next();
            }

            let trimmed = inner.trim();
            if trimmed.is_empty() {
                continue;
            }
            let inner = if trimmed.len() == inner.len() {
                inner
            } else {
                trimmed.to_owned()
            };
            return Some(Line::new(inner, index + 1));
        }
    }
}
