//! Split the logical lines of `LineReader` into content lines.
//!
//! A content line contains:
//! - A name formatted in uppercase.
//! - A list of parameters represented by `(key, values)` tuples. The key is formatted in
//!   uppercase and the values stay untouched.
//! - A value that stays untouched.
//!
//! #### Warning
//!   `ContentLineParser` only splits the line. No checks are made on the validity of names,
//!   parameters or values; that is up to the consumer.
//!
//! # Examples
//!
//! ```rust
//! let mut reader = ical_agenda::ContentLineParser::new("DTSTART;TZID=Europe/Berlin:20240101T090000\r\n");
//! let line = reader.next().unwrap().unwrap();
//! assert_eq!(line.name, "DTSTART");
//! assert_eq!(line.params.get_tzid(), Some("Europe/Berlin"));
//! assert_eq!(line.value, "20240101T090000");
//! ```

use derive_more::From;
use std::fmt;
use std::iter::Iterator;

use super::{Line, LineReader};
use crate::{
    PARAM_DELIMITER, PARAM_NAME_DELIMITER, PARAM_QUOTE, PARAM_VALUE_DELIMITER, VALUE_DELIMITER,
};

/// Error arising when trying to split a content line
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ContentLineError {
    #[error("Line {0}: Missing property name.")]
    MissingName(usize),
    #[error("Line {0}: Missing a closing quote.")]
    MissingClosingQuote(usize),
    #[error("Line {0}: Missing a \"{1}\" delimiter.")]
    MissingDelimiter(usize, char),
    #[error("Line {0}: Missing content after \"{1}\".")]
    MissingContentAfter(usize, char),
    #[error("Line {0}: Missing a parameter key.")]
    MissingParamKey(usize),
    #[error("Line {0}: Missing value.")]
    MissingValue(usize),
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Hash, From)]
pub struct ContentLineParams(pub(crate) Vec<(String, Vec<String>)>);

impl ContentLineParams {
    #[inline]
    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| name == key)
            .and_then(|(_, value)| value.iter().map(String::as_ref).next())
    }

    #[inline]
    pub fn get_tzid(&self) -> Option<&str> {
        self.get_param("TZID").filter(|tzid| !tzid.is_empty())
    }

    #[inline]
    pub fn get_value_type(&self) -> Option<&str> {
        self.get_param("VALUE")
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A single ICAL property line.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash)]
pub struct ContentLine {
    /// Property name.
    pub name: String,
    /// Property list of parameters.
    pub params: ContentLineParams,
    /// Property value, possibly empty.
    pub value: String,
}

impl fmt::Display for ContentLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "name: {}\nparams: {:?}\nvalue: {:?}",
            self.name, self.params, self.value
        )
    }
}

pub struct ContentLineParser<'a>(LineReader<'a>);

impl<'a> ContentLineParser<'a> {
    pub fn new(input: &'a str) -> Self {
        ContentLineParser(LineReader::new(input))
    }

    pub fn from_reader(line_reader: LineReader<'a>) -> Self {
        ContentLineParser(line_reader)
    }

    /// Split a line, honouring quoted parameter values.
    pub fn parse(line: &Line) -> Result<ContentLine, ContentLineError> {
        let mut to_parse = line.as_str();

        // Find end of property name
        let Some(param_end_pos) = to_parse.find([PARAM_DELIMITER, VALUE_DELIMITER]) else {
            return Err(ContentLineError::MissingName(line.number()));
        };
        let (prop_name, remainder) = to_parse.split_at(param_end_pos);
        if prop_name.is_empty() {
            return Err(ContentLineError::MissingName(line.number()));
        }
        to_parse = remainder;

        // remainder either starts with ; or :
        let mut params = vec![];
        while to_parse.starts_with(PARAM_DELIMITER) {
            to_parse = &to_parse[1..];

            let Some((key, remainder)) = to_parse.split_once(PARAM_NAME_DELIMITER) else {
                return Err(ContentLineError::MissingDelimiter(
                    line.number(),
                    PARAM_NAME_DELIMITER,
                ));
            };
            if key.is_empty() {
                return Err(ContentLineError::MissingParamKey(line.number()));
            }
            to_parse = remainder;

            // In almost all cases we'll have one parameter value
            let mut values = Vec::with_capacity(1);

            // Loop over comma-separated parameter values
            loop {
                if to_parse.starts_with(PARAM_QUOTE) {
                    // This is a dquoted value. (NAME;Foo="Bar:Baz":value)
                    to_parse = &to_parse[1..];
                    let Some((content, remainder)) = to_parse.split_once(PARAM_QUOTE) else {
                        return Err(ContentLineError::MissingClosingQuote(line.number()));
                    };
                    values.push(content.to_owned());
                    to_parse = remainder;
                } else {
                    // This is a 'raw' value. (NAME;Foo=Bar:value)
                    let Some(delim_pos) =
                        to_parse.find([PARAM_DELIMITER, VALUE_DELIMITER, PARAM_VALUE_DELIMITER])
                    else {
                        return Err(ContentLineError::MissingContentAfter(
                            line.number(),
                            PARAM_NAME_DELIMITER,
                        ));
                    };
                    let (content, remainder) = to_parse.split_at(delim_pos);

                    values.push(content.to_owned());
                    to_parse = remainder;
                }

                if !to_parse.starts_with(PARAM_VALUE_DELIMITER) {
                    break;
                }
                to_parse = &to_parse[1..];
            }

            params.push((key.to_uppercase(), values));
        }

        if !to_parse.starts_with(VALUE_DELIMITER) {
            return Err(ContentLineError::MissingValue(line.number()));
        }
        to_parse = &to_parse[1..];
        Ok(ContentLine {
            name: prop_name.trim().to_uppercase(),
            params: params.into(),
            value: to_parse.to_owned(),
        })
    }

    /// Split at the first colon and drop the parameters.
    ///
    /// Used for lines whose parameter list is malformed but which still carry a value.
    pub fn parse_lenient(line: &Line) -> Option<ContentLine> {
        let (head, value) = line.as_str().split_once(VALUE_DELIMITER)?;
        let name = head.split(PARAM_DELIMITER).next()?.trim();
        if name.is_empty() {
            return None;
        }
        Some(ContentLine {
            name: name.to_uppercase(),
            params: ContentLineParams::default(),
            value: value.to_owned(),
        })
    }
}

impl Iterator for ContentLineParser<'_> {
    type Item = Result<ContentLine, ContentLineError>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.0.next()?;
        Some(Self::parse(&line).or_else(|err| {
            let fallback = Self::parse_lenient(&line).ok_or_else(|| err.clone())?;
            tracing::debug!(line = line.number(), error = %err, "ignoring malformed parameters");
            Ok(fallback)
        }))
    }
}
