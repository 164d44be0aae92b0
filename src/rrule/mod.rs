//! The subset of RFC 5545 recurrence rules the agenda understands.
//!
//! Only `FREQ`, `UNTIL`, `COUNT`, `INTERVAL` and (for weekly rules) `BYDAY` are honoured. Other
//! rule parts are ignored, so a rule using them expands to a superset of its real occurrences.

mod expand;
pub use expand::RecurrenceExpander;

use crate::types::CalDateOrDateTime;
use chrono::Weekday;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    /// Any other (or missing) `FREQ`. Expansion stops after the first slot.
    Unsupported(String),
}

impl From<&str> for Frequency {
    fn from(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "DAILY" => Self::Daily,
            "WEEKLY" => Self::Weekly,
            "MONTHLY" => Self::Monthly,
            "YEARLY" => Self::Yearly,
            other => Self::Unsupported(other.to_owned()),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "DAILY"),
            Self::Weekly => write!(f, "WEEKLY"),
            Self::Monthly => write!(f, "MONTHLY"),
            Self::Yearly => write!(f, "YEARLY"),
            Self::Unsupported(freq) => write!(f, "{freq}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RRuleSpec {
    pub freq: Frequency,
    /// Still in its textual encoding; its frame depends on the event's DTSTART.
    pub until: Option<CalDateOrDateTime>,
    pub count: Option<u32>,
    pub interval: u32,
    /// Monday-first, without duplicates. Only used by weekly rules.
    pub byday: Vec<Weekday>,
}

impl Default for RRuleSpec {
    fn default() -> Self {
        Self {
            freq: Frequency::Unsupported(String::new()),
            until: None,
            count: None,
            interval: 1,
            byday: vec![],
        }
    }
}

impl RRuleSpec {
    /// Parse a rule leniently: parts that cannot be understood are logged and skipped.
    pub fn parse(value: &str) -> Self {
        let mut rule = Self::default();
        for part in value.split(';').filter(|part| !part.trim().is_empty()) {
            let Some((key, value)) = part.split_once('=') else {
                tracing::debug!(part, "ignoring RRULE part without value");
                continue;
            };
            let value = value.trim();
            match key.trim().to_uppercase().as_str() {
                "FREQ" => rule.freq = Frequency::from(value),
                "UNTIL" => {
                    rule.until = CalDateOrDateTime::parse(value)
                        .inspect_err(|err| tracing::debug!(error = %err, "ignoring UNTIL"))
                        .ok()
                }
                "COUNT" => rule.count = value.parse::<u32>().ok().filter(|count| *count > 0),
                "INTERVAL" => rule.interval = value.parse::<u32>().unwrap_or(1).max(1),
                "BYDAY" => rule.byday = parse_byday(value),
                other => tracing::trace!(part = other, "unsupported RRULE part"),
            }
        }
        rule
    }

    /// Whether `weekday` passes the weekday filter.
    pub fn includes(&self, weekday: Weekday) -> bool {
        self.freq != Frequency::Weekly || self.byday.is_empty() || self.byday.contains(&weekday)
    }
}

/// Weekday codes of a BYDAY list. Ordinal prefixes such as `+1` or `-2` are dropped.
fn parse_byday(value: &str) -> Vec<Weekday> {
    let mut days: Vec<Weekday> = value
        .split(',')
        .filter_map(|code| {
            let code = code
                .trim()
                .trim_start_matches(|c: char| c == '+' || c == '-' || c.is_ascii_digit());
            weekday(code)
        })
        .collect();
    days.sort_by_key(Weekday::num_days_from_monday);
    days.dedup();
    days
}

fn weekday(code: &str) -> Option<Weekday> {
    Some(match code.to_uppercase().as_str() {
        "MO" => Weekday::Mon,
        "TU" => Weekday::Tue,
        "WE" => Weekday::Wed,
        "TH" => Weekday::Thu,
        "FR" => Weekday::Fri,
        "SA" => Weekday::Sat,
        "SU" => Weekday::Sun,
        _ => return None,
    })
}
