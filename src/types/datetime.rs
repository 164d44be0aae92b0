use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;

use super::{UnresolvedZonePolicy, local_to_utc};
use crate::parser::ParserOptions;

lazy_static! {
    static ref RE_DATE: Regex = Regex::new(r"^(\d{4})(\d{2})(\d{2})$").expect("static regex");
    static ref RE_DATETIME: Regex =
        Regex::new(r"^(\d{4})(\d{2})(\d{2})T(\d{2})(\d{2})(\d{2})(Z?)$").expect("static regex");
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CalDateTimeError {
    #[error("Unrecognised date/time encoding: {0}")]
    InvalidFormat(String),
    #[error("Impossible calendar value: {0}")]
    InvalidValue(String),
    #[error("Timezone {tzid} could not be resolved for {local}")]
    UnresolvedZone { tzid: String, local: NaiveDateTime },
    #[error("Floating time {0} carries no timezone")]
    Floating(NaiveDateTime),
}

/// One of the three textual encodings of a date or date-time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalDateOrDateTime {
    /// `YYYYMMDD`
    Date(NaiveDate),
    /// `YYYYMMDDTHHMMSSZ`
    Utc(NaiveDateTime),
    /// `YYYYMMDDTHHMMSS`, to be interpreted in some zone
    Local(NaiveDateTime),
}

impl CalDateOrDateTime {
    pub fn parse(value: &str) -> Result<Self, CalDateTimeError> {
        let value = value.trim();
        if let Some(captures) = RE_DATE.captures(value) {
            let date = ymd(&captures[1], &captures[2], &captures[3])
                .ok_or_else(|| CalDateTimeError::InvalidValue(value.to_owned()))?;
            return Ok(Self::Date(date));
        }
        let captures = RE_DATETIME
            .captures(value)
            .ok_or_else(|| CalDateTimeError::InvalidFormat(value.to_owned()))?;
        let datetime = ymd(&captures[1], &captures[2], &captures[3])
            .and_then(|date| {
                date.and_hms_opt(
                    captures[4].parse().ok()?,
                    captures[5].parse().ok()?,
                    captures[6].parse().ok()?,
                )
            })
            .ok_or_else(|| CalDateTimeError::InvalidValue(value.to_owned()))?;
        Ok(if captures[7].is_empty() {
            Self::Local(datetime)
        } else {
            Self::Utc(datetime)
        })
    }

    #[inline]
    pub fn is_date(&self) -> bool {
        matches!(self, Self::Date(_))
    }
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// A normalized start or end of an occurrence.
///
/// Rendered as `YYYY-MM-DD` for all-day values and `YYYY-MM-DDTHH:MM:SSZ` for instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTime {
    Date(NaiveDate),
    Instant(DateTime<Utc>),
}

impl EventTime {
    /// Normalize a property value with its optional TZID.
    pub fn parse(
        value: &str,
        tzid: Option<&str>,
        options: &ParserOptions,
    ) -> Result<Self, CalDateTimeError> {
        match CalDateOrDateTime::parse(value)? {
            CalDateOrDateTime::Date(date) => Ok(Self::Date(date)),
            CalDateOrDateTime::Utc(datetime) => Ok(Self::Instant(datetime.and_utc())),
            CalDateOrDateTime::Local(local) => Self::from_local(local, tzid, options),
        }
    }

    /// Like [`EventTime::parse`], but for the exclusive end of an event.
    ///
    /// All-day ends are exclusive in ICS; the returned date is the last day the event covers.
    pub fn parse_end(
        value: &str,
        tzid: Option<&str>,
        options: &ParserOptions,
    ) -> Result<Self, CalDateTimeError> {
        match Self::parse(value, tzid, options)? {
            Self::Date(date) => date
                .checked_sub_days(Days::new(1))
                .map(Self::Date)
                .ok_or_else(|| CalDateTimeError::InvalidValue(value.to_owned())),
            instant => Ok(instant),
        }
    }

    /// Convert a local time, applying the configured policy when the zone is unknown.
    pub fn from_local(
        local: NaiveDateTime,
        tzid: Option<&str>,
        options: &ParserOptions,
    ) -> Result<Self, CalDateTimeError> {
        if let Some(utc) = local_to_utc(local, tzid, options.zone_resolver.as_ref()) {
            return Ok(Self::Instant(utc));
        }
        match (options.unresolved_zone, tzid) {
            (UnresolvedZonePolicy::AssumeUtc, Some(tzid)) => {
                tracing::warn!(tzid, %local, "unknown timezone, keeping local time as UTC");
                Ok(Self::Instant(local.and_utc()))
            }
            (UnresolvedZonePolicy::AssumeUtc, None) => Ok(Self::Instant(local.and_utc())),
            (UnresolvedZonePolicy::Reject, Some(tzid)) => Err(CalDateTimeError::UnresolvedZone {
                tzid: tzid.to_owned(),
                local,
            }),
            (UnresolvedZonePolicy::Reject, None) => Err(CalDateTimeError::Floating(local)),
        }
    }

    #[inline]
    pub fn is_date(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// The instant used for ordering and comparisons; dates count from midnight UTC.
    pub fn as_utc(&self) -> DateTime<Utc> {
        match self {
            Self::Date(date) => date.and_time(chrono::NaiveTime::MIN).and_utc(),
            Self::Instant(instant) => *instant,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Date(date) => *date,
            Self::Instant(instant) => instant.date_naive(),
        }
    }

    pub fn signed_duration_since(&self, other: &Self) -> TimeDelta {
        match (self, other) {
            (Self::Date(this), Self::Date(other)) => this.signed_duration_since(*other),
            _ => self.as_utc().signed_duration_since(other.as_utc()),
        }
    }

    /// Shift by `delta`, keeping all-day values all-day (whole days only).
    pub fn checked_add(&self, delta: TimeDelta) -> Option<Self> {
        match self {
            Self::Date(date) => date
                .checked_add_signed(TimeDelta::days(delta.num_days()))
                .map(Self::Date),
            Self::Instant(instant) => instant.checked_add_signed(delta).map(Self::Instant),
        }
    }

    /// Same calendar day for dates, same minute for instants.
    pub fn matches_exclusion(&self, exclusion: &Self) -> bool {
        match (self, exclusion) {
            (Self::Instant(this), Self::Instant(other)) => {
                this.timestamp().div_euclid(60) == other.timestamp().div_euclid(60)
            }
            _ => self.date() == exclusion.date(),
        }
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Instant(instant) => write!(f, "{}", instant.format("%Y-%m-%dT%H:%M:%SZ")),
        }
    }
}

impl Serialize for EventTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
