//! From feed text to the agenda: expansion of every event, then selection of what is upcoming.
//!
//! # Examples
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use ical_agenda::{ParserOptions, parse_agenda};
//!
//! let input = "BEGIN:VCALENDAR\r\n\
//!     BEGIN:VEVENT\r\n\
//!     UID:standup\r\n\
//!     SUMMARY:Standup\r\n\
//!     DTSTART:20240101T090000Z\r\n\
//!     RRULE:FREQ=DAILY;COUNT=5\r\n\
//!     END:VEVENT\r\n\
//!     END:VCALENDAR\r\n";
//! let options = ParserOptions::default().with_now(Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap());
//! let agenda = parse_agenda(input, &options);
//! assert_eq!(agenda.len(), 3);
//! assert_eq!(agenda[0].start.to_string(), "2024-01-03T09:00:00Z");
//! ```

use crate::{
    component::{EventRecord, IcalFeed},
    parser::ParserOptions,
    property::{GetProperty, RDATE, RRULE},
    rrule::RecurrenceExpander,
    types::EventTime,
};
use chrono::{DateTime, Days, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// One concrete occurrence of an event.
///
/// Optional fields are never empty strings; absent fields are left out of the JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    pub start: EventTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<EventTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Occurrence {
    /// The occurrence described by the event's own DTSTART. `None` without a usable start.
    pub fn from_event(event: &EventRecord, options: &ParserOptions) -> Option<Self> {
        let start = event.get_start(options)?;
        let end = event.get_end(&start, options);
        Some(Self::from_slot(event, start, end))
    }

    /// An occurrence at `start` carrying the text fields of `event`.
    pub fn from_slot(event: &EventRecord, start: EventTime, end: Option<EventTime>) -> Self {
        Self {
            start,
            end,
            title: event.get_title(),
            description: event.get_description(),
            address: event.get_address(),
        }
    }

    /// End if known, else start.
    pub fn effective_end(&self) -> EventTime {
        self.end.unwrap_or(self.start)
    }
}

/// Every occurrence of every event in the feed, unsorted and unfiltered.
pub fn expand(feed: &IcalFeed, options: &ParserOptions) -> Vec<Occurrence> {
    let mut occurrences = vec![];
    let mut uids = HashSet::new();

    for event in &feed.events {
        uids.extend(event.get_uid());
        if let Some(rule) = options.deletion.classify(event) {
            tracing::debug!(uid = event.get_uid(), rule, "skipping deleted event");
            continue;
        }
        let exceptions = event
            .get_uid()
            .map_or(&[][..], |uid| feed.get_exceptions(uid));
        let recurring = event.properties.contains(RRULE) || event.properties.contains(RDATE);

        if recurring || !exceptions.is_empty() {
            if let Some(expander) = RecurrenceExpander::new(event, exceptions, options) {
                occurrences.extend(expander.expand());
            }
        } else {
            occurrences.extend(Occurrence::from_event(event, options));
        }
    }

    // Exception instances without a base event in this feed stand on their own
    for uid in &feed.exception_uids {
        if uids.contains(uid.as_str()) {
            continue;
        }
        for exception in feed.get_exceptions(uid) {
            if options.deletion.is_deleted(exception) {
                continue;
            }
            tracing::debug!(uid = uid.as_str(), "emitting orphan exception instance");
            occurrences.extend(Occurrence::from_event(exception, options));
        }
    }
    occurrences
}

#[inline]
pub fn expand_feed(input: &str, options: &ParserOptions) -> Vec<Occurrence> {
    expand(&IcalFeed::parse(input), options)
}

/// The last instant of the UTC day before `now`.
pub fn cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive();
    today
        .checked_sub_days(Days::new(1))
        .unwrap_or(today)
        .and_hms_milli_opt(23, 59, 59, 999)
        .map_or(now, |cutoff| cutoff.and_utc())
}

/// Keep what ends after yesterday, earliest start first, at most `max_results`.
pub fn select(mut occurrences: Vec<Occurrence>, options: &ParserOptions) -> Vec<Occurrence> {
    let cutoff = cutoff(options.now);
    occurrences.retain(|occurrence| occurrence.effective_end().as_utc() > cutoff);
    occurrences.sort_by_key(|occurrence| occurrence.start.as_utc());
    occurrences.truncate(options.max_results);
    occurrences
}

/// Parse, expand and select in one go.
pub fn parse_agenda(input: &str, options: &ParserOptions) -> Vec<Occurrence> {
    let occurrences = expand_feed(input, options);
    tracing::debug!(count = occurrences.len(), "expanded feed");
    select(occurrences, options)
}
