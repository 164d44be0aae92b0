//! Events as grouped by [`ComponentParser`](crate::ComponentParser).
//!
//! An ICS feed is reduced to a list of base events and, per UID, the exception instances
//! (events carrying a RECURRENCE-ID) overriding single occurrences of a base event.
//!
//! # Examples
//!
//! ```rust
//! let input = "BEGIN:VEVENT\r\nUID:1\r\nSUMMARY:first\r\nSUMMARY:second\r\nEND:VEVENT\r\n";
//! let feed = ical_agenda::IcalFeed::parse(input);
//! assert_eq!(feed.events.len(), 1);
//! assert_eq!(feed.events[0].properties.get_value("SUMMARY"), Some("second"));
//! ```

mod deletion;
pub use deletion::*;

use crate::parser::{ComponentParser, ContentLine};
use crate::property::{METHOD, RECURRENCE_ID, UID};
use std::collections::HashMap;

/// A property value together with the zone context it was given in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyValue {
    pub value: String,
    /// The TZID parameter, if any.
    pub tzid: Option<String>,
}

impl From<ContentLine> for PropertyValue {
    fn from(line: ContentLine) -> Self {
        Self {
            tzid: line.params.get_tzid().map(str::to_owned),
            value: line.value,
        }
    }
}

/// Properties of one event, keyed by parameter-stripped name.
///
/// EXDATE, RDATE and EXRULE keep every occurrence in order. All other properties are
/// single-valued: a repeated key silently replaces the earlier value (last write wins), which
/// keeps permissive real-world feeds usable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawProperties {
    single: HashMap<String, PropertyValue>,
    multi: HashMap<String, Vec<PropertyValue>>,
}

impl RawProperties {
    pub const MULTI_VALUED: &'static [&'static str] = &["EXDATE", "RDATE", "EXRULE"];

    pub fn insert(&mut self, line: ContentLine) {
        if Self::MULTI_VALUED.contains(&line.name.as_str()) {
            self.multi
                .entry(line.name.clone())
                .or_default()
                .push(line.into());
        } else {
            self.single.insert(line.name.clone(), line.into());
        }
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.single.get(name)
    }

    /// Value of a single-valued property; empty values count as absent.
    #[inline]
    pub fn get_value(&self, name: &str) -> Option<&str> {
        self.get(name)
            .map(|prop| prop.value.as_str())
            .filter(|value| !value.trim().is_empty())
    }

    /// All values of a multi-valued property, in feed order.
    pub fn get_all(&self, name: &str) -> &[PropertyValue] {
        self.multi.get(name).map_or(&[], Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.single.contains_key(name) || self.multi.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.single.len() + self.multi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.single.is_empty() && self.multi.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventRecord {
    pub properties: RawProperties,
}

impl From<RawProperties> for EventRecord {
    fn from(properties: RawProperties) -> Self {
        Self { properties }
    }
}

impl EventRecord {
    pub fn get_uid(&self) -> Option<&str> {
        self.properties.get_value(UID).map(str::trim)
    }

    /// The RECURRENCE-ID of an exception instance.
    pub fn get_recurid(&self) -> Option<&PropertyValue> {
        self.properties
            .get(RECURRENCE_ID)
            .filter(|prop| !prop.value.trim().is_empty())
    }

    #[inline]
    pub fn is_exception(&self) -> bool {
        self.get_recurid().is_some()
    }
}

/// The events of one ICS feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IcalFeed {
    /// Events without RECURRENCE-ID, in feed order.
    pub events: Vec<EventRecord>,
    /// Exception instances by the UID of the event they override.
    pub exceptions: HashMap<String, Vec<EventRecord>>,
    /// Keys of `exceptions` in the order their first instance appeared.
    pub exception_uids: Vec<String>,
}

impl IcalFeed {
    pub fn parse(input: &str) -> Self {
        ComponentParser::new(input).parse()
    }

    /// Route events to the base list or the exception index.
    ///
    /// A calendar-level METHOD is copied into events that lack their own.
    pub fn from_events(events: Vec<EventRecord>, method: Option<&str>) -> Self {
        let mut feed = Self::default();
        for mut event in events {
            if let Some(method) = method
                && !event.properties.contains(METHOD)
            {
                event.properties.insert(ContentLine {
                    name: METHOD.to_owned(),
                    value: method.to_owned(),
                    ..Default::default()
                });
            }

            if !event.is_exception() {
                feed.events.push(event);
                continue;
            }
            let Some(uid) = event.get_uid().map(str::to_owned) else {
                tracing::debug!("dropping RECURRENCE-ID instance without UID");
                continue;
            };
            if !feed.exceptions.contains_key(&uid) {
                feed.exception_uids.push(uid.clone());
            }
            feed.exceptions.entry(uid).or_default().push(event);
        }
        feed
    }

    /// Exception instances overriding occurrences of the event with `uid`.
    pub fn get_exceptions(&self, uid: &str) -> &[EventRecord] {
        self.exceptions.get(uid).map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::{EventRecord, IcalFeed, RawProperties};
    use crate::parser::ContentLineParser;

    fn properties(input: &str) -> RawProperties {
        let mut props = RawProperties::default();
        for line in ContentLineParser::new(input) {
            props.insert(line.unwrap());
        }
        props
    }

    #[test]
    fn last_write_wins() {
        let props = properties("SUMMARY:one\nSUMMARY:two\nDESCRIPTION:x");
        assert_eq!(props.get_value("SUMMARY"), Some("two"));
        assert_eq!(props.len(), 2);
    }

    #[test]
    fn multi_valued_keep_order_and_zone() {
        let props = properties(
            "EXDATE;TZID=Europe/Berlin:20240101T090000\nEXDATE:20240108T080000Z,20240115T080000Z",
        );
        let exdates = props.get_all("EXDATE");
        assert_eq!(exdates.len(), 2);
        assert_eq!(exdates[0].tzid.as_deref(), Some("Europe/Berlin"));
        assert_eq!(exdates[1].value, "20240108T080000Z,20240115T080000Z");
        assert_eq!(exdates[1].tzid, None);
        assert!(props.get("EXDATE").is_none());
        assert!(props.get_all("RDATE").is_empty());
    }

    #[test]
    fn unknown_keys_are_kept() {
        let props = properties("X-WR-CALNAME:Team\nX-CUSTOM;FOO=bar:baz");
        assert_eq!(props.get_value("X-CUSTOM"), Some("baz"));
        assert!(props.contains("X-WR-CALNAME"));
    }

    #[test]
    fn empty_values_are_absent() {
        let props = properties("SUMMARY:\nUID:  ");
        assert!(props.contains("SUMMARY"));
        assert_eq!(props.get_value("SUMMARY"), None);
        assert_eq!(EventRecord::from(props).get_uid(), None);
    }

    #[test]
    fn routes_exceptions() {
        let base = EventRecord::from(properties("UID:a\nDTSTART:20240101T090000Z"));
        let exception = EventRecord::from(properties(
            "UID:a\nRECURRENCE-ID:20240108T090000Z\nDTSTART:20240108T100000Z",
        ));
        let orphan = EventRecord::from(properties("RECURRENCE-ID:20240108T090000Z"));
        let feed = IcalFeed::from_events(vec![base, exception, orphan], None);
        assert_eq!(feed.events.len(), 1);
        assert_eq!(feed.get_exceptions("a").len(), 1);
        assert_eq!(feed.exceptions.len(), 1);
        assert_eq!(feed.exception_uids, vec!["a"]);
        assert!(feed.get_exceptions("b").is_empty());
    }

    #[test]
    fn inherits_calendar_method() {
        let own = EventRecord::from(properties("UID:a\nMETHOD:PUBLISH"));
        let inherited = EventRecord::from(properties("UID:b"));
        let feed = IcalFeed::from_events(vec![own, inherited], Some("CANCEL"));
        assert_eq!(feed.events[0].properties.get_value("METHOD"), Some("PUBLISH"));
        assert_eq!(feed.events[1].properties.get_value("METHOD"), Some("CANCEL"));
    }
}
