//! Typed access to the properties the occurrence engine reads.

use crate::{
    component::{EventRecord, PropertyValue},
    parser::ParserOptions,
    rrule::RRuleSpec,
    types::{EventTime, parse_duration, sanitize_address, sanitize_text},
};

pub const UID: &str = "UID";
pub const DTSTART: &str = "DTSTART";
pub const DTEND: &str = "DTEND";
pub const DURATION: &str = "DURATION";
pub const SUMMARY: &str = "SUMMARY";
pub const DESCRIPTION: &str = "DESCRIPTION";
pub const LOCATION: &str = "LOCATION";
pub const STATUS: &str = "STATUS";
pub const METHOD: &str = "METHOD";
pub const SEQUENCE: &str = "SEQUENCE";
pub const RRULE: &str = "RRULE";
pub const EXDATE: &str = "EXDATE";
pub const RDATE: &str = "RDATE";
pub const RECURRENCE_ID: &str = "RECURRENCE-ID";

pub trait GetProperty {
    fn raw(&self, name: &str) -> Option<&PropertyValue>;
    fn raw_all(&self, name: &str) -> &[PropertyValue];

    /// Normalize a single date/time property. Unparseable values count as absent.
    fn get_time(&self, name: &str, options: &ParserOptions) -> Option<EventTime> {
        let prop = self.raw(name)?;
        EventTime::parse(&prop.value, prop.tzid.as_deref(), options)
            .inspect_err(|err| tracing::debug!(property = name, error = %err, "ignoring value"))
            .ok()
    }

    fn get_start(&self, options: &ParserOptions) -> Option<EventTime> {
        self.get_time(DTSTART, options)
    }

    /// The inclusive end: DTEND, or DTSTART + DURATION.
    fn get_end(&self, start: &EventTime, options: &ParserOptions) -> Option<EventTime> {
        if let Some(prop) = self.raw(DTEND) {
            return EventTime::parse_end(&prop.value, prop.tzid.as_deref(), options)
                .inspect_err(|err| tracing::debug!(property = DTEND, error = %err, "ignoring value"))
                .ok();
        }
        let duration = parse_duration(&self.raw(DURATION)?.value)
            .inspect_err(|err| tracing::debug!(property = DURATION, error = %err, "ignoring value"))
            .ok()?;
        let end = start.checked_add(duration)?;
        match end {
            // Exclusive like DTEND, so a one-day event ends on its start date
            EventTime::Date(_) if duration.num_days() > 0 => {
                end.checked_add(chrono::TimeDelta::days(-1))
            }
            _ => Some(end),
        }
    }

    fn get_recurrence_id(&self, options: &ParserOptions) -> Option<EventTime> {
        self.get_time(RECURRENCE_ID, options)
    }

    /// Every value of a list property such as EXDATE or RDATE.
    ///
    /// PERIOD values contribute their start.
    fn get_time_list(&self, name: &str, options: &ParserOptions) -> Vec<EventTime> {
        self.raw_all(name)
            .iter()
            .flat_map(|prop| {
                prop.value
                    .split(',')
                    .filter(|value| !value.trim().is_empty())
                    .filter_map(move |value| {
                        let value = value.split('/').next().unwrap_or(value);
                        EventTime::parse(value, prop.tzid.as_deref(), options)
                            .inspect_err(
                                |err| tracing::debug!(property = name, error = %err, "ignoring value"),
                            )
                            .ok()
                    })
            })
            .collect()
    }

    fn get_rrule(&self) -> Option<RRuleSpec> {
        self.raw(RRULE)
            .filter(|prop| !prop.value.trim().is_empty())
            .map(|prop| RRuleSpec::parse(&prop.value))
    }

    fn get_title(&self) -> Option<String> {
        sanitize_text(&self.raw(SUMMARY)?.value)
    }

    fn get_description(&self) -> Option<String> {
        sanitize_text(&self.raw(DESCRIPTION)?.value)
    }

    fn get_address(&self) -> Option<String> {
        sanitize_address(&self.raw(LOCATION)?.value)
    }
}

impl GetProperty for EventRecord {
    #[inline]
    fn raw(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    #[inline]
    fn raw_all(&self, name: &str) -> &[PropertyValue] {
        self.properties.get_all(name)
    }
}
