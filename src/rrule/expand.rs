use super::{Frequency, RRuleSpec};
use crate::{
    agenda::Occurrence,
    component::EventRecord,
    parser::ParserOptions,
    property::{DTSTART, EXDATE, GetProperty, RDATE},
    types::{CalDateOrDateTime, EventTime, local_to_utc},
};
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use std::collections::{HashMap, HashSet};

/// Cursor positions in a row that may fail to convert before expansion gives up.
const MAX_UNCONVERTED_STEPS: usize = 1_000;
/// Periods a monthly or yearly rule may skip in a row looking for an existing date.
const MAX_SKIPPED_PERIODS: u32 = 48;

/// How cursor positions map back to event times.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Frame {
    /// All-day events: the cursor is midnight of the date.
    Date,
    Utc,
    /// Wall-clock time, converted to UTC at every position so DST changes keep the local time.
    Local(Option<String>),
}

impl Frame {
    fn event_time(&self, position: NaiveDateTime, options: &ParserOptions) -> Option<EventTime> {
        match self {
            Self::Date => Some(EventTime::Date(position.date())),
            Self::Utc => Some(EventTime::Instant(position.and_utc())),
            Self::Local(tzid) => EventTime::from_local(position, tzid.as_deref(), options).ok(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Until {
    /// Inclusive through the whole day
    Date(NaiveDate),
    Instant(DateTime<Utc>),
}

impl Until {
    fn passed_by(&self, slot: &EventTime) -> bool {
        match self {
            Self::Date(date) => slot.date() > *date,
            Self::Instant(until) => slot.as_utc() > *until,
        }
    }
}

enum Slot {
    Excluded,
    Cancelled,
    Emit(Occurrence),
}

/// Generates the occurrences of one base event.
///
/// Generated slots matching an EXDATE are dropped without counting against `COUNT`. Slots
/// overridden by an exception instance (matched on RECURRENCE-ID) emit the exception's own
/// fields instead, or nothing when the exception itself was deleted.
#[derive(Debug)]
pub struct RecurrenceExpander<'a> {
    event: &'a EventRecord,
    rule: Option<RRuleSpec>,
    start: EventTime,
    anchor: NaiveDateTime,
    frame: Frame,
    duration: Option<TimeDelta>,
    exdates: Vec<EventTime>,
    exceptions: HashMap<EventTime, &'a EventRecord>,
    options: &'a ParserOptions,
}

impl<'a> RecurrenceExpander<'a> {
    /// `None` if the event has no usable DTSTART.
    pub fn new(
        event: &'a EventRecord,
        exceptions: &'a [EventRecord],
        options: &'a ParserOptions,
    ) -> Option<Self> {
        let start = event.get_start(options)?;
        let (anchor, frame) = match event
            .raw(DTSTART)
            .map(|prop| (CalDateOrDateTime::parse(&prop.value), prop.tzid.clone()))
        {
            Some((Ok(CalDateOrDateTime::Local(local)), tzid)) => {
                let resolver = options.zone_resolver.as_ref();
                if local_to_utc(local, tzid.as_deref(), resolver).is_some() {
                    (local, Frame::Local(tzid))
                } else {
                    // Floating or unresolved: DTSTART was kept as UTC, so is every later position
                    if let Some(tzid) = tzid.as_deref() {
                        tracing::debug!(tzid, "iterating unresolved local time as UTC");
                    }
                    (local, Frame::Utc)
                }
            }
            _ => match start {
                EventTime::Date(date) => (date.and_time(chrono::NaiveTime::MIN), Frame::Date),
                EventTime::Instant(instant) => (instant.naive_utc(), Frame::Utc),
            },
        };
        let duration = event
            .get_end(&start, options)
            .map(|end| end.signed_duration_since(&start));

        let mut index = HashMap::new();
        for exception in exceptions {
            match exception.get_recurrence_id(options) {
                Some(recurid) => {
                    index.insert(recurid, exception);
                }
                None => tracing::debug!(uid = exception.get_uid(), "unusable RECURRENCE-ID"),
            }
        }

        Some(Self {
            event,
            rule: event.get_rrule(),
            start,
            anchor,
            frame,
            duration,
            exdates: event.get_time_list(EXDATE, options),
            exceptions: index,
            options,
        })
    }

    pub fn expand(&self) -> Vec<Occurrence> {
        let horizon = self.options.horizon_end();
        let mut occurrences = vec![];
        let mut seen = HashSet::new();

        match &self.rule {
            Some(rule) => self.expand_rule(rule, horizon, &mut seen, &mut occurrences),
            None => {
                seen.insert(self.start);
                if self.start.as_utc() <= horizon {
                    self.push_slot(self.start, &mut occurrences);
                }
            }
        }

        for rdate in self.event.get_time_list(RDATE, self.options) {
            if rdate.as_utc() > horizon || !seen.insert(rdate) {
                continue;
            }
            self.push_slot(rdate, &mut occurrences);
        }
        occurrences
    }

    fn expand_rule(
        &self,
        rule: &RRuleSpec,
        horizon: DateTime<Utc>,
        seen: &mut HashSet<EventTime>,
        occurrences: &mut Vec<Occurrence>,
    ) {
        let limit = rule.count.unwrap_or(self.options.default_count);
        let until = rule.until.and_then(|until| self.until_bound(until));
        let mut emitted = 0u32;
        let mut period = 0u32;
        let mut unconverted = 0usize;
        let mut cursor = Some(self.anchor);

        while let Some(position) = cursor {
            if emitted >= limit {
                break;
            }
            let Some(slot) = self.frame.event_time(position, self.options) else {
                unconverted += 1;
                if unconverted > MAX_UNCONVERTED_STEPS {
                    tracing::debug!(%position, "giving up on unconvertible positions");
                    break;
                }
                cursor = self.advance(rule, position, &mut period);
                continue;
            };
            unconverted = 0;
            if slot.as_utc() > horizon || until.is_some_and(|until| until.passed_by(&slot)) {
                break;
            }
            if rule.includes(position.weekday()) {
                seen.insert(slot);
                if self.push_slot(slot, occurrences) {
                    emitted += 1;
                }
            }
            cursor = self.advance(rule, position, &mut period);
        }
    }

    /// Returns whether the slot produced an occurrence.
    fn push_slot(&self, slot: EventTime, occurrences: &mut Vec<Occurrence>) -> bool {
        match self.resolve_slot(slot) {
            Slot::Emit(occurrence) => {
                tracing::trace!(%slot, "occurrence");
                occurrences.push(occurrence);
                true
            }
            Slot::Excluded => {
                tracing::trace!(%slot, "excluded");
                false
            }
            Slot::Cancelled => {
                tracing::trace!(%slot, "cancelled by exception");
                false
            }
        }
    }

    fn resolve_slot(&self, slot: EventTime) -> Slot {
        if self.exdates.iter().any(|exdate| slot.matches_exclusion(exdate)) {
            return Slot::Excluded;
        }
        if let Some(exception) = self.exceptions.get(&slot) {
            if let Some(rule) = self.options.deletion.classify(exception) {
                tracing::debug!(%slot, rule, "exception instance deleted");
                return Slot::Cancelled;
            }
            return match Occurrence::from_event(exception, self.options) {
                Some(occurrence) => Slot::Emit(occurrence),
                None => Slot::Cancelled,
            };
        }
        Slot::Emit(Occurrence::from_slot(self.event, slot, self.end_of(slot)))
    }

    fn end_of(&self, slot: EventTime) -> Option<EventTime> {
        slot.checked_add(self.duration?)
    }

    /// UNTIL as a comparable bound. Floating values are read in the frame of DTSTART.
    fn until_bound(&self, until: CalDateOrDateTime) -> Option<Until> {
        match until {
            CalDateOrDateTime::Date(date) => Some(Until::Date(date)),
            CalDateOrDateTime::Utc(utc) => Some(Until::Instant(utc.and_utc())),
            CalDateOrDateTime::Local(local) => match &self.frame {
                Frame::Local(tzid) => EventTime::from_local(local, tzid.as_deref(), self.options)
                    .ok()
                    .map(|until| Until::Instant(until.as_utc())),
                _ => Some(Until::Instant(local.and_utc())),
            },
        }
    }

    fn advance(
        &self,
        rule: &RRuleSpec,
        position: NaiveDateTime,
        period: &mut u32,
    ) -> Option<NaiveDateTime> {
        let interval = rule.interval.max(1);
        match rule.freq {
            Frequency::Daily => position.checked_add_days(Days::new(interval.into())),
            Frequency::Weekly if rule.byday.is_empty() => {
                position.checked_add_days(Days::new(u64::from(interval) * 7))
            }
            Frequency::Weekly => next_weekday(&rule.byday, position, interval),
            Frequency::Monthly => self.nth_period(period, interval),
            Frequency::Yearly => self.nth_period(period, interval.checked_mul(12)?),
            Frequency::Unsupported(ref freq) => {
                tracing::debug!(freq = freq.as_str(), "unsupported frequency, stopping after first slot");
                None
            }
        }
    }

    /// Step `months` further from the anchor, skipping periods where its day does not exist.
    fn nth_period(&self, period: &mut u32, months: u32) -> Option<NaiveDateTime> {
        for _ in 0..MAX_SKIPPED_PERIODS {
            *period = period.checked_add(1)?;
            let next = self
                .anchor
                .checked_add_months(Months::new(period.checked_mul(months)?))?;
            // chrono clamps to the end of shorter months
            if next.day() == self.anchor.day() {
                return Some(next);
            }
        }
        None
    }
}

/// The next listed weekday in the current Monday-based week, or the first listed weekday of the
/// week `interval` weeks later.
fn next_weekday(
    byday: &[chrono::Weekday],
    position: NaiveDateTime,
    interval: u32,
) -> Option<NaiveDateTime> {
    let current = position.weekday().num_days_from_monday();
    if let Some(next) = byday
        .iter()
        .map(|day| day.num_days_from_monday())
        .find(|day| *day > current)
    {
        return position.checked_add_days(Days::new((next - current).into()));
    }
    let first = byday.first()?.num_days_from_monday();
    position
        .checked_sub_days(Days::new(current.into()))?
        .checked_add_days(Days::new(u64::from(interval) * 7 + u64::from(first)))
}
