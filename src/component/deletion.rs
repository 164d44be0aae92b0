//! Decide whether an event was removed from its calendar.
//!
//! Feeds rarely drop cancelled events; they mark them in one of several ways. Each way is a
//! [`DeletionRule`], and a [`DeletionClassifier`] checks them in order.

use super::EventRecord;
use crate::property::{DTSTART, METHOD, SEQUENCE, STATUS, SUMMARY};
use std::fmt;
use std::sync::Arc;

pub trait DeletionRule: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;
    fn is_deleted(&self, event: &EventRecord) -> bool;
}

/// `STATUS:CANCELLED`, any case.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusCancelled;

impl DeletionRule for StatusCancelled {
    fn name(&self) -> &'static str {
        "status-cancelled"
    }

    fn is_deleted(&self, event: &EventRecord) -> bool {
        event
            .properties
            .get_value(STATUS)
            .is_some_and(|status| status.trim().eq_ignore_ascii_case("CANCELLED"))
    }
}

/// `METHOD:CANCEL`, either on the event or inherited from the calendar.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodCancel;

impl DeletionRule for MethodCancel {
    fn name(&self) -> &'static str {
        "method-cancel"
    }

    fn is_deleted(&self, event: &EventRecord) -> bool {
        event
            .properties
            .get_value(METHOD)
            .is_some_and(|method| method.trim().eq_ignore_ascii_case("CANCEL"))
    }
}

/// SEQUENCE above a threshold.
///
/// Some servers bump the sequence of deleted events to very high values. Long-lived events
/// that are edited often also reach high sequences, so this rule can be dropped with
/// [`DeletionClassifier::without`].
#[derive(Debug, Clone, Copy)]
pub struct SequenceThreshold(pub i64);

impl Default for SequenceThreshold {
    fn default() -> Self {
        Self(100)
    }
}

impl DeletionRule for SequenceThreshold {
    fn name(&self) -> &'static str {
        "sequence-threshold"
    }

    fn is_deleted(&self, event: &EventRecord) -> bool {
        event
            .properties
            .get_value(SEQUENCE)
            .and_then(|sequence| sequence.trim().parse::<i64>().ok())
            .is_some_and(|sequence| sequence > self.0)
    }
}

/// Vendor extension properties flagging a deleted event.
///
/// A marker counts unless its value is `FALSE`.
#[derive(Debug, Clone, Copy)]
pub struct VendorMarkers(pub &'static [&'static str]);

impl VendorMarkers {
    pub const KNOWN: &'static [&'static str] = &[
        "X-MOZ-DELETED",
        "X-MICROSOFT-CDO-DELETED",
        "X-DELETED",
        "X-GOOGLE-DELETED",
    ];
}

impl Default for VendorMarkers {
    fn default() -> Self {
        Self(Self::KNOWN)
    }
}

impl DeletionRule for VendorMarkers {
    fn name(&self) -> &'static str {
        "vendor-markers"
    }

    fn is_deleted(&self, event: &EventRecord) -> bool {
        self.0.iter().any(|marker| {
            event
                .properties
                .get(marker)
                .is_some_and(|prop| !prop.value.trim().eq_ignore_ascii_case("FALSE"))
        })
    }
}

/// Neither DTSTART nor SUMMARY: nothing worth showing survived.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingStartAndTitle;

impl DeletionRule for MissingStartAndTitle {
    fn name(&self) -> &'static str {
        "missing-start-and-title"
    }

    fn is_deleted(&self, event: &EventRecord) -> bool {
        event.properties.get_value(DTSTART).is_none()
            && event.properties.get_value(SUMMARY).is_none()
    }
}

/// Ordered set of deletion rules; an event is deleted as soon as one of them fires.
///
/// TRANSP and busy-status markers only say how an event affects free time, they are never
/// treated as deletion.
#[derive(Debug, Clone)]
pub struct DeletionClassifier {
    rules: Vec<Arc<dyn DeletionRule>>,
}

impl Default for DeletionClassifier {
    fn default() -> Self {
        Self::standard()
    }
}

impl DeletionClassifier {
    pub fn standard() -> Self {
        Self::empty()
            .with_rule(StatusCancelled)
            .with_rule(MethodCancel)
            .with_rule(SequenceThreshold::default())
            .with_rule(VendorMarkers::default())
            .with_rule(MissingStartAndTitle)
    }

    pub fn empty() -> Self {
        Self { rules: vec![] }
    }

    pub fn with_rule(mut self, rule: impl DeletionRule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Remove every rule called `name`.
    pub fn without(mut self, name: &str) -> Self {
        self.rules.retain(|rule| rule.name() != name);
        self
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|rule| rule.name())
    }

    /// Name of the first rule that considers `event` deleted.
    pub fn classify(&self, event: &EventRecord) -> Option<&'static str> {
        self.rules
            .iter()
            .find(|rule| rule.is_deleted(event))
            .map(|rule| rule.name())
    }

    #[inline]
    pub fn is_deleted(&self, event: &EventRecord) -> bool {
        self.classify(event).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::{DeletionClassifier, SequenceThreshold};
    use crate::component::{EventRecord, RawProperties};
    use crate::parser::ContentLineParser;
    use rstest::rstest;

    fn event(input: &str) -> EventRecord {
        let mut props = RawProperties::default();
        for line in ContentLineParser::new(input) {
            props.insert(line.unwrap());
        }
        props.into()
    }

    #[rstest]
    #[case("STATUS:CANCELLED", Some("status-cancelled"))]
    #[case("STATUS:cancelled", Some("status-cancelled"))]
    #[case("STATUS:CONFIRMED", None)]
    #[case("METHOD:CANCEL", Some("method-cancel"))]
    #[case("METHOD:REQUEST", None)]
    #[case("SEQUENCE:101", Some("sequence-threshold"))]
    #[case("SEQUENCE:100", None)]
    #[case("SEQUENCE:many", None)]
    #[case("X-MOZ-DELETED:TRUE", Some("vendor-markers"))]
    #[case("X-GOOGLE-DELETED:1", Some("vendor-markers"))]
    #[case("X-MOZ-DELETED:FALSE", None)]
    #[case("TRANSP:TRANSPARENT", None)]
    #[case("X-MICROSOFT-CDO-BUSYSTATUS:FREE", None)]
    fn standard_rules(#[case] line: &str, #[case] rule: Option<&str>) {
        let input = format!("UID:1\nSUMMARY:Title\nDTSTART:20240101T090000Z\n{line}");
        assert_eq!(DeletionClassifier::standard().classify(&event(&input)), rule);
    }

    #[rstest]
    #[case("UID:1", true)]
    #[case("UID:1\nSUMMARY:only a title", false)]
    #[case("UID:1\nDTSTART:20240101", false)]
    #[case("UID:1\nSUMMARY:\nDTSTART:", true)]
    fn missing_start_and_title(#[case] input: &str, #[case] deleted: bool) {
        assert_eq!(DeletionClassifier::standard().is_deleted(&event(input)), deleted);
    }

    #[test]
    fn first_matching_rule_wins() {
        let input = "UID:1\nSTATUS:CANCELLED\nMETHOD:CANCEL\nSEQUENCE:500";
        assert_eq!(
            DeletionClassifier::standard().classify(&event(input)),
            Some("status-cancelled")
        );
    }

    #[test]
    fn rules_can_be_removed_and_replaced() {
        let input = "UID:1\nSUMMARY:edited a lot\nSEQUENCE:250";
        let classifier = DeletionClassifier::standard().without("sequence-threshold");
        assert!(!classifier.is_deleted(&event(input)));
        assert!(!classifier.rule_names().any(|name| name == "sequence-threshold"));

        let classifier = classifier.with_rule(SequenceThreshold(1000));
        assert!(!classifier.is_deleted(&event(input)));
        assert!(classifier.is_deleted(&event("UID:1\nSUMMARY:x\nSEQUENCE:1001")));
    }

    #[test]
    fn empty_classifier_keeps_everything() {
        assert!(!DeletionClassifier::empty().is_deleted(&event("STATUS:CANCELLED")));
    }
}
