use chrono::{DateTime, TimeZone, Utc};
use ical_agenda::{
    IcalFeed, Occurrence, ParserOptions,
    agenda::{expand, select},
    component::DeletionClassifier,
    expand_feed, parse_agenda,
    types::{NoZoneDatabase, UnresolvedZonePolicy},
};
use rstest::rstest;
use std::sync::Arc;

const TEAM: &str = include_str!("resources/team.ics");
const BROKEN: &str = include_str!("resources/broken.ics");

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()
}

fn options() -> ParserOptions {
    ParserOptions::default().with_now(now())
}

fn summary(occurrences: &[Occurrence]) -> Vec<String> {
    occurrences
        .iter()
        .map(|occurrence| {
            format!(
                "{} {}",
                occurrence.start,
                occurrence.title.as_deref().unwrap_or("-")
            )
        })
        .collect()
}

fn vevent(lines: &str) -> String {
    format!("BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:test\r\nSUMMARY:Test\r\n{lines}\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n")
}

#[cfg(feature = "chrono-tz")]
mod team_feed {
    use super::{TEAM, options, summary};
    use ical_agenda::{IcalFeed, parse_agenda};

    #[test_log::test]
    fn agenda() {
        let agenda = parse_agenda(TEAM, &options());
        similar_asserts::assert_eq!(
            summary(&agenda).join("\n"),
            [
                "2024-01-10T08:30:00Z Daily standup",
                "2024-01-11T09:00:00Z Quarterly review",
                "2024-01-15 Team offsite",
                "2024-01-15T08:30:00Z Daily standup",
                "2024-01-17T13:00:00Z Standup (moved)",
                "2024-01-19T08:30:00Z Daily standup",
                "2024-01-20T11:00:00Z Guest talk",
                "2024-01-22T08:30:00Z Daily standup",
                "2024-01-24T08:30:00Z Daily standup",
                "2024-01-26T08:30:00Z Daily standup",
                "2024-01-29T08:30:00Z Daily standup",
                "2024-01-31T08:30:00Z Daily standup",
            ]
            .join("\n")
        );
    }

    #[test]
    fn grouping() {
        let feed = IcalFeed::parse(TEAM);
        assert_eq!(feed.events.len(), 6);
        assert_eq!(feed.get_exceptions("standup@example.com").len(), 1);
        assert_eq!(feed.get_exceptions("guest@elsewhere.example.org").len(), 1);
    }

    #[test]
    fn json_body() {
        let agenda = parse_agenda(TEAM, &options());
        insta::assert_snapshot!(serde_json::to_string(&agenda[..3]).unwrap(), @r#"[{"start":"2024-01-10T08:30:00Z","end":"2024-01-10T09:00:00Z","title":"Daily standup","address":"Room 2"},{"start":"2024-01-11T09:00:00Z","end":"2024-01-11T10:30:00Z","title":"Quarterly review","description":"Agenda: - numbers - hiring plan for the next quarter and the budget"},{"start":"2024-01-15","end":"2024-01-16","title":"Team offsite","address":"Hotel Berg, Zimmer 3, Alpenstraße 1"}]"#);
    }
}

#[test_log::test]
fn broken_feed_degrades_gracefully() {
    let agenda = parse_agenda(BROKEN, &options());
    let expected = if cfg!(feature = "chrono-tz") {
        "2024-01-11T08:00:00Z Hourly\n2024-01-11T09:00:00Z Survives the noise\n2024-01-12T07:00:00Z Unknown zone"
    } else {
        // Without a zone database Europe/Berlin is kept as UTC too
        "2024-01-11T08:00:00Z Hourly\n2024-01-11T10:00:00Z Survives the noise\n2024-01-12T07:00:00Z Unknown zone"
    };
    similar_asserts::assert_eq!(summary(&agenda).join("\n"), expected);
    assert_eq!(agenda.iter().find(|o| o.title.as_deref() == Some("Survives the noise")).unwrap().end, None);
}

#[test]
fn rejecting_unresolved_zones() {
    let options = options()
        .with_zone_resolver(Arc::new(NoZoneDatabase))
        .with_unresolved_zone(UnresolvedZonePolicy::Reject);
    let agenda = parse_agenda(BROKEN, &options);
    similar_asserts::assert_eq!(summary(&agenda), vec!["2024-01-11T08:00:00Z Hourly".to_owned()]);
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(7)]
fn daily_count_respects_interval(#[case] interval: i64) {
    let input = vevent(&format!(
        "DTSTART:20240101T090000Z\r\nRRULE:FREQ=DAILY;COUNT=5;INTERVAL={interval}"
    ));
    let occurrences = expand_feed(&input, &options());
    assert_eq!(occurrences.len(), 5);
    for pair in occurrences.windows(2) {
        assert_eq!(
            pair[1].start.signed_duration_since(&pair[0].start),
            chrono::TimeDelta::days(interval)
        );
    }
}

#[rstest]
#[case("DTSTART;VALUE=DATE:20240101\r\nEXDATE;VALUE=DATE:20240103", "2024-01-03")]
#[case("DTSTART:20240101T090000Z\r\nEXDATE:20240103T090059Z", "2024-01-03T09:00:00Z")]
fn exdate_removes_one_slot(#[case] lines: &str, #[case] excluded: &str) {
    let input = vevent(&format!("{lines}\r\nRRULE:FREQ=DAILY;COUNT=5"));
    let starts: Vec<_> = expand_feed(&input, &options())
        .iter()
        .map(|occurrence| occurrence.start.to_string())
        .collect();
    assert_eq!(starts.len(), 5);
    assert!(!starts.iter().any(|start| start == excluded));
}

#[test]
fn weekly_byday_example() {
    let input = vevent("DTSTART:20240101T090000Z\r\nRRULE:FREQ=WEEKLY;BYDAY=MO,WE;COUNT=4");
    similar_asserts::assert_eq!(
        summary(&expand_feed(&input, &options())),
        vec![
            "2024-01-01T09:00:00Z Test".to_owned(),
            "2024-01-03T09:00:00Z Test".to_owned(),
            "2024-01-08T09:00:00Z Test".to_owned(),
            "2024-01-10T09:00:00Z Test".to_owned(),
        ]
    );
}

#[test]
fn all_day_end_is_inclusive() {
    let input = vevent("DTSTART;VALUE=DATE:20240310\r\nDTEND;VALUE=DATE:20240312\r\nRRULE:FREQ=YEARLY;COUNT=2");
    let occurrences = expand_feed(&input, &options());
    let spans: Vec<_> = occurrences
        .iter()
        .map(|o| format!("{}..{}", o.start, o.end.unwrap()))
        .collect();
    assert_eq!(spans, vec!["2024-03-10..2024-03-11", "2025-03-10..2025-03-11"]);
}

#[test]
fn cancelled_recurring_event_is_gone() {
    let input = vevent("STATUS:Cancelled\r\nDTSTART:20240111T090000Z\r\nRRULE:FREQ=DAILY;COUNT=50");
    assert!(parse_agenda(&input, &options()).is_empty());
}

#[test]
fn sequence_rule_can_be_disabled() {
    let input = vevent("SEQUENCE:240\r\nDTSTART:20240111T090000Z");
    assert!(parse_agenda(&input, &options()).is_empty());
    let options = options().with_deletion(DeletionClassifier::standard().without("sequence-threshold"));
    assert_eq!(parse_agenda(&input, &options).len(), 1);
}

#[test]
fn selector_caps_results() {
    let input = vevent("DTSTART:20240101T090000Z\r\nRRULE:FREQ=DAILY");
    let feed = IcalFeed::parse(&input);
    let all = expand(&feed, &options());
    assert_eq!(all.len(), 100);
    let agenda = select(all, &options());
    assert_eq!(agenda.len(), 25);
    assert_eq!(agenda[0].start.to_string(), "2024-01-10T09:00:00Z");
    assert_eq!(select(agenda, &options().with_max_results(3)).len(), 3);
}

#[test]
fn unescape_is_idempotent_on_plain_text() {
    use ical_agenda::types::unescape;
    for text in ["Team sync", "a, b; c", "Line\nbreak", "quote \" here"] {
        let once = unescape(text);
        assert_eq!(unescape(&once), once);
    }
}

#[test]
fn horizon_follows_now() {
    let input = vevent("DTSTART:20240101T090000Z\r\nRRULE:FREQ=MONTHLY");
    let months = |now: DateTime<Utc>| {
        expand_feed(&input, &ParserOptions::default().with_now(now)).len()
    };
    // Jan 2024 .. Jan 2026
    assert_eq!(months(now()), 25);
    assert_eq!(months(Utc.with_ymd_and_hms(2023, 1, 10, 12, 0, 0).unwrap()), 13);
}
