use chrono::{TimeZone, Utc};
use ical_agenda::{
    EventTime, IcalFeed, LineReader, ParserOptions, expand_feed, parse_agenda,
    rrule::RRuleSpec,
};
use criterion::{Criterion, criterion_group, criterion_main};

const TEAM: &str = include_str!("../tests/resources/team.ics");

fn options() -> ParserOptions {
    ParserOptions::default().with_now(Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap())
}

fn benchmark(c: &mut Criterion) {
    let options = options();

    let mut group = c.benchmark_group("parse_type");
    group.bench_function("parse date", |b| {
        b.iter(|| EventTime::parse("19700329", None, &options).unwrap())
    });
    group.bench_function("parse UTC date-time", |b| {
        b.iter(|| EventTime::parse("19700329T020000Z", None, &options).unwrap())
    });
    group.bench_function("parse zoned date-time", |b| {
        b.iter(|| EventTime::parse("19700329T020000", Some("Europe/Berlin"), &options).unwrap())
    });
    group.bench_function("parse RRULE", |b| {
        b.iter(|| RRuleSpec::parse("FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,WE,FR;UNTIL=20251231T000000Z"))
    });
    drop(group);

    let mut group = c.benchmark_group("lines");
    group.bench_function("line parse team.ics", |b| {
        b.iter(|| {
            // Consume reader
            for _ in LineReader::new(TEAM) {}
        })
    });
    drop(group);

    let mut group = c.benchmark_group("feed");
    group.bench_function("group team.ics", |b| b.iter(|| IcalFeed::parse(TEAM)));
    group.bench_function("expand team.ics", |b| b.iter(|| expand_feed(TEAM, &options)));
    group.bench_function("agenda team.ics", |b| b.iter(|| parse_agenda(TEAM, &options)));
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
