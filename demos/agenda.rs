use ical_agenda::{ParserOptions, parse_agenda};
use std::fs::read_to_string;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "./tests/resources/team.ics".to_owned());
    let buf = read_to_string(&path).unwrap();

    let agenda = parse_agenda(&buf, &ParserOptions::default());
    tracing::info!(path = path.as_str(), occurrences = agenda.len(), "agenda ready");
    println!("{}", serde_json::to_string_pretty(&agenda).unwrap());
}
