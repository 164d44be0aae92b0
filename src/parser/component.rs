use crate::{
    component::{EventRecord, IcalFeed, RawProperties},
    parser::ContentLineParser,
    property::METHOD,
};

const VEVENT: &str = "VEVENT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Begin,
    End,
    Method,
    Property,
}

/// Groups content lines into events.
///
/// The first pass collects the properties of every `VEVENT` block, the second pass
/// ([`IcalFeed::from_events`]) separates base events from exception instances. Lines outside
/// events, except a calendar-level METHOD, are ignored. So are the properties of components
/// nested inside an event, such as `VALARM`.
pub struct ComponentParser<'a> {
    line_parser: ContentLineParser<'a>,
    method: Option<String>,
}

impl<'a> ComponentParser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::from_line_parser(ContentLineParser::new(input))
    }

    pub fn from_line_parser(line_parser: ContentLineParser<'a>) -> Self {
        ComponentParser {
            line_parser,
            method: None,
        }
    }

    pub fn parse(mut self) -> IcalFeed {
        let events = self.collect_events();
        IcalFeed::from_events(events, self.method.as_deref())
    }

    fn collect_events(&mut self) -> Vec<EventRecord> {
        let mut events = vec![];
        let mut current: Option<RawProperties> = None;
        // Depth of components nested in the current event
        let mut nested = 0usize;

        for line in self.line_parser.by_ref() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    tracing::debug!(error = %err, "skipping malformed line");
                    continue;
                }
            };
            let component = line.value.trim().to_uppercase();
            let kind = match line.name.as_str() {
                "BEGIN" => LineKind::Begin,
                "END" => LineKind::End,
                METHOD => LineKind::Method,
                _ => LineKind::Property,
            };

            match (kind, current.is_some()) {
                (LineKind::Begin, open) if component == VEVENT => {
                    if open {
                        tracing::debug!("discarding VEVENT without END");
                    }
                    current = Some(RawProperties::default());
                    nested = 0;
                }
                (LineKind::End, true) if component == VEVENT && nested == 0 => {
                    events.extend(current.take().map(EventRecord::from));
                }
                (LineKind::Begin, true) => nested += 1,
                (LineKind::End, true) => nested = nested.saturating_sub(1),
                (_, true) if nested == 0 => {
                    if let Some(props) = current.as_mut() {
                        props.insert(line);
                    }
                }
                (LineKind::Method, false) => self.method = Some(line.value.trim().to_owned()),
                _ => {}
            }
        }

        if current.is_some() {
            tracing::debug!("discarding VEVENT without END");
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::ComponentParser;
    use crate::property::GetProperty;

    #[test]
    fn groups_events() {
        let input = "BEGIN:VCALENDAR\r\n\
            VERSION:2.0\r\n\
            SUMMARY:calendar level\r\n\
            BEGIN:VEVENT\r\n\
            UID:1\r\n\
            SUMMARY:first\r\n\
            END:VEVENT\r\n\
            BEGIN:VEVENT\r\n\
            UID:2\r\n\
            SUMMARY:second\r\n\
            END:VEVENT\r\n\
            END:VCALENDAR\r\n";
        let feed = ComponentParser::new(input).parse();
        let titles: Vec<_> = feed.events.iter().filter_map(|e| e.get_title()).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }

    #[test]
    fn works_without_vcalendar() {
        let feed = ComponentParser::new("BEGIN:VEVENT\nUID:1\nEND:VEVENT").parse();
        assert_eq!(feed.events.len(), 1);
    }

    #[test]
    fn skips_nested_components() {
        let input = "BEGIN:VEVENT\n\
            UID:1\n\
            DESCRIPTION:event\n\
            BEGIN:VALARM\n\
            ACTION:DISPLAY\n\
            DESCRIPTION:alarm\n\
            END:VALARM\n\
            SUMMARY:after alarm\n\
            END:VEVENT";
        let feed = ComponentParser::new(input).parse();
        let event = &feed.events[0];
        assert_eq!(event.get_description().as_deref(), Some("event"));
        assert_eq!(event.get_title().as_deref(), Some("after alarm"));
        assert!(!event.properties.contains("ACTION"));
    }

    #[test]
    fn skips_malformed_lines() {
        let input = "BEGIN:VEVENT\nUID:1\nthis line has no colon\nSUMMARY:kept\nEND:VEVENT";
        let feed = ComponentParser::new(input).parse();
        assert_eq!(feed.events[0].get_title().as_deref(), Some("kept"));
        assert_eq!(feed.events[0].properties.len(), 2);
    }

    #[test]
    fn drops_unterminated_events() {
        let input = "BEGIN:VEVENT\nUID:1\nBEGIN:VEVENT\nUID:2\nEND:VEVENT\nBEGIN:VEVENT\nUID:3";
        let feed = ComponentParser::new(input).parse();
        assert_eq!(feed.events.len(), 1);
        assert_eq!(feed.events[0].get_uid(), Some("2"));
    }

    #[test]
    fn lowercase_component_names() {
        let feed = ComponentParser::new("begin:vevent\nuid:1\nend:vevent").parse();
        assert_eq!(feed.events[0].get_uid(), Some("1"));
    }

    #[test]
    fn calendar_method() {
        let input = "BEGIN:VCALENDAR\nMETHOD:CANCEL\nBEGIN:VEVENT\nUID:1\nEND:VEVENT\nEND:VCALENDAR";
        let feed = ComponentParser::new(input).parse();
        assert_eq!(feed.events[0].properties.get_value("METHOD"), Some("CANCEL"));
    }
}
