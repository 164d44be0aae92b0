const PARAM_VALUE_DELIMITER: char = ',';
const VALUE_DELIMITER: char = ':';
const PARAM_DELIMITER: char = ';';
const PARAM_NAME_DELIMITER: char = '=';
const PARAM_QUOTE: char = '"';

pub mod parser;
pub use parser::{ComponentParser, ContentLineParser, LineReader, ParserOptions};

pub mod component;
pub use component::{EventRecord, IcalFeed, RawProperties};

pub mod property;

pub mod types;
pub use types::EventTime;

pub mod rrule;

pub mod agenda;
pub use agenda::{Occurrence, expand_feed, parse_agenda};

pub mod source;
