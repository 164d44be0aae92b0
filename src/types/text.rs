use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;

lazy_static! {
    static ref RE_LINE_BREAK: Regex = Regex::new(r"\r\n|\r|\n").expect("static regex");
    static ref RE_REPEATED_COMMA: Regex = Regex::new(r",(?:\s*,)+").expect("static regex");
}

/// Resolve TEXT escapes (`\n`, `\N`, `\r`, `\t`, `\,`, `\;`, `\"`, `\\`).
///
/// The input is scanned once from left to right, so an escaped backslash never starts another
/// escape. Unknown escapes are kept as they are.
pub fn unescape(text: &str) -> Cow<'_, str> {
    if !text.contains('\\') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(c @ (',' | ';' | '"' | '\\')) => out.push(c),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    Cow::Owned(out)
}

/// Clean up SUMMARY or DESCRIPTION: line breaks become spaces, whitespace runs collapse.
pub fn sanitize_text(raw: &str) -> Option<String> {
    let text = unescape(raw).split_whitespace().join(" ");
    (!text.is_empty()).then_some(text)
}

/// Clean up LOCATION: line breaks become `, ` and duplicate commas collapse.
pub fn sanitize_address(raw: &str) -> Option<String> {
    let text = unescape(raw);
    let text = RE_LINE_BREAK.replace_all(&text, ", ");
    let text = RE_REPEATED_COMMA.replace_all(&text, ",");
    let text = text.split_whitespace().join(" ");
    let text = text.trim_matches(|c: char| c == ',' || c.is_whitespace());
    (!text.is_empty()).then(|| text.to_owned())
}
