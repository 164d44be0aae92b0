use chrono::TimeDelta;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref RE_DURATION: Regex = Regex::new(
        r"^(?P<sign>[+-])?P(?:(?P<W>\d+)W)?(?:(?P<D>\d+)D)?(?:T(?:(?P<H>\d+)H)?(?:(?P<M>\d+)M)?(?:(?P<S>\d+)S)?)?$"
    )
    .expect("static regex");
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid duration: {0}")]
pub struct InvalidDuration(String);

/// Parse an RFC 5545 DURATION value such as `PT1H30M`, `P1W` or `-P2D`.
pub fn parse_duration(value: &str) -> Result<TimeDelta, InvalidDuration> {
    let value = value.trim();
    let invalid = || InvalidDuration(value.to_owned());
    let captures = RE_DURATION.captures(value).ok_or_else(invalid)?;
    // `P` and `PT` alone match the pattern but carry no component
    if value.ends_with(['P', 'T']) {
        return Err(invalid());
    }

    let part = |name: &str| -> Result<i64, InvalidDuration> {
        captures
            .name(name)
            .map_or(Ok(0), |m| m.as_str().parse().map_err(|_| invalid()))
    };
    let seconds = [("W", 604_800), ("D", 86_400), ("H", 3_600), ("M", 60), ("S", 1)]
        .into_iter()
        .try_fold(0i64, |acc, (name, unit)| {
            part(name)?
                .checked_mul(unit)
                .and_then(|seconds| acc.checked_add(seconds))
                .ok_or_else(invalid)
        })?;
    let delta = TimeDelta::try_seconds(seconds).ok_or_else(invalid)?;

    Ok(match captures.name("sign").map(|m| m.as_str()) {
        Some("-") => -delta,
        _ => delta,
    })
}
