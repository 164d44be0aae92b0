use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    static ref RE_FIXED_OFFSET: Regex =
        Regex::new(r"^(?:UTC|GMT)?([+-])(\d{2}):?(\d{2})$").expect("static regex");
}

/// Outcome of converting a local civil time in a named zone to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneResolution {
    Resolved(DateTime<Utc>),
    /// The zone name is not known to the resolver.
    Unresolved,
}

/// Host capability converting civil time in a named zone to UTC, honouring DST.
pub trait ZoneResolver: fmt::Debug + Send + Sync {
    fn resolve(&self, local: NaiveDateTime, tzid: &str) -> ZoneResolution;
}

/// What to do with a local time whose zone could not be resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnresolvedZonePolicy {
    /// Emit the local time unchanged, as if it were UTC.
    #[default]
    AssumeUtc,
    /// Treat the value as absent.
    Reject,
}

/// Resolver without a zone database: every named zone is unresolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoZoneDatabase;

impl ZoneResolver for NoZoneDatabase {
    fn resolve(&self, _local: NaiveDateTime, _tzid: &str) -> ZoneResolution {
        ZoneResolution::Unresolved
    }
}

/// Parse a fixed UTC offset such as `+0530`, `-08:00` or `UTC+01:00`.
pub fn parse_fixed_offset(tzid: &str) -> Option<FixedOffset> {
    let captures = RE_FIXED_OFFSET.captures(tzid.trim())?;
    let hours: i32 = captures[2].parse().ok()?;
    let minutes: i32 = captures[3].parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    let seconds = (hours * 60 + minutes) * 60;
    match &captures[1] {
        "-" => FixedOffset::west_opt(seconds),
        _ => FixedOffset::east_opt(seconds),
    }
}

/// Convert a local time with optional zone context to UTC.
///
/// Fixed offsets are applied directly, named zones go through `resolver`. `None` means the zone
/// could not be resolved (or there was none) and the caller has to apply its policy.
pub fn local_to_utc(
    local: NaiveDateTime,
    tzid: Option<&str>,
    resolver: &dyn ZoneResolver,
) -> Option<DateTime<Utc>> {
    let tzid = tzid?;
    if let Some(offset) = parse_fixed_offset(tzid) {
        return offset
            .from_local_datetime(&local)
            .single()
            .map(|dt| dt.with_timezone(&Utc));
    }
    match resolver.resolve(local, tzid) {
        ZoneResolution::Resolved(utc) => Some(utc),
        ZoneResolution::Unresolved => None,
    }
}

#[cfg(feature = "chrono-tz")]
pub use olson::*;

#[cfg(feature = "chrono-tz")]
mod olson {
    use super::{ZoneResolution, ZoneResolver};
    use chrono::{NaiveDateTime, TimeDelta, TimeZone, Utc};
    use std::str::FromStr;

    /// Prefixes some clients put in front of Olson names
    const VENDOR_PREFIXES: &[&str] = &[
        "/mozilla.org/20050126_1/",
        "/mozilla.org/20070129_1/",
        "/mozilla.org/",
        "/softwarestudio.org/Olson_20011030_5/",
        "/softwarestudio.org/",
        "/citadel.org/20190914_1/",
        "/citadel.org/",
    ];

    // Mostly for Microsoft products
    static PROPRIETARY_TZIDS: phf::Map<&'static str, chrono_tz::Tz> = phf::phf_map! {
        "AUS Eastern Standard Time" => chrono_tz::Australia::Sydney,
        "Alaskan Standard Time" => chrono_tz::America::Anchorage,
        "Arabian Standard Time" => chrono_tz::Asia::Dubai,
        "Atlantic Standard Time" => chrono_tz::America::Halifax,
        "Central Europe Standard Time" => chrono_tz::Europe::Budapest,
        "Central European Standard Time" => chrono_tz::Europe::Warsaw,
        "Central Standard Time" => chrono_tz::America::Chicago,
        "China Standard Time" => chrono_tz::Asia::Shanghai,
        "E. Europe Standard Time" => chrono_tz::Europe::Chisinau,
        "Eastern Standard Time" => chrono_tz::America::New_York,
        "FLE Standard Time" => chrono_tz::Europe::Helsinki,
        "GMT Standard Time" => chrono_tz::Europe::London,
        "GTB Standard Time" => chrono_tz::Europe::Bucharest,
        "Greenwich Standard Time" => chrono_tz::Atlantic::Reykjavik,
        "Hawaiian Standard Time" => chrono_tz::Pacific::Honolulu,
        "India Standard Time" => chrono_tz::Asia::Kolkata,
        "Israel Standard Time" => chrono_tz::Asia::Jerusalem,
        "Korea Standard Time" => chrono_tz::Asia::Seoul,
        "Mountain Standard Time" => chrono_tz::America::Denver,
        "New Zealand Standard Time" => chrono_tz::Pacific::Auckland,
        "Pacific Standard Time" => chrono_tz::America::Los_Angeles,
        "Romance Standard Time" => chrono_tz::Europe::Paris,
        "Russian Standard Time" => chrono_tz::Europe::Moscow,
        "SE Asia Standard Time" => chrono_tz::Asia::Bangkok,
        "Singapore Standard Time" => chrono_tz::Asia::Singapore,
        "South Africa Standard Time" => chrono_tz::Africa::Johannesburg,
        "Tokyo Standard Time" => chrono_tz::Asia::Tokyo,
        "US Mountain Standard Time" => chrono_tz::America::Phoenix,
        "UTC" => chrono_tz::UTC,
        "W. Australia Standard Time" => chrono_tz::Australia::Perth,
        "W. Europe Standard Time" => chrono_tz::Europe::Berlin,
    };

    pub fn get_proprietary_tzid(tzid: &str) -> Option<chrono_tz::Tz> {
        PROPRIETARY_TZIDS.get(tzid).copied()
    }

    /// Look up a TZID in the IANA database, accepting vendor prefixes and Windows names.
    pub fn lookup_tzid(tzid: &str) -> Option<chrono_tz::Tz> {
        let tzid = tzid.trim().trim_matches('"');
        let stripped = VENDOR_PREFIXES
            .iter()
            .find_map(|prefix| tzid.strip_prefix(prefix))
            .unwrap_or(tzid);
        chrono_tz::Tz::from_str(stripped)
            .ok()
            .or_else(|| get_proprietary_tzid(stripped))
    }

    /// Resolver backed by the IANA database shipped with `chrono-tz`.
    ///
    /// Times inside a DST gap are moved forward by one hour, times inside a fold resolve to the
    /// earlier instant.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct ChronoTzResolver;

    impl ZoneResolver for ChronoTzResolver {
        fn resolve(&self, local: NaiveDateTime, tzid: &str) -> ZoneResolution {
            let Some(tz) = lookup_tzid(tzid) else {
                return ZoneResolution::Unresolved;
            };
            let resolved = tz.from_local_datetime(&local).earliest().or_else(|| {
                let shifted = local.checked_add_signed(TimeDelta::hours(1))?;
                tz.from_local_datetime(&shifted).earliest()
            });
            match resolved {
                Some(dt) => ZoneResolution::Resolved(dt.with_timezone(&Utc)),
                None => ZoneResolution::Unresolved,
            }
        }
    }
}

/// The resolver used when none is configured.
pub fn default_resolver() -> std::sync::Arc<dyn ZoneResolver> {
    #[cfg(feature = "chrono-tz")]
    {
        std::sync::Arc::new(ChronoTzResolver)
    }
    #[cfg(not(feature = "chrono-tz"))]
    {
        std::sync::Arc::new(NoZoneDatabase)
    }
}
