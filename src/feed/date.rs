//! RFC 822 and RFC 3339 date-time normalization.
//!
//! Both grammars resolve to a UTC instant with millisecond precision. The
//! wall-clock fields are first read as if they were UTC, then the zone
//! offset is subtracted to obtain the true instant.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use regex::{Captures, Regex};

use super::error::DateParseError;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// `[Weekday, ]DD Mon YY|YYYY HH:MM[:SS] ZONE`
static RFC822_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    match Regex::new(concat!(
        r"^(?:(?:Mon|Tue|Wed|Thu|Fri|Sat|Sun), )?",
        r"(?P<day>[0-9]{2}) ",
        r"(?P<month>Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec) ",
        r"(?P<year>[0-9]{4}|[0-9]{2}) ",
        r"(?P<hour>[0-9]{2}):(?P<minute>[0-9]{2})(?::(?P<second>[0-9]{2}))? ",
        r"(?:",
        r"(?P<offset_sign>[+-])(?P<offset_hour>[0-9]{2})(?P<offset_minute>[0-9]{2})",
        r"|(?P<universal>UT|GMT|Z)",
        r"|(?P<us_zone>EST|EDT|CST|CDT|MST|MDT|PST|PDT)",
        r"|(?P<military>[A-IK-Y])",
        r")$",
    )) {
        Ok(regex) => regex,
        Err(err) => panic!("Invalid RFC 822 regex: {err}"),
    }
});

/// `YYYY-MM-DDTHH:MM:SS[.fraction](Z|±HH:MM)`; digits past milliseconds are dropped.
static RFC3339_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    match Regex::new(concat!(
        r"^(?P<year>[0-9]{4})-(?P<month>[0-9]{2})-(?P<day>[0-9]{2})",
        r"T(?P<hour>[0-9]{2}):(?P<minute>[0-9]{2}):(?P<second>[0-9]{2})",
        r"(?:\.(?P<fraction>[0-9]{1,3})[0-9]*)?",
        r"(?:Z|(?P<offset_sign>[+-])(?P<offset_hour>[0-9]{2}):(?P<offset_minute>[0-9]{2}))$",
    )) {
        Ok(regex) => regex,
        Err(err) => panic!("Invalid RFC 3339 regex: {err}"),
    }
});

/// A date value before normalization: either text still to be parsed or an
/// instant that has already been normalized and passes through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawDate<'a> {
    Text(&'a str),
    Instant(DateTime<Utc>),
}

impl<'a> From<&'a str> for RawDate<'a> {
    fn from(text: &'a str) -> Self {
        RawDate::Text(text)
    }
}

impl From<DateTime<Utc>> for RawDate<'_> {
    fn from(instant: DateTime<Utc>) -> Self {
        RawDate::Instant(instant)
    }
}

/// Timezone designators accepted by RFC 822.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    /// `±HHMM`
    Numeric { sign: i64, hours: i64, minutes: i64 },
    /// `UT`, `GMT`, `Z`
    Universal,
    /// Contiguous-US abbreviation with its fixed offset in hours.
    ContiguousUs(i64),
    /// Single military letter, `J` excluded.
    Military(char),
}

impl Zone {
    fn contiguous_us(abbreviation: &str) -> Option<Self> {
        let hours = match abbreviation {
            "EDT" => -4,
            "EST" | "CDT" => -5,
            "CST" | "MDT" => -6,
            "MST" | "PDT" => -7,
            "PST" => -8,
            _ => return None,
        };
        Some(Zone::ContiguousUs(hours))
    }

    /// Offset east of UTC, in minutes.
    fn offset_minutes(self) -> Option<i64> {
        match self {
            Zone::Numeric {
                sign,
                hours,
                minutes,
            } => (minutes < 60).then_some(sign * (hours * 60 + minutes)),
            Zone::Universal => Some(0),
            Zone::ContiguousUs(hours) => Some(hours * 60),
            Zone::Military(letter) => military_offset_hours(letter).map(|h| h * 60),
        }
    }
}

/// Whole-hour offset of a military zone letter.
///
/// Letters `A`..`M` count up from one with the unused `J` skipped and lie
/// west of UTC; `N`..`Y` count up from one and lie east. `J` and anything
/// outside `A`..`Y` has no offset.
fn military_offset_hours(letter: char) -> Option<i64> {
    if !('A'..='Y').contains(&letter) || letter == 'J' {
        return None;
    }
    let mut cp = i64::from(u32::from(letter));
    if cp < i64::from(u32::from('N')) {
        if cp > i64::from(u32::from('J')) {
            cp -= 1;
        }
        Some(-(cp - i64::from(u32::from('A')) + 1))
    } else {
        Some(cp - i64::from(u32::from('N')) + 1)
    }
}

/// Normalizes an RFC 822 date-time (as used by RSS 2.0).
///
/// # Errors
///
/// Returns [`DateParseError::Rfc822`] if the text does not match the
/// grammar, or [`DateParseError::OutOfRange`] if a component is invalid.
pub fn rfc822<'a>(input: impl Into<RawDate<'a>>) -> Result<DateTime<Utc>, DateParseError> {
    match input.into() {
        RawDate::Instant(instant) => Ok(instant),
        RawDate::Text(text) => parse_rfc822(text),
    }
}

/// Normalizes an RFC 3339 date-time (as used by Atom, RSS 1.0 and JSON Feed).
///
/// # Errors
///
/// Returns [`DateParseError::Rfc3339`] if the text does not match the
/// grammar, or [`DateParseError::OutOfRange`] if a component is invalid.
pub fn rfc3339<'a>(input: impl Into<RawDate<'a>>) -> Result<DateTime<Utc>, DateParseError> {
    match input.into() {
        RawDate::Instant(instant) => Ok(instant),
        RawDate::Text(text) => parse_rfc3339(text),
    }
}

fn parse_rfc822(text: &str) -> Result<DateTime<Utc>, DateParseError> {
    let caps = RFC822_PATTERN
        .captures(text)
        .ok_or_else(|| DateParseError::Rfc822(text.to_string()))?;
    let out_of_range = || DateParseError::OutOfRange(text.to_string());

    let year_digits = &caps["year"];
    let mut year = number(year_digits).ok_or_else(out_of_range)?;
    // Two-digit years are read literally within the 1900s.
    if year_digits.len() == 2 {
        year += 1900;
    }
    let month = MONTHS
        .iter()
        .position(|m| *m == &caps["month"])
        .ok_or_else(out_of_range)?;

    let zone = if caps.name("offset_sign").is_some() {
        Zone::Numeric {
            sign: sign(&caps),
            hours: group(&caps, "offset_hour").ok_or_else(out_of_range)?,
            minutes: group(&caps, "offset_minute").ok_or_else(out_of_range)?,
        }
    } else if let Some(abbreviation) = caps.name("us_zone") {
        Zone::contiguous_us(abbreviation.as_str()).ok_or_else(out_of_range)?
    } else if let Some(letter) = caps.name("military").and_then(|m| m.as_str().chars().next()) {
        Zone::Military(letter)
    } else {
        Zone::Universal
    };

    let wall_clock = WallClock {
        year,
        month0: month as u32,
        day: group(&caps, "day").ok_or_else(out_of_range)?,
        hour: group(&caps, "hour").ok_or_else(out_of_range)?,
        minute: group(&caps, "minute").ok_or_else(out_of_range)?,
        second: group(&caps, "second").unwrap_or(0),
        millisecond: 0,
    };

    let offset = zone.offset_minutes().ok_or_else(out_of_range)?;
    wall_clock.to_utc(offset).ok_or_else(out_of_range)
}

fn parse_rfc3339(text: &str) -> Result<DateTime<Utc>, DateParseError> {
    let caps = RFC3339_PATTERN
        .captures(text)
        .ok_or_else(|| DateParseError::Rfc3339(text.to_string()))?;
    let out_of_range = || DateParseError::OutOfRange(text.to_string());

    let month: u32 = group(&caps, "month").ok_or_else(out_of_range)?;
    let millisecond = match caps.name("fraction") {
        // ".8" is 800 ms, ".82" is 820 ms
        Some(fraction) => {
            let digits = fraction.as_str();
            let value: u32 = number(digits).ok_or_else(out_of_range)?;
            value * 10u32.pow(3 - digits.len() as u32)
        }
        None => 0,
    };

    let offset = if caps.name("offset_sign").is_some() {
        let hours: i64 = group(&caps, "offset_hour").ok_or_else(out_of_range)?;
        let minutes: i64 = group(&caps, "offset_minute").ok_or_else(out_of_range)?;
        Zone::Numeric {
            sign: sign(&caps),
            hours,
            minutes,
        }
        .offset_minutes()
        .ok_or_else(out_of_range)?
    } else {
        0
    };

    let wall_clock = WallClock {
        year: group(&caps, "year").ok_or_else(out_of_range)?,
        month0: month.checked_sub(1).ok_or_else(out_of_range)?,
        day: group(&caps, "day").ok_or_else(out_of_range)?,
        hour: group(&caps, "hour").ok_or_else(out_of_range)?,
        minute: group(&caps, "minute").ok_or_else(out_of_range)?,
        second: group(&caps, "second").ok_or_else(out_of_range)?,
        millisecond,
    };

    wall_clock.to_utc(offset).ok_or_else(out_of_range)
}

/// Calendar fields read as if they were UTC.
struct WallClock {
    year: i32,
    month0: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    millisecond: u32,
}

impl WallClock {
    /// `offset_minutes` is the zone's offset east of UTC; it is subtracted.
    fn to_utc(&self, offset_minutes: i64) -> Option<DateTime<Utc>> {
        let naive = NaiveDate::from_ymd_opt(self.year, self.month0 + 1, self.day)?
            .and_hms_milli_opt(self.hour, self.minute, self.second, self.millisecond)?;
        let as_utc = Utc.from_utc_datetime(&naive);
        as_utc.checked_sub_signed(Duration::minutes(offset_minutes))
    }
}

fn sign(caps: &Captures<'_>) -> i64 {
    match caps.name("offset_sign").map(|m| m.as_str()) {
        Some("-") => -1,
        _ => 1,
    }
}

fn group<T: std::str::FromStr>(caps: &Captures<'_>, name: &str) -> Option<T> {
    caps.name(name).and_then(|m| number(m.as_str()))
}

fn number<T: std::str::FromStr>(digits: &str) -> Option<T> {
    digits.parse().ok()
}
