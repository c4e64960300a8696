//! Leaf validators that cannot be expressed as a single regular expression.
//!
//! These are always present in a [`ValidatorRegistry`](crate::ValidatorRegistry)
//! under their own names, and validator tables can alias them with
//! `{"builtin": "<name>"}`.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

const DELAY_UNITS: &[&str] = &[
    "second", "seconds", "minute", "minutes", "hour", "hours", "day", "days", "week", "weeks",
];

/// A builtin leaf validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// Time limit: `M`, `M:S`, `H:M:S`, `D-H`, `D-H:M`, `D-H:M:S`, or `INFINITE`/`UNLIMITED`.
    Duration,
    /// Point in time: `MMDDYY`, `MM/DD/YY`, `YYYY-MM-DD[THH:MM[:SS]]` or `HH:MM[:SS]`.
    DateTime,
    /// Relative start: `now+N[units]`.
    Delay,
    /// Comma-separated integers and ascending ranges: `1,2,4-6`.
    NumberList,
    /// Bare word without whitespace, or a properly closed quoted string.
    String,
}

impl Builtin {
    /// Every builtin, in registration order.
    pub const ALL: [Builtin; 5] = [
        Builtin::Duration,
        Builtin::DateTime,
        Builtin::Delay,
        Builtin::NumberList,
        Builtin::String,
    ];

    /// Registry name of this builtin.
    pub fn name(self) -> &'static str {
        match self {
            Self::Duration => "duration",
            Self::DateTime => "datetime",
            Self::Delay => "delay",
            Self::NumberList => "number_list",
            Self::String => "string",
        }
    }

    /// Looks up a builtin by registry name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|builtin| builtin.name() == name)
    }

    /// Short description used in diagnostics and listings.
    pub fn description(self) -> &'static str {
        match self {
            Self::Duration => "duration ([days-]hours:minutes:seconds, minutes, or UNLIMITED)",
            Self::DateTime => "date/time (YYYY-MM-DD[THH:MM[:SS]], MMDDYY, MM/DD/YY or HH:MM[:SS])",
            Self::Delay => "delay (now+count[seconds|minutes|hours|days|weeks])",
            Self::NumberList => "number list (e.g. 1,2,4-6)",
            Self::String => "string (no spaces unless quoted)",
        }
    }

    /// Returns `true` if `text` is accepted.
    pub fn accepts(self, text: &str) -> bool {
        match self {
            Self::Duration => is_duration(text),
            Self::DateTime => is_datetime(text),
            Self::Delay => is_delay(text),
            Self::NumberList => is_number_list(text),
            Self::String => is_string(text),
        }
    }
}

fn digits(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn is_duration(text: &str) -> bool {
    if matches!(text, "INFINITE" | "UNLIMITED" | "infinite" | "unlimited") {
        return true;
    }

    let (has_days, clock) = match text.split_once('-') {
        Some((days, rest)) => {
            if digits(days).is_none() {
                return false;
            }
            (true, rest)
        }
        None => (false, text),
    };

    let Some(parts) = clock.split(':').map(digits).collect::<Option<Vec<u32>>>() else {
        return false;
    };

    match (has_days, parts.as_slice()) {
        (false, [_minutes]) => true,
        (false, [_minutes, seconds]) => *seconds < 60,
        (false, [_hours, minutes, seconds]) => *minutes < 60 && *seconds < 60,
        (true, [hours]) => *hours < 24,
        (true, [hours, minutes]) => *hours < 24 && *minutes < 60,
        (true, [hours, minutes, seconds]) => *hours < 24 && *minutes < 60 && *seconds < 60,
        _ => false,
    }
}

/// `(shape, format)` pairs; `D` in a shape stands for one ASCII digit.
const DATE_FORMATS: &[(&str, &str)] = &[
    ("DDDD-DD-DD", "%Y-%m-%d"),
    ("DDDDDD", "%m%d%y"),
    ("DD/DD/DD", "%m/%d/%y"),
];
const TIME_FORMATS: &[(&str, &str)] = &[("DD:DD", "%H:%M"), ("DD:DD:DD", "%H:%M:%S")];
const DATETIME_FORMATS: &[(&str, &str)] = &[
    ("DDDD-DD-DDTDD:DD", "%Y-%m-%dT%H:%M"),
    ("DDDD-DD-DDTDD:DD:DD", "%Y-%m-%dT%H:%M:%S"),
];

// chrono also accepts unpadded fields, so the shape pins each field to its width.
fn has_shape(text: &str, shape: &str) -> bool {
    text.len() == shape.len()
        && text.bytes().zip(shape.bytes()).all(|(ch, expected)| match expected {
            b'D' => ch.is_ascii_digit(),
            _ => ch == expected,
        })
}

fn matching_formats<'a>(
    text: &'a str,
    formats: &'a [(&'a str, &'a str)],
) -> impl Iterator<Item = &'a str> + 'a {
    formats
        .iter()
        .filter(move |(shape, _)| has_shape(text, shape))
        .map(|(_, format)| *format)
}

fn is_datetime(text: &str) -> bool {
    // Leap seconds (`:60`) parse in chrono as nanoseconds past one billion.
    let whole_second = |time: NaiveTime| time.nanosecond() < 1_000_000_000;

    matching_formats(text, DATE_FORMATS)
        .any(|format| NaiveDate::parse_from_str(text, format).is_ok())
        || matching_formats(text, TIME_FORMATS).any(|format| {
            NaiveTime::parse_from_str(text, format).is_ok_and(whole_second)
        })
        || matching_formats(text, DATETIME_FORMATS).any(|format| {
            NaiveDateTime::parse_from_str(text, format)
                .is_ok_and(|stamp| whole_second(stamp.time()))
        })
}

fn is_delay(text: &str) -> bool {
    let Some(rest) = text.strip_prefix("now+") else {
        return false;
    };
    let split = rest
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(rest.len());
    let (count, unit) = rest.split_at(split);
    !count.is_empty() && (unit.is_empty() || DELAY_UNITS.contains(&unit))
}

fn is_number_list(text: &str) -> bool {
    !text.is_empty()
        && text.split(',').all(|item| match item.split_once('-') {
            Some((low, high)) => matches!((digits(low), digits(high)), (Some(low), Some(high)) if low <= high),
            None => digits(item).is_some(),
        })
}

fn is_string(text: &str) -> bool {
    match text.chars().next() {
        None => false,
        Some(quote @ ('"' | '\'')) => {
            text.len() >= 2 && text.ends_with(quote) && !text[1..text.len() - 1].contains(quote)
        }
        Some(_) => !text
            .chars()
            .any(|ch| ch.is_whitespace() || ch == '"' || ch == '\''),
    }
}
