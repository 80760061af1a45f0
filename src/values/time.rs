//! Durations and timestamps.
//!
//! Durations use unit-suffixed text (`300ms`, `1.5h`, `2h45m`); timestamps
//! accept RFC 3339 and progressively shorter layouts down to `2006-01`.
//! Values without an offset are taken as UTC.

use std::any::Any;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use crate::error::ScanfigError;
use crate::setter::{Setter, SetterCreator};
use crate::slot::Slot;
use crate::types::Tags;
use crate::validate::check_bounds;

const DURATION: &str = "duration";
const TIMESTAMP: &str = "timestamp";

const UNITS: &[(&str, u128)] = &[
    ("ns", 1),
    ("us", 1_000),
    ("\u{b5}s", 1_000),
    ("\u{3bc}s", 1_000),
    ("ms", 1_000_000),
    ("s", 1_000_000_000),
    ("m", 60_000_000_000),
    ("h", 3_600_000_000_000),
];

/// Parse a duration such as `1h30m`, `1.5s` or `250us`. A bare `0` is
/// accepted; anything negative is not.
pub fn parse_duration(text: &str) -> Option<Duration> {
    let text = text.strip_prefix('+').unwrap_or(text);
    if text == "0" {
        return Some(Duration::ZERO);
    }
    if text.is_empty() {
        return None;
    }

    let mut total: u128 = 0;
    let mut rest = text;
    while !rest.is_empty() {
        let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (int_part, after) = rest.split_at(int_len);
        let (frac_part, after) = match after.strip_prefix('.') {
            Some(tail) => {
                let len = tail.find(|c: char| !c.is_ascii_digit()).unwrap_or(tail.len());
                tail.split_at(len)
            }
            None => ("", after),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        let unit_len = after
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after.len());
        let (unit, after) = after.split_at(unit_len);
        let (_, scale) = UNITS.iter().find(|(name, _)| *name == unit)?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().ok()?
        };
        total = total.checked_add(whole.checked_mul(*scale)?)?;
        let mut divisor: u128 = 1;
        let mut fraction: u128 = 0;
        for digit in frac_part.bytes().take(18) {
            fraction = fraction * 10 + u128::from(digit - b'0');
            divisor *= 10;
        }
        total = total.checked_add(fraction * scale / divisor)?;
        rest = after;
    }

    let secs = u64::try_from(total / 1_000_000_000).ok()?;
    Some(Duration::new(secs, (total % 1_000_000_000) as u32))
}

fn decimal(value: u128, digits: u32) -> String {
    let unit = 10u128.pow(digits);
    let (whole, frac) = (value / unit, value % unit);
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:0width$}", width = digits as usize);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

/// Format a duration the way [`parse_duration`] reads it: `1h2m3.5s`,
/// `1.5ms`, `0s`.
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < 1_000 {
        return format!("{nanos}ns");
    }
    if nanos < 1_000_000 {
        return format!("{}\u{b5}s", decimal(nanos, 3));
    }
    if nanos < 1_000_000_000 {
        return format!("{}ms", decimal(nanos, 6));
    }

    let hours = nanos / 3_600_000_000_000;
    let minutes = nanos / 60_000_000_000 % 60;
    let seconds = decimal(nanos % 60_000_000_000, 9);
    match (hours, minutes) {
        (0, 0) => format!("{seconds}s"),
        (0, _) => format!("{minutes}m{seconds}s"),
        _ => format!("{hours}h{minutes}m{seconds}s"),
    }
}

pub struct DurationCreator;

impl SetterCreator<Duration> for DurationCreator {
    fn create(&self, slot: Slot<Duration>, tags: &Tags) -> Box<dyn Setter> {
        Box::new(DurationSetter {
            slot,
            tags: tags.clone(),
        })
    }
}

struct DurationSetter {
    slot: Slot<Duration>,
    tags: Tags,
}

impl DurationSetter {
    fn assign(&self, value: Duration) -> Result<(), ScanfigError> {
        check_bounds(&value, &self.tags, DURATION, parse_duration, |d| {
            format_duration(*d)
        })?;
        self.slot.store(value)
    }
}

impl Setter for DurationSetter {
    fn render(&self) -> String {
        format_duration(self.slot.get().unwrap_or_default())
    }

    fn set_str(&self, value: &str) -> Result<(), ScanfigError> {
        let parsed = parse_duration(value).ok_or_else(|| ScanfigError::conversion(value, DURATION))?;
        self.assign(parsed)
    }

    fn set_int(&self, value: i64) -> Result<(), ScanfigError> {
        let secs = u64::try_from(value).map_err(|_| ScanfigError::conversion(value, DURATION))?;
        self.assign(Duration::from_secs(secs))
    }

    fn set_uint(&self, value: u64) -> Result<(), ScanfigError> {
        self.assign(Duration::from_secs(value))
    }

    fn set_float(&self, value: f64) -> Result<(), ScanfigError> {
        let parsed =
            Duration::try_from_secs_f64(value).map_err(|_| ScanfigError::conversion(value, DURATION))?;
        self.assign(parsed)
    }

    fn set_bool(&self, value: bool) -> Result<(), ScanfigError> {
        Err(ScanfigError::conversion(value, DURATION))
    }

    fn get(&self) -> Box<dyn Any> {
        Box::new(self.slot.get().unwrap_or_default())
    }
}

/// Parse a timestamp. Accepts RFC 3339 with either `T` or a space between
/// date and time, then the same shapes without seconds, without minutes,
/// without a time, and finally `YYYY-MM`.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let mut text = text.trim().to_string();
    if text.len() > 10 && text.is_char_boundary(10) && text[10..].starts_with(' ') {
        text.replace_range(10..11, "T");
    }
    if let Some(stripped) = text.strip_suffix(['Z', 'z']) {
        text = format!("{stripped}+00:00");
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M%:z") {
        return Some(parsed.with_timezone(&Utc));
    }
    for layout in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&text, layout) {
            return Some(naive.and_utc());
        }
    }
    if let Some((date, hour)) = text.split_once('T') {
        if hour.len() == 2 {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
            let hour: u32 = hour.parse().ok()?;
            return date.and_hms_opt(hour, 0, 0).map(|naive| naive.and_utc());
        }
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    NaiveDate::parse_from_str(&format!("{text}-01"), "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_bound(text: &str) -> Option<DateTime<Utc>> {
    if text == "now" {
        Some(Utc::now())
    } else {
        parse_timestamp(text)
    }
}

fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub struct TimestampCreator;

impl SetterCreator<DateTime<Utc>> for TimestampCreator {
    fn create(&self, slot: Slot<DateTime<Utc>>, tags: &Tags) -> Box<dyn Setter> {
        Box::new(TimestampSetter {
            slot,
            tags: tags.clone(),
        })
    }
}

struct TimestampSetter {
    slot: Slot<DateTime<Utc>>,
    tags: Tags,
}

impl TimestampSetter {
    fn assign(&self, value: DateTime<Utc>) -> Result<(), ScanfigError> {
        check_bounds(&value, &self.tags, TIMESTAMP, parse_bound, format_timestamp)?;
        self.slot.store(value)
    }
}

impl Setter for TimestampSetter {
    fn render(&self) -> String {
        format_timestamp(&self.slot.get().unwrap_or_default())
    }

    fn set_str(&self, value: &str) -> Result<(), ScanfigError> {
        let parsed =
            parse_timestamp(value).ok_or_else(|| ScanfigError::conversion(value, TIMESTAMP))?;
        self.assign(parsed)
    }

    fn set_int(&self, value: i64) -> Result<(), ScanfigError> {
        let parsed = DateTime::from_timestamp(value, 0)
            .ok_or_else(|| ScanfigError::conversion(value, TIMESTAMP))?;
        self.assign(parsed)
    }

    fn set_uint(&self, value: u64) -> Result<(), ScanfigError> {
        let parsed = i64::try_from(value)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or_else(|| ScanfigError::conversion(value, TIMESTAMP))?;
        self.assign(parsed)
    }

    fn set_float(&self, value: f64) -> Result<(), ScanfigError> {
        if !value.is_finite() || value.abs() >= i64::MAX as f64 {
            return Err(ScanfigError::conversion(value, TIMESTAMP));
        }
        let secs = value.floor();
        let nanos = (((value - secs) * 1e9).round() as u32).min(999_999_999);
        let parsed = DateTime::from_timestamp(secs as i64, nanos)
            .ok_or_else(|| ScanfigError::conversion(value, TIMESTAMP))?;
        self.assign(parsed)
    }

    fn set_bool(&self, value: bool) -> Result<(), ScanfigError> {
        Err(ScanfigError::conversion(value, TIMESTAMP))
    }

    fn get(&self) -> Box<dyn Any> {
        Box::new(self.slot.get().unwrap_or_default())
    }
}
