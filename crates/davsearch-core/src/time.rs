//! Date and time values of calendar properties.
//!
//! [`IcalDateTime`] keeps the wall-clock value a property was written with:
//! `DATE` values stay dates, `Z` values are UTC and everything else
//! (floating or `TZID`-qualified) keeps its local wall clock. Timezone
//! resolution is left to the caller.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::ical::IcalProperty;

/// A parsed `DATE` or `DATE-TIME` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum IcalDateTime {
    /// All-day date.
    Date(NaiveDate),
    /// UTC instant (`...Z`).
    Utc(DateTime<Utc>),
    /// Local wall clock, optionally qualified by a `TZID`.
    Local {
        /// Wall-clock time.
        date_time: NaiveDateTime,
        /// Timezone identifier, if the property carried one.
        tzid: Option<String>,
    },
}

impl IcalDateTime {
    /// Parses a property value, honouring `VALUE=DATE` and `TZID`.
    pub fn from_property(property: &IcalProperty) -> Option<Self> {
        let tzid = property.param("TZID").map(str::to_string);
        let is_date = property
            .param("VALUE")
            .is_some_and(|v| v.eq_ignore_ascii_case("DATE"));

        if is_date {
            return NaiveDate::parse_from_str(property.value.trim(), "%Y%m%d")
                .ok()
                .map(Self::Date);
        }
        Self::parse(&property.value, tzid)
    }

    /// Parses a raw value.
    ///
    /// Handles formats like:
    /// - 20250205T100000Z (UTC)
    /// - 20250205T100000 (local/floating)
    /// - 20250205 (date only)
    pub fn parse(value: &str, tzid: Option<String>) -> Option<Self> {
        let s = value.trim();

        if s.len() == 8 && s.chars().all(|c| c.is_ascii_digit()) {
            return NaiveDate::parse_from_str(s, "%Y%m%d").ok().map(Self::Date);
        }

        if let Some(naive) = s.strip_suffix('Z') {
            let dt = NaiveDateTime::parse_from_str(naive, "%Y%m%dT%H%M%S").ok()?;
            return Some(Self::Utc(Utc.from_utc_datetime(&dt)));
        }

        NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
            .ok()
            .map(|date_time| Self::Local { date_time, tzid })
    }

    /// Returns true for `DATE` values.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// Returns the calendar date of the value.
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Date(date) => *date,
            Self::Utc(dt) => dt.date_naive(),
            Self::Local { date_time, .. } => date_time.date(),
        }
    }

    /// Returns the wall-clock value; dates map to midnight.
    pub fn naive(&self) -> NaiveDateTime {
        match self {
            Self::Date(date) => date.and_time(chrono::NaiveTime::MIN),
            Self::Utc(dt) => dt.naive_utc(),
            Self::Local { date_time, .. } => *date_time,
        }
    }

    /// Shifts the value by `duration`, keeping its kind.
    ///
    /// Returns `None` if the result is out of range.
    pub fn add(&self, duration: Duration) -> Option<Self> {
        match self {
            Self::Date(date) => Duration::try_days(duration.num_days())
                .and_then(|days| date.checked_add_signed(days))
                .map(Self::Date),
            Self::Utc(dt) => dt.checked_add_signed(duration).map(Self::Utc),
            Self::Local { date_time, tzid } => {
                date_time
                    .checked_add_signed(duration)
                    .map(|date_time| Self::Local {
                        date_time,
                        tzid: tzid.clone(),
                    })
            }
        }
    }
}

/// Parses an RFC 5545 `DURATION` value such as `PT1H30M`, `P2D` or `-P1W`.
///
/// Values too large for a [`Duration`] are rejected.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let s = value.trim();
    let (negative, s) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    let s = s.strip_prefix('P')?;

    let mut total = Duration::zero();
    let mut number = String::new();
    let mut in_time = false;
    let mut seen_unit = false;

    for c in s.chars() {
        match c {
            'T' if !in_time => in_time = true,
            '0'..='9' => number.push(c),
            unit => {
                let n: i64 = number.parse().ok()?;
                number.clear();
                let part = match (unit, in_time) {
                    ('W', false) => Duration::try_weeks(n),
                    ('D', false) => Duration::try_days(n),
                    ('H', true) => Duration::try_hours(n),
                    ('M', true) => Duration::try_minutes(n),
                    ('S', true) => Duration::try_seconds(n),
                    _ => return None,
                }?;
                total = total.checked_add(&part)?;
                seen_unit = true;
            }
        }
    }

    if !number.is_empty() || !seen_unit {
        return None;
    }
    Some(if negative { -total } else { total })
}
