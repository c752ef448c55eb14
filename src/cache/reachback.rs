//! Freshness windows: how far back a cached result may have been written.
//!
//! A reachback is either an absolute, possibly partial, date
//! (`YYYY[-MM[-DD[-hh[-mm[-ss]]]]]` with any single non-digit separator) or a
//! span such as `"3 days, 4 hours"` measured back from the current time.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use regex::Regex;

use crate::cache::ReachbackError;

static ABSOLUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,4})(?:\D(\d{1,2}))?(?:\D(\d{1,2}))?(?:\D(\d{1,2}))?(?:\D(\d{1,2}))?(?:\D(\d{1,2}))?$")
        .expect("absolute reachback pattern is valid")
});

static SPAN_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+) *(year|month|week|day|hour|minute|second)s?")
        .expect("relative reachback pattern is valid")
});

/// A span of calendar and clock units to subtract from "now".
///
/// Weeks through seconds are fixed durations. Years and months are applied
/// afterwards to the calendar date, borrowing years as needed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    /// Calendar years.
    pub years: u64,
    /// Calendar months.
    pub months: u64,
    /// Weeks of 7 days.
    pub weeks: u64,
    /// Days of 24 hours.
    pub days: u64,
    /// Hours.
    pub hours: u64,
    /// Minutes.
    pub minutes: u64,
    /// Seconds.
    pub seconds: u64,
}

impl Span {
    fn fixed(&self) -> Option<TimeDelta> {
        let part = |n: u64, unit: fn(i64) -> Option<TimeDelta>| unit(i64::try_from(n).ok()?);
        part(self.weeks, TimeDelta::try_weeks)?
            .checked_add(&part(self.days, TimeDelta::try_days)?)?
            .checked_add(&part(self.hours, TimeDelta::try_hours)?)?
            .checked_add(&part(self.minutes, TimeDelta::try_minutes)?)?
            .checked_add(&part(self.seconds, TimeDelta::try_seconds)?)
    }

    /// Subtract this span from `now`.
    ///
    /// Returns `None` if the result falls outside the supported calendar.
    pub fn before(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let dt = now.checked_sub_signed(self.fixed()?)?;

        let mut year = i64::from(dt.year()).checked_sub(i64::try_from(self.years).ok()?)?;
        let mut month = i64::from(dt.month()).checked_sub(i64::try_from(self.months).ok()?)?;
        if month <= 0 {
            let borrow = -month / 12 + 1;
            month += borrow * 12;
            year -= borrow;
        }

        let year = i32::try_from(year).ok().filter(|y| *y >= 1)?;
        let month = u32::try_from(month).ok()?;
        let day = dt.day().min(last_day_of_month(year, month)?);
        NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(dt.hour(), dt.minute(), dt.second())
    }
}

fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };
    Some(NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?.day())
}

/// A parsed reachback specification.
///
/// # Examples
///
/// ```rust
/// use chrono::NaiveDate;
/// use steadfast::cache::Reachback;
///
/// let now = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap().and_hms_opt(12, 0, 0).unwrap();
///
/// let absolute: Reachback = "2000-12".parse().unwrap();
/// assert_eq!(absolute.cutoff(now).unwrap().to_string(), "2000-12-01 00:00:00");
///
/// let relative: Reachback = "20 years, 25 months, 79 days".parse().unwrap();
/// assert_eq!(relative.cutoff(now).unwrap().to_string(), "2004-06-29 12:00:00");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reachback {
    /// Accept anything written at or after this instant.
    Absolute(NaiveDateTime),
    /// Accept anything written within this span of the current time.
    Relative {
        /// The parsed span.
        span: Span,
        /// The text it was parsed from.
        spec: String,
    },
}

impl Reachback {
    /// The earliest representable floor, `0001-01-01 00:00:00`.
    pub fn earliest() -> Self {
        Reachback::Absolute(floor())
    }

    /// Parse a specification.
    ///
    /// # Errors
    ///
    /// [`ReachbackError::Malformed`] if `spec` matches neither grammar, and
    /// [`ReachbackError::InvalidDate`] for an absolute date that does not
    /// exist.
    pub fn parse(spec: &str) -> Result<Self, ReachbackError> {
        let trimmed = spec.trim();
        if let Some(caps) = ABSOLUTE.captures(trimmed) {
            let field = |i: usize, default: u32| {
                caps.get(i)
                    .map_or(Ok(default), |m| m.as_str().parse::<u32>())
                    .map_err(|_| ReachbackError::InvalidDate(spec.to_string()))
            };
            let year = i32::try_from(field(1, 1)?)
                .map_err(|_| ReachbackError::InvalidDate(spec.to_string()))?;
            let date = NaiveDate::from_ymd_opt(year, field(2, 1)?, field(3, 1)?)
                .filter(|d| d.year() >= 1)
                .and_then(|d| d.and_hms_opt(field(4, 0).ok()?, field(5, 0).ok()?, field(6, 0).ok()?))
                .ok_or_else(|| ReachbackError::InvalidDate(spec.to_string()))?;
            return Ok(Reachback::Absolute(date));
        }

        parse_span(trimmed)
            .map(|span| Reachback::Relative {
                span,
                spec: spec.to_string(),
            })
            .ok_or_else(|| ReachbackError::Malformed(spec.to_string()))
    }

    /// The oldest acceptable timestamp, as seen from `now`.
    ///
    /// # Errors
    ///
    /// [`ReachbackError::OutOfRange`] if a relative span reaches before year 1.
    pub fn cutoff(&self, now: NaiveDateTime) -> Result<NaiveDateTime, ReachbackError> {
        match self {
            Reachback::Absolute(at) => Ok(*at),
            Reachback::Relative { span, spec } => span
                .before(now)
                .ok_or_else(|| ReachbackError::OutOfRange(spec.clone())),
        }
    }
}

fn floor() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MIN)
}

/// Parse `<n> <unit>` parts separated by commas or whitespace.
///
/// Returns `None` if anything other than separators lies between parts.
/// Repeated units add up.
fn parse_span(text: &str) -> Option<Span> {
    let mut span = Span::default();
    let mut last_end = 0;
    let mut matched = false;

    for caps in SPAN_PART.captures_iter(text) {
        let whole = caps.get(0)?;
        if !is_separator(&text[last_end..whole.start()]) {
            return None;
        }
        last_end = whole.end();
        matched = true;

        let n: u64 = caps[1].parse().ok()?;
        let slot = match &caps[2] {
            "year" => &mut span.years,
            "month" => &mut span.months,
            "week" => &mut span.weeks,
            "day" => &mut span.days,
            "hour" => &mut span.hours,
            "minute" => &mut span.minutes,
            _ => &mut span.seconds,
        };
        *slot = slot.checked_add(n)?;
    }

    (matched && is_separator(&text[last_end..])).then_some(span)
}

fn is_separator(gap: &str) -> bool {
    gap.chars().all(|c| c == ',' || c.is_whitespace())
}

impl Default for Reachback {
    fn default() -> Self {
        Self::earliest()
    }
}

impl FromStr for Reachback {
    type Err = ReachbackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Reachback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reachback::Absolute(at) => write!(f, "{}", at.format("%Y-%m-%d %H:%M:%S")),
            Reachback::Relative { spec, .. } => f.write_str(spec),
        }
    }
}

/// Parse `spec` and resolve it against `now` in one step.
///
/// # Errors
///
/// See [`Reachback::parse`] and [`Reachback::cutoff`].
pub fn parse_reachback(spec: &str, now: NaiveDateTime) -> Result<NaiveDateTime, ReachbackError> {
    Reachback::parse(spec)?.cutoff(now)
}
