//! Partial date/time values.
//!
//! FHIR search dates may be given with any precision from a year down to a
//! fraction of a second, with or without an offset:
//!
//! ```text
//! 2020
//! 2020-01
//! 2020-01-15
//! 2020-01-15T10:30
//! 2020-01-15T10:30:05.123+02:00
//! ```
//!
//! A [`PartialDateTime`] keeps the components that were supplied, so it can be
//! rendered back at its original precision, and resolves to absolute instants
//! by filling the missing components with their lowest values.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{
    DateTime, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc,
};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

static PARTIAL_DATETIME: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<year>\d{4})(?:-(?P<month>\d{2})(?:-(?P<day>\d{2})(?:T(?P<hour>\d{2}):(?P<minute>\d{2})(?::(?P<second>\d{2})(?:\.(?P<fraction>\d{1,9}))?)?(?P<offset>Z|[+-]\d{2}:\d{2})?)?)?)?$",
    )
});

/// The precision a partial date/time was given with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DatePrecision {
    /// Year only (e.g., "2024")
    Year,
    /// Year and month (e.g., "2024-01")
    Month,
    /// Full date (e.g., "2024-01-15")
    Day,
    /// Date and time to minutes (e.g., "2024-01-15T10:30")
    Minute,
    /// Date and time to seconds (e.g., "2024-01-15T10:30:00")
    Second,
    /// Date and time with fractional seconds
    Fraction,
}

impl fmt::Display for DatePrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatePrecision::Year => write!(f, "year"),
            DatePrecision::Month => write!(f, "month"),
            DatePrecision::Day => write!(f, "day"),
            DatePrecision::Minute => write!(f, "minute"),
            DatePrecision::Second => write!(f, "second"),
            DatePrecision::Fraction => write!(f, "fraction"),
        }
    }
}

/// A date/time with optional trailing components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialDateTime {
    year: i32,
    month: Option<u32>,
    day: Option<u32>,
    hour: Option<u32>,
    minute: Option<u32>,
    second: Option<u32>,
    fraction: Option<String>,
    offset: Option<FixedOffset>,
}

impl PartialDateTime {
    /// Parses a partial date/time supplied for the named search parameter.
    ///
    /// The parameter name is only used to build the error.
    pub fn parse_parameter(parameter: &str, value: &str) -> Result<Self, ValidationError> {
        let invalid = |message: &str| ValidationError::InvalidSearchParameter {
            parameter: parameter.to_string(),
            message: format!("'{}' {}", value, message),
        };

        let pattern = PARTIAL_DATETIME
            .as_ref()
            .map_err(|e| invalid(&format!("could not be matched: {}", e)))?;
        let caps = pattern
            .captures(value.trim())
            .ok_or_else(|| invalid("is not a valid date/time"))?;

        let number = |name: &str| -> Option<u32> {
            caps.name(name).and_then(|m| m.as_str().parse::<u32>().ok())
        };

        let year = caps
            .name("year")
            .and_then(|m| m.as_str().parse::<i32>().ok())
            .ok_or_else(|| invalid("has no year"))?;
        let month = number("month");
        let day = number("day");
        let hour = number("hour");
        let minute = number("minute");
        let second = number("second");
        let fraction = caps.name("fraction").map(|m| m.as_str().to_string());

        if month.is_some_and(|m| !(1..=12).contains(&m)) {
            return Err(invalid("has an invalid month"));
        }
        if let Some(d) = day
            && NaiveDate::from_ymd_opt(year, month.unwrap_or(1), d).is_none()
        {
            return Err(invalid("has an invalid day"));
        }
        if hour.is_some_and(|h| h > 23) {
            return Err(invalid("has an invalid hour"));
        }
        if minute.is_some_and(|m| m > 59) {
            return Err(invalid("has an invalid minute"));
        }
        if second.is_some_and(|s| s > 59) {
            return Err(invalid("has an invalid second"));
        }

        let offset = match caps.name("offset").map(|m| m.as_str()) {
            None => None,
            Some("Z") => Some(utc_offset()),
            Some(text) => Some(parse_offset(text).ok_or_else(|| invalid("has an invalid offset"))?),
        };

        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            fraction,
            offset,
        })
    }

    /// Creates a full-precision value from an instant.
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        use chrono::{Datelike, Timelike};

        let nanos = instant.nanosecond() % 1_000_000_000;
        Self {
            year: instant.year(),
            month: Some(instant.month()),
            day: Some(instant.day()),
            hour: Some(instant.hour()),
            minute: Some(instant.minute()),
            second: Some(instant.second()),
            fraction: Some(format!("{:07}", nanos / 100)),
            offset: Some(utc_offset()),
        }
    }

    /// Returns the precision the value was given with.
    pub fn precision(&self) -> DatePrecision {
        if self.fraction.is_some() {
            DatePrecision::Fraction
        } else if self.second.is_some() {
            DatePrecision::Second
        } else if self.minute.is_some() {
            DatePrecision::Minute
        } else if self.day.is_some() {
            DatePrecision::Day
        } else if self.month.is_some() {
            DatePrecision::Month
        } else {
            DatePrecision::Year
        }
    }

    /// Resolves the earliest instant covered by this value.
    ///
    /// Missing components default to month 1, day 1, time 00:00:00.0 and a
    /// UTC offset.
    pub fn start_instant(&self) -> DateTime<Utc> {
        let offset = self.offset.unwrap_or_else(utc_offset);
        offset
            .from_local_datetime(&self.naive_start())
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&self.naive_start()))
    }

    /// Resolves the first instant after the range covered by this value.
    pub fn end_instant_exclusive(&self) -> DateTime<Utc> {
        let start = self.start_instant();
        match self.precision() {
            DatePrecision::Year => start
                .checked_add_months(Months::new(12))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            DatePrecision::Month => start
                .checked_add_months(Months::new(1))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            DatePrecision::Day => start + Duration::days(1),
            DatePrecision::Minute => start + Duration::minutes(1),
            DatePrecision::Second => start + Duration::seconds(1),
            DatePrecision::Fraction => {
                let digits = self.fraction.as_ref().map(|f| f.len()).unwrap_or(9) as u32;
                start + Duration::nanoseconds(10_i64.pow(9 - digits.min(9)))
            }
        }
    }

    /// Returns true if the instant falls inside the range covered by this value.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start_instant() && instant < self.end_instant_exclusive()
    }

    fn naive_start(&self) -> NaiveDateTime {
        let date = NaiveDate::from_ymd_opt(self.year, self.month.unwrap_or(1), self.day.unwrap_or(1))
            .unwrap_or(NaiveDate::MIN);
        let nanos = self.fraction.as_deref().map(fraction_nanos).unwrap_or(0);
        date.and_hms_nano_opt(
            self.hour.unwrap_or(0),
            self.minute.unwrap_or(0),
            self.second.unwrap_or(0),
            nanos,
        )
        .unwrap_or_else(|| date.and_time(chrono::NaiveTime::MIN))
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

fn parse_offset(text: &str) -> Option<FixedOffset> {
    let sign = if text.starts_with('-') { -1 } else { 1 };
    let hours: i32 = text.get(1..3)?.parse().ok()?;
    let minutes: i32 = text.get(4..6)?.parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn fraction_nanos(fraction: &str) -> u32 {
    let mut digits = fraction.chars().take(9).collect::<String>();
    while digits.len() < 9 {
        digits.push('0');
    }
    digits.parse().unwrap_or(0)
}

impl FromStr for PartialDateTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_parameter("date", s)
    }
}

impl fmt::Display for PartialDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.year)?;
        if let Some(month) = self.month {
            write!(f, "-{:02}", month)?;
        }
        if let Some(day) = self.day {
            write!(f, "-{:02}", day)?;
        }
        if let (Some(hour), Some(minute)) = (self.hour, self.minute) {
            write!(f, "T{:02}:{:02}", hour, minute)?;
            if let Some(second) = self.second {
                write!(f, ":{:02}", second)?;
                if let Some(fraction) = &self.fraction {
                    write!(f, ".{}", fraction)?;
                }
            }
            if let Some(offset) = self.offset {
                if offset.local_minus_utc() == 0 {
                    write!(f, "Z")?;
                } else {
                    write!(f, "{}", offset)?;
                }
            }
        }
        Ok(())
    }
}

impl Serialize for PartialDateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PartialDateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
