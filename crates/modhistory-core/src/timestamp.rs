//! Timestamp normalization.
//!
//! Every instant recorded in a snapshot is rendered as
//! `YYYY-MM-DD <weekday> HH:MM:SS` in the local timezone of the process,
//! with the weekday drawn from a fixed Monday-first table.

use std::fmt::Display;
use std::time::SystemTime;

use chrono::{DateTime, Datelike, Local, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumString};

const ENGLISH_WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const KOREAN_WEEKDAYS: [&str; 7] = ["월", "화", "수", "목", "금", "토", "일"];

/// Weekday label table used in display strings.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, StrumDisplay,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum WeekdayNames {
    /// `Mon`, `Tue`, ... `Sun`.
    #[default]
    English,
    /// Single-character Korean names, `월` through `일`.
    Korean,
}

impl WeekdayNames {
    /// The seven labels, Monday first.
    pub fn table(self) -> &'static [&'static str; 7] {
        match self {
            Self::English => &ENGLISH_WEEKDAYS,
            Self::Korean => &KOREAN_WEEKDAYS,
        }
    }

    /// Label for a single weekday.
    pub fn label(self, weekday: Weekday) -> &'static str {
        self.table()[weekday.num_days_from_monday() as usize]
    }
}

/// Renders instants as normalized display strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimestampFormatter {
    names: WeekdayNames,
}

impl TimestampFormatter {
    /// Create a formatter using the given weekday table.
    pub fn new(names: WeekdayNames) -> Self {
        Self { names }
    }

    /// Weekday table in use.
    pub fn weekday_names(&self) -> WeekdayNames {
        self.names
    }

    /// Format an instant in the local system timezone.
    pub fn format(&self, instant: SystemTime) -> String {
        self.format_datetime(&DateTime::<Local>::from(instant))
    }

    /// Format an instant in an explicit timezone.
    pub fn format_in<Tz>(&self, instant: SystemTime, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        self.format_datetime(&DateTime::<Utc>::from(instant).with_timezone(tz))
    }

    /// Format seconds since the Unix epoch (fractional part allowed).
    ///
    /// Returns `None` for non-finite values or values chrono cannot represent.
    pub fn format_epoch_seconds(&self, seconds: f64) -> Option<String> {
        if !seconds.is_finite() {
            return None;
        }
        let whole = seconds.floor();
        let nanos = ((seconds - whole) * 1_000_000_000.0).round() as u32;
        // Rounding can push a fraction like .9999999999 up to a full second.
        let (whole, nanos) = if nanos >= 1_000_000_000 {
            (whole + 1.0, 0)
        } else {
            (whole, nanos)
        };
        if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
            return None;
        }
        let utc = DateTime::<Utc>::from_timestamp(whole as i64, nanos)?;
        Some(self.format_datetime(&utc.with_timezone(&Local)))
    }

    fn format_datetime<Tz>(&self, dt: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        format!(
            "{} {} {}",
            dt.format("%Y-%m-%d"),
            self.names.label(dt.weekday()),
            dt.format("%H:%M:%S")
        )
    }
}
