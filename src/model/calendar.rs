//! Calendar primitives: intervals, time slots, working hours
//!
//! All timestamps are naive (project-local); the `timezone` project
//! attribute is recorded for downstream stages but not applied here.

use time::{Duration, PrimitiveDateTime, Weekday};

/// A half-open time interval `[start, end)`. The constructor enforces
/// `end > start`; a zero-length interval is never representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: PrimitiveDateTime,
    pub end: PrimitiveDateTime,
}

impl Interval {
    /// Build an interval, rejecting `end <= start`.
    pub fn checked(start: PrimitiveDateTime, end: PrimitiveDateTime) -> Option<Self> {
        (end > start).then_some(Self { start, end })
    }

    /// The whole calendar day starting at `start`'s date.
    pub fn whole_day(start: PrimitiveDateTime) -> Self {
        let midnight = PrimitiveDateTime::new(start.date(), time::Time::MIDNIGHT);
        Self {
            start: midnight,
            end: midnight + Duration::days(1),
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// A project- or resource-level vacation: an optional label plus the
/// blocked interval.
#[derive(Debug, Clone, PartialEq)]
pub struct Vacation {
    pub name: Option<String>,
    pub interval: Interval,
}

/// Working period within one day, in seconds since midnight. The end may
/// be 86400 (`24:00`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub start: u32,
    pub end: u32,
}

impl TimeSlot {
    pub fn checked(start: u32, end: u32) -> Option<Self> {
        (end > start && end <= 86_400).then_some(Self { start, end })
    }
}

/// Per-weekday working periods. Indexed Monday through Sunday; a day with
/// no slots is off.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingHours {
    days: [Vec<TimeSlot>; 7],
}

impl WorkingHours {
    /// No working time at all.
    pub fn empty() -> Self {
        Self {
            days: Default::default(),
        }
    }

    /// The built-in default: Monday through Friday, 9:00-12:00 and
    /// 13:00-18:00.
    pub fn standard() -> Self {
        let mut hours = Self::empty();
        let morning = TimeSlot {
            start: 9 * 3600,
            end: 12 * 3600,
        };
        let afternoon = TimeSlot {
            start: 13 * 3600,
            end: 18 * 3600,
        };
        for day in [
            Weekday::Monday,
            Weekday::Tuesday,
            Weekday::Wednesday,
            Weekday::Thursday,
            Weekday::Friday,
        ] {
            hours.set_day(day, vec![morning, afternoon]);
        }
        hours
    }

    pub fn set_day(&mut self, day: Weekday, slots: Vec<TimeSlot>) {
        self.days[Self::index(day)] = slots;
    }

    pub fn day(&self, day: Weekday) -> &[TimeSlot] {
        &self.days[Self::index(day)]
    }

    pub fn is_working_day(&self, day: Weekday) -> bool {
        !self.day(day).is_empty()
    }

    fn index(day: Weekday) -> usize {
        day.number_days_from_monday() as usize
    }
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self::standard()
    }
}

/// Units a duration literal can carry (`2d`, `60min`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl DurationUnit {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "min" => Some(Self::Minutes),
            "h" => Some(Self::Hours),
            "d" => Some(Self::Days),
            "w" => Some(Self::Weeks),
            "m" => Some(Self::Months),
            "y" => Some(Self::Years),
            _ => None,
        }
    }

    /// Wall-clock seconds of one unit, used for interval arithmetic
    /// (`2024-01-01 +2w`). Months count 30 days, years 365. Working-time
    /// conversion is a project setting and lives on the project instead.
    pub fn calendar_seconds(&self) -> i64 {
        match self {
            Self::Minutes => 60,
            Self::Hours => 3_600,
            Self::Days => 86_400,
            Self::Weeks => 7 * 86_400,
            Self::Months => 30 * 86_400,
            Self::Years => 365 * 86_400,
        }
    }
}
