//! The weekly time grid: days, periods and the slots they span.

use chrono::{Datelike, NaiveDate, Weekday};
use itertools::iproduct;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest period index of a school day.
pub const FIRST_PERIOD: u8 = 1;
/// Number of periods in the default day.
pub const PERIODS_PER_DAY: u8 = 8;

/// A weekday on which classes can be held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Day {
    /// All schedulable days in week order.
    pub const ALL: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    /// Zero-based offset from Monday.
    pub fn index(self) -> usize {
        match self {
            Day::Monday => 0,
            Day::Tuesday => 1,
            Day::Wednesday => 2,
            Day::Thursday => 3,
            Day::Friday => 4,
        }
    }

    /// Map a chrono weekday onto a school day. Weekends have no counterpart.
    pub fn from_weekday(weekday: Weekday) -> Option<Day> {
        match weekday {
            Weekday::Mon => Some(Day::Monday),
            Weekday::Tue => Some(Day::Tuesday),
            Weekday::Wed => Some(Day::Wednesday),
            Weekday::Thu => Some(Day::Thursday),
            Weekday::Fri => Some(Day::Friday),
            Weekday::Sat | Weekday::Sun => None,
        }
    }

    /// Three-letter label used in grids and derived ids.
    pub fn short_name(self) -> &'static str {
        match self {
            Day::Monday => "Mon",
            Day::Tuesday => "Tue",
            Day::Wednesday => "Wed",
            Day::Thursday => "Thu",
            Day::Friday => "Fri",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A single period on a given day, optionally pinned to a calendar date.
///
/// Two slots that both carry a date compare by date and period; otherwise
/// they compare by weekday and period. A dated slot therefore still matches
/// the recurring weekly slot it falls on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeSlot {
    pub day: Day,
    pub period: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl TimeSlot {
    /// Create a recurring weekly slot.
    pub fn new(day: Day, period: u8) -> Self {
        TimeSlot {
            day,
            period,
            date: None,
        }
    }

    /// Create a slot for a concrete date. Returns `None` for weekend dates.
    pub fn on_date(date: NaiveDate, period: u8) -> Option<Self> {
        Day::from_weekday(date.weekday()).map(|day| TimeSlot {
            day,
            period,
            date: Some(date),
        })
    }

    /// The same slot without its calendar date.
    pub fn weekly(&self) -> Self {
        TimeSlot::new(self.day, self.period)
    }

    /// Copy of this slot pinned to `date`.
    pub fn with_date(&self, date: NaiveDate) -> Self {
        TimeSlot {
            date: Some(date),
            ..*self
        }
    }

    /// Slots occupy exactly one period, so overlapping means being equal.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self == other
    }

    /// Whether this slot matches any slot in `slots`.
    pub fn is_in(&self, slots: &[TimeSlot]) -> bool {
        slots.iter().any(|slot| slot == self)
    }
}

impl PartialEq for TimeSlot {
    fn eq(&self, other: &Self) -> bool {
        match (self.date, other.date) {
            (Some(a), Some(b)) => a == b && self.period == other.period,
            _ => self.day == other.day && self.period == other.period,
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.date {
            Some(date) => write!(f, "{} P{} ({})", self.day.short_name(), self.period, date),
            None => write!(f, "{} P{}", self.day.short_name(), self.period),
        }
    }
}

/// The finite universe of assignable slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeGrid {
    pub days: Vec<Day>,
    pub periods_per_day: u8,
}

impl Default for TimeGrid {
    fn default() -> Self {
        TimeGrid {
            days: Day::ALL.to_vec(),
            periods_per_day: PERIODS_PER_DAY,
        }
    }
}

impl TimeGrid {
    /// Create a grid over the given days with `periods_per_day` periods each.
    pub fn new(days: Vec<Day>, periods_per_day: u8) -> Self {
        TimeGrid {
            days,
            periods_per_day,
        }
    }

    /// Every slot in the grid, day-major.
    pub fn slots(&self) -> Vec<TimeSlot> {
        iproduct!(
            self.days.iter().copied(),
            FIRST_PERIOD..FIRST_PERIOD + self.periods_per_day
        )
        .map(|(day, period)| TimeSlot::new(day, period))
        .collect()
    }

    /// Total number of slots.
    pub fn len(&self) -> usize {
        self.days.len() * self.periods_per_day as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the slot lies inside the grid.
    pub fn contains(&self, slot: &TimeSlot) -> bool {
        self.days.contains(&slot.day)
            && slot.period >= FIRST_PERIOD
            && slot.period < FIRST_PERIOD + self.periods_per_day
    }

    /// Uniformly random slot from the whole universe.
    pub fn random_slot<R: Rng>(&self, rng: &mut R) -> Option<TimeSlot> {
        self.slots().choose(rng).copied()
    }
}
