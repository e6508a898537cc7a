use std::fmt;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::WeekClock;

pub const MINUTES_PER_DAY: u32 = 24 * 60;
pub const MINUTES_PER_WEEK: u32 = 7 * MINUTES_PER_DAY;

const DAY_NAMES: &[(&str, u8)] = &[
    ("mon", 0),
    ("monday", 0),
    ("tue", 1),
    ("tuesday", 1),
    ("wed", 2),
    ("wednesday", 2),
    ("thu", 3),
    ("thursday", 3),
    ("fri", 4),
    ("friday", 4),
    ("sat", 5),
    ("saturday", 5),
    ("sun", 6),
    ("sunday", 6),
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("interval must be at least one minute")]
    InvalidInterval,
    #[error("invalid day: {0}")]
    InvalidDay(String),
    #[error("invalid time '{0}', expected HH:MM")]
    InvalidTime(String),
    #[error("local time {0} does not exist in the candidate's time zone")]
    UnrepresentableTime(String),
    #[error("window never becomes active within a week of the candidate")]
    NoActiveSlot,
}

/// Day-of-week plus time-of-day, Monday = 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekTime {
    day: u8,
    time: NaiveTime,
}

impl WeekTime {
    pub fn new(day: u8, time: NaiveTime) -> Result<Self, ScheduleError> {
        if day > 6 {
            return Err(ScheduleError::InvalidDay(day.to_string()));
        }
        Ok(Self { day, time })
    }

    /// `("fri", "23:35")`, day names are case-insensitive.
    pub fn parse(day: &str, time: &str) -> Result<Self, ScheduleError> {
        Self::new(parse_day(day)?, parse_time(time)?)
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn time(&self) -> NaiveTime {
        self.time
    }

    pub fn minutes_since_monday(&self) -> u32 {
        minutes_from_day(self.day as u32, self.time)
    }
}

impl fmt::Display for WeekTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = DAY_NAMES
            .iter()
            .find(|(name, idx)| *idx == self.day && name.len() == 3)
            .map(|(name, _)| *name)
            .unwrap_or("?");
        write!(f, "{} {}", name, self.time.format("%H:%M"))
    }
}

/// Recurring interval plus a weekly active window `[start, stop)`.
/// `start` later in the week than `stop` wraps across the week boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleWindow {
    interval_minutes: u32,
    start: WeekTime,
    stop: WeekTime,
}

impl ScheduleWindow {
    pub fn new(interval_minutes: u32, start: WeekTime, stop: WeekTime) -> Result<Self, ScheduleError> {
        if interval_minutes == 0 {
            return Err(ScheduleError::InvalidInterval);
        }
        Ok(Self {
            interval_minutes,
            start,
            stop,
        })
    }

    pub fn interval_minutes(&self) -> u32 {
        self.interval_minutes
    }

    pub fn start(&self) -> WeekTime {
        self.start
    }

    pub fn stop(&self) -> WeekTime {
        self.stop
    }

    pub fn wraps_week(&self) -> bool {
        self.start.minutes_since_monday() > self.stop.minutes_since_monday()
    }

    pub fn contains<T: WeekClock>(&self, now: &T) -> bool {
        within_window(now, self)
    }
}

impl fmt::Display for ScheduleWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "every {} min, {} to {}",
            self.interval_minutes, self.start, self.stop
        )
    }
}

pub fn parse_day(value: &str) -> Result<u8, ScheduleError> {
    let key = value.trim().to_lowercase();
    DAY_NAMES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, idx)| *idx)
        .ok_or_else(|| ScheduleError::InvalidDay(value.to_string()))
}

pub fn parse_time(value: &str) -> Result<NaiveTime, ScheduleError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| ScheduleError::InvalidTime(value.to_string()))
}

/// Seconds are ignored: everything is compared at minute resolution.
fn minutes_from_day(day: u32, time: NaiveTime) -> u32 {
    day * MINUTES_PER_DAY + time.hour() * 60 + time.minute()
}

pub fn within_window<T: WeekClock>(now: &T, window: &ScheduleWindow) -> bool {
    let start_idx = window.start.minutes_since_monday();
    let stop_idx = window.stop.minutes_since_monday();
    let current_idx = minutes_from_day(now.weekday_index(), now.local_time());

    if start_idx <= stop_idx {
        start_idx <= current_idx && current_idx < stop_idx
    } else {
        current_idx >= start_idx || current_idx < stop_idx
    }
}
