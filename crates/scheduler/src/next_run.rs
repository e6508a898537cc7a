use chrono::{Days, TimeDelta};
use tracing::{debug, warn};

use crate::clock::WeekClock;
use crate::window::{MINUTES_PER_WEEK, ScheduleError, ScheduleWindow, within_window};

/// First instant at or after `candidate` that sits on the interval grid
/// anchored at the window start of the candidate's week and lies inside the
/// window.
///
/// The anchor is `start_time` on the latest `start_day` whose date is not after
/// the candidate's date, so a candidate earlier on the start day itself snaps
/// forward to the window opening. From the first grid point at or after the
/// candidate the grid is scanned forward for at most one week.
pub fn next_window_run<T: WeekClock>(
    candidate: &T,
    window: &ScheduleWindow,
) -> Result<T, ScheduleError> {
    let interval = window.interval_minutes() as i64;
    let start = window.start();

    let days_back = (candidate.weekday_index() as i64 - start.day() as i64).rem_euclid(7) as u64;
    let anchor_date = candidate
        .local_date()
        .checked_sub_days(Days::new(days_back))
        .ok_or_else(|| ScheduleError::UnrepresentableTime(candidate.local_date().to_string()))?;
    let anchor = candidate
        .at_local(anchor_date, start.time())
        .ok_or_else(|| {
            ScheduleError::UnrepresentableTime(format!("{} {}", anchor_date, start.time()))
        })?;

    let elapsed = candidate.minutes_since(&anchor).max(0.0);
    let steps = (elapsed / interval as f64).ceil() as i64;
    let mut next_run = anchor.add_minutes(steps * interval);
    debug!("Grid anchored {} steps past window start", steps);

    let max_steps = MINUTES_PER_WEEK as i64 / interval;
    for _ in 0..=max_steps {
        if within_window(&next_run, window) {
            return Ok(next_run);
        }
        next_run = next_run.add_minutes(interval);
    }
    warn!("No active slot within a week for window {}", window);
    Err(ScheduleError::NoActiveSlot)
}

/// `HH:MM:SS` until the next run; negative durations read as zero.
pub fn format_countdown(remaining: TimeDelta) -> String {
    let total = remaining.num_seconds().max(0);
    let (hours, rem) = (total / 3600, total % 3600);
    let (minutes, seconds) = (rem / 60, rem % 60);
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
