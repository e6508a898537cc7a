use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};

/// Timestamp operations the window math needs. Implemented for naive and
/// zone-aware timestamps; a single computation is generic over one of them,
/// so naive and aware values can never be mixed.
pub trait WeekClock: Clone + PartialOrd {
    /// Monday = 0.
    fn weekday_index(&self) -> u32;

    fn local_date(&self) -> NaiveDate;

    fn local_time(&self) -> NaiveTime;

    /// `date` at wall-clock `time`, in the same zone as `self`.
    /// `None` when that local time does not exist in the zone.
    fn at_local(&self, date: NaiveDate, time: NaiveTime) -> Option<Self>;

    fn add_minutes(&self, minutes: i64) -> Self;

    fn minutes_since(&self, earlier: &Self) -> f64;
}

impl WeekClock for NaiveDateTime {
    fn weekday_index(&self) -> u32 {
        self.weekday().num_days_from_monday()
    }

    fn local_date(&self) -> NaiveDate {
        self.date()
    }

    fn local_time(&self) -> NaiveTime {
        self.time()
    }

    fn at_local(&self, date: NaiveDate, time: NaiveTime) -> Option<Self> {
        Some(date.and_time(time))
    }

    fn add_minutes(&self, minutes: i64) -> Self {
        *self + TimeDelta::minutes(minutes)
    }

    fn minutes_since(&self, earlier: &Self) -> f64 {
        self.signed_duration_since(*earlier).num_milliseconds() as f64 / 60_000.0
    }
}

impl<Tz: TimeZone> WeekClock for DateTime<Tz> {
    fn weekday_index(&self) -> u32 {
        self.weekday().num_days_from_monday()
    }

    fn local_date(&self) -> NaiveDate {
        self.date_naive()
    }

    fn local_time(&self) -> NaiveTime {
        self.time()
    }

    fn at_local(&self, date: NaiveDate, time: NaiveTime) -> Option<Self> {
        self.timezone()
            .from_local_datetime(&date.and_time(time))
            .earliest()
    }

    fn add_minutes(&self, minutes: i64) -> Self {
        self.clone() + TimeDelta::minutes(minutes)
    }

    fn minutes_since(&self, earlier: &Self) -> f64 {
        self.clone()
            .signed_duration_since(earlier)
            .num_milliseconds() as f64
            / 60_000.0
    }
}
