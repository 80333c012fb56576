use std::time::Duration;

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::ScheduleError;

/// Collection window expressed in a named civil timezone
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleWindow {
    start: DateTime<Tz>,
    end: DateTime<Tz>,
}

/// Where an instant falls relative to the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStatus {
    NotStarted { until: Duration },
    Open,
    Ended,
}

impl ScheduleWindow {
    /// Build a window from `M/D` dates and `H:MM AM/PM` (or 24h `HH:MM`) times.
    ///
    /// The end is moved one year forward when it does not fall after the
    /// start, so `12/31 11:00 PM` to `1/1 1:00 AM` spans the new year.
    pub fn parse(
        start_date: &str,
        start_time: &str,
        end_date: &str,
        end_time: &str,
        tz: Tz,
        year: i32,
    ) -> Result<Self, ScheduleError> {
        let (start_month, start_day) = parse_month_day(start_date)?;
        let (end_month, end_day) = parse_month_day(end_date)?;
        let start_clock = parse_clock_time(start_time)?;
        let end_clock = parse_clock_time(end_time)?;

        let start = localize(tz, date(year, start_month, start_day, start_date)?.and_time(start_clock))?;

        let mut end = localize(tz, date(year, end_month, end_day, end_date)?.and_time(end_clock))?;
        if end <= start {
            end = localize(tz, date(year + 1, end_month, end_day, end_date)?.and_time(end_clock))?;
        }

        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Tz> {
        self.start
    }

    pub fn end(&self) -> DateTime<Tz> {
        self.end
    }

    /// Inclusive at both ends
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    pub fn status(&self, now: DateTime<Utc>) -> WindowStatus {
        if now < self.start {
            let until = self
                .start
                .signed_duration_since(now)
                .to_std()
                .unwrap_or(Duration::ZERO);
            WindowStatus::NotStarted { until }
        } else if now > self.end {
            WindowStatus::Ended
        } else {
            WindowStatus::Open
        }
    }
}

/// Look up an IANA timezone name such as "US/Eastern" or "America/New_York"
pub fn parse_timezone(name: &str) -> Result<Tz, ScheduleError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ScheduleError::UnknownTimezone(name.to_string()))
}

fn parse_month_day(value: &str) -> Result<(u32, u32), ScheduleError> {
    let invalid = || ScheduleError::InvalidDate(value.to_string());

    let (month, day) = value.trim().split_once('/').ok_or_else(invalid)?;
    let month: u32 = month.trim().parse().map_err(|_| invalid())?;
    let day: u32 = day.trim().parse().map_err(|_| invalid())?;

    Ok((month, day))
}

fn parse_clock_time(value: &str) -> Result<NaiveTime, ScheduleError> {
    let invalid = || ScheduleError::InvalidTime(value.to_string());

    let upper = value.trim().to_uppercase();
    let (clock, meridiem) = if let Some(clock) = upper.strip_suffix("AM") {
        (clock.trim(), Some(false))
    } else if let Some(clock) = upper.strip_suffix("PM") {
        (clock.trim(), Some(true))
    } else {
        (upper.as_str(), None)
    };

    let (hour, minute) = clock.split_once(':').ok_or_else(invalid)?;
    let mut hour: u32 = hour.trim().parse().map_err(|_| invalid())?;
    let minute: u32 = minute.trim().parse().map_err(|_| invalid())?;

    if let Some(is_pm) = meridiem {
        if !(1..=12).contains(&hour) {
            return Err(invalid());
        }
        hour = match (is_pm, hour) {
            (true, 12) => 12,
            (true, h) => h + 12,
            (false, 12) => 0,
            (false, h) => h,
        };
    }

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

fn date(year: i32, month: u32, day: u32, raw: &str) -> Result<NaiveDate, ScheduleError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ScheduleError::InvalidDate(raw.to_string()))
}

/// Earliest mapping when the local time is ambiguous (DST fall-back)
fn localize(tz: Tz, naive: NaiveDateTime) -> Result<DateTime<Tz>, ScheduleError> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => Err(ScheduleError::NonexistentLocalTime(naive.to_string())),
    }
}
