//! Rail time handling for timetable snapshots.
//!
//! The timetable feed gives working times as "HH:MM" or "HH:MM:SS"
//! time-of-day strings and public times as "HH:MM". A journey only carries a
//! scheduled start date, so times are placed on a date by walking the
//! journey in document order and detecting midnight rollover.

use chrono::{Duration, NaiveDate, NaiveTime, Timelike};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A date-aware time for rail services.
///
/// Two times at "01:30" within one journey might be on different dates, so
/// the date is always carried alongside the time of day.
///
/// # Examples
///
/// ```
/// use train_api::domain::RailTime;
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// let time = RailTime::parse("14:30:30", date).unwrap();
/// assert_eq!(time.to_string(), "14:30:30");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RailTime {
    date: NaiveDate,
    time: NaiveTime,
}

impl RailTime {
    /// Create a new RailTime from date and time components.
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self { date, time }
    }

    /// Parse a time from "HH:MM" or "HH:MM:SS" format on the given date.
    ///
    /// # Examples
    ///
    /// ```
    /// use train_api::domain::RailTime;
    /// use chrono::NaiveDate;
    ///
    /// let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    ///
    /// assert!(RailTime::parse("00:00", date).is_ok());
    /// assert!(RailTime::parse("23:59:30", date).is_ok());
    ///
    /// assert!(RailTime::parse("1430", date).is_err());
    /// assert!(RailTime::parse("14:3", date).is_err());
    /// assert!(RailTime::parse("25:00", date).is_err());
    /// assert!(RailTime::parse("12:00:60", date).is_err());
    /// ```
    pub fn parse(s: &str, date: NaiveDate) -> Result<Self, TimeError> {
        Ok(Self {
            date,
            time: parse_time_of_day(s)?,
        })
    }

    /// Returns the date component.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns the time component.
    pub fn time(&self) -> NaiveTime {
        self.time
    }

    /// Converts to a NaiveDateTime.
    pub fn to_datetime(&self) -> chrono::NaiveDateTime {
        self.date.and_time(self.time)
    }

    /// Place a time of day on whichever of the previous, same or next date
    /// lies closest to this time.
    ///
    /// Used for public times, which are published alongside a working time
    /// and are never more than a few minutes away from it.
    ///
    /// # Examples
    ///
    /// ```
    /// use train_api::domain::RailTime;
    /// use chrono::{NaiveDate, NaiveTime};
    ///
    /// let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    /// let working = RailTime::parse("23:59:30", date).unwrap();
    ///
    /// let public = working.nearest(NaiveTime::from_hms_opt(0, 1, 0).unwrap());
    /// assert_eq!(public.date(), NaiveDate::from_ymd_opt(2024, 3, 16).unwrap());
    /// ```
    pub fn nearest(&self, time: NaiveTime) -> Self {
        let candidates = [self.date.pred_opt(), Some(self.date), self.date.succ_opt()];

        candidates
            .into_iter()
            .flatten()
            .map(|date| Self { date, time })
            .min_by_key(|candidate| {
                candidate
                    .signed_duration_since(*self)
                    .num_seconds()
                    .unsigned_abs()
            })
            .unwrap_or(Self {
                date: self.date,
                time,
            })
    }

    /// Returns the duration between two times.
    ///
    /// Returns a negative duration if `other` is after `self`.
    pub fn signed_duration_since(&self, other: Self) -> Duration {
        self.to_datetime()
            .signed_duration_since(other.to_datetime())
    }
}

impl Ord for RailTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_datetime().cmp(&other.to_datetime())
    }
}

impl PartialOrd for RailTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for RailTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RailTime({} {})", self.date, self)
    }
}

impl fmt::Display for RailTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.time.hour(),
            self.time.minute(),
            self.time.second()
        )
    }
}

impl Serialize for RailTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.to_datetime().format("%Y-%m-%dT%H:%M:%S"))
    }
}

/// Parse "HH:MM" or "HH:MM:SS" into a time of day.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, TimeError> {
    let bytes = s.as_bytes();

    if bytes.len() != 5 && bytes.len() != 8 {
        return Err(TimeError::new("expected HH:MM or HH:MM:SS format"));
    }

    if bytes[2] != b':' {
        return Err(TimeError::new("expected colon at position 2"));
    }

    let hour =
        parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
    if hour > 23 {
        return Err(TimeError::new("hour must be 0-23"));
    }

    let minute =
        parse_two_digits(&bytes[3..5]).ok_or_else(|| TimeError::new("invalid minute digits"))?;
    if minute > 59 {
        return Err(TimeError::new("minute must be 0-59"));
    }

    let second = if bytes.len() == 8 {
        if bytes[5] != b':' {
            return Err(TimeError::new("expected colon at position 5"));
        }
        let second = parse_two_digits(&bytes[6..8])
            .ok_or_else(|| TimeError::new("invalid second digits"))?;
        if second > 59 {
            return Err(TimeError::new("second must be 0-59"));
        }
        second
    } else {
        0
    };

    NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(|| TimeError::new("invalid time"))
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}

/// Threshold for detecting midnight rollover in time sequences.
///
/// If a time appears more than 6 hours before the previous time in the
/// sequence, we assume it has rolled over to the next day.
const ROLLOVER_THRESHOLD_HOURS: i64 = 6;

/// Places successive times of day on dates, starting from a journey's
/// scheduled start date.
///
/// Times must be fed in the order they appear in the journey. A time more
/// than six hours earlier than its predecessor moves the clock to the next
/// day.
///
/// # Examples
///
/// ```
/// use train_api::domain::DayClock;
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// let mut clock = DayClock::new(date);
///
/// let depart = clock.place_str("23:30").unwrap();
/// let arrive = clock.place_str("00:15:30").unwrap();
///
/// assert_eq!(depart.date(), date);
/// assert_eq!(arrive.date(), NaiveDate::from_ymd_opt(2024, 3, 16).unwrap());
/// assert!(arrive > depart);
/// ```
#[derive(Debug, Clone)]
pub struct DayClock {
    current_date: NaiveDate,
    previous: Option<NaiveTime>,
}

impl DayClock {
    /// Start a clock on the given date.
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            current_date: start_date,
            previous: None,
        }
    }

    /// Place a time of day, advancing the date on rollover.
    pub fn place(&mut self, time: NaiveTime) -> Result<RailTime, TimeError> {
        if let Some(prev) = self.previous {
            let diff_minutes = minutes_of_day(time) - minutes_of_day(prev);

            if diff_minutes < -(ROLLOVER_THRESHOLD_HOURS * 60) {
                self.current_date = self
                    .current_date
                    .succ_opt()
                    .ok_or_else(|| TimeError::new("date overflow"))?;
            }
        }

        self.previous = Some(time);
        Ok(RailTime::new(self.current_date, time))
    }

    /// The date the next time will be placed on, barring rollover.
    pub fn date(&self) -> NaiveDate {
        self.current_date
    }

    /// Parse and place a time string.
    pub fn place_str(&mut self, s: &str) -> Result<RailTime, TimeError> {
        let time = parse_time_of_day(s)?;
        self.place(time)
    }
}

fn minutes_of_day(time: NaiveTime) -> i64 {
    time.hour() as i64 * 60 + time.minute() as i64
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any valid HH:MM:SS parses back to the same components
        #[test]
        fn roundtrip(h in 0u32..24, m in 0u32..60, s in 0u32..60) {
            let text = format!("{h:02}:{m:02}:{s:02}");
            let t = parse_time_of_day(&text).unwrap();
            prop_assert_eq!((t.hour(), t.minute(), t.second()), (h, m, s));
        }

        /// A clock never produces a time earlier than the start date
        #[test]
        fn clock_never_goes_backwards_a_day(minutes in proptest::collection::vec(0u32..1440, 1..20)) {
            let start = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
            let mut clock = DayClock::new(start);
            let mut last_date = start;
            for m in minutes {
                let time = NaiveTime::from_hms_opt(m / 60, m % 60, 0).unwrap();
                let placed = clock.place(time).unwrap();
                prop_assert!(placed.date() >= last_date);
                last_date = placed.date();
            }
        }
    }
}
