//! Weekly opening hours and the "open at" facet.
//!
//! Hours are kept per weekday as an inclusive `open..=close` window. A window
//! whose closing time is earlier than its opening time runs past midnight and
//! is matched on the day it opens.
//!
//! # Examples
//! ```
//! use chrono::{NaiveTime, Weekday};
//! use savour_core::{OpenAt, OpeningHours, WeeklyHours};
//!
//! let at = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
//! let hours = WeeklyHours::new().with_day(Weekday::Fri, OpeningHours::new(at(18, 0), at(2, 0)));
//!
//! assert!(hours.is_open_at(Weekday::Fri, at(23, 30)));
//! assert!(!hours.is_open_at(Weekday::Sat, at(23, 30)));
//! assert_eq!(
//!     "friday 23:30".parse::<OpenAt>(),
//!     Ok(OpenAt::new(Weekday::Fri, at(23, 30)))
//! );
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};
use thiserror::Error;

/// Opening and closing time for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpeningHours {
    /// Time the doors open.
    pub open: NaiveTime,
    /// Time the doors close.
    pub close: NaiveTime,
}

impl OpeningHours {
    /// Pair an opening time with a closing time.
    pub const fn new(open: NaiveTime, close: NaiveTime) -> Self {
        Self { open, close }
    }

    /// Whether `time` falls inside the window, both ends included.
    pub fn contains(self, time: NaiveTime) -> bool {
        if self.open <= self.close {
            self.open <= time && time <= self.close
        } else {
            time >= self.open || time <= self.close
        }
    }
}

/// Opening hours for each day of the week. A day without hours is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct WeeklyHours {
    days: [Option<OpeningHours>; 7],
}

impl WeeklyHours {
    /// Hours with every day closed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one day's hours while returning `self` for chaining.
    #[must_use]
    pub fn with_day(mut self, day: Weekday, hours: OpeningHours) -> Self {
        if let Some(slot) = self.days.get_mut(slot_of(day)) {
            *slot = Some(hours);
        }
        self
    }

    /// Hours for `day`, or `None` when the venue does not open.
    pub fn on(&self, day: Weekday) -> Option<OpeningHours> {
        self.days.get(slot_of(day)).copied().flatten()
    }

    /// Whether the venue is open at `time` on `day`.
    pub fn is_open_at(&self, day: Weekday, time: NaiveTime) -> bool {
        self.on(day).is_some_and(|hours| hours.contains(time))
    }

    /// Whether no day has hours recorded.
    pub fn is_empty(&self) -> bool {
        self.days.iter().all(Option::is_none)
    }
}

fn slot_of(day: Weekday) -> usize {
    day.num_days_from_monday() as usize
}

/// A weekday and time of day a venue must be open at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpenAt {
    /// Day of the week.
    pub weekday: Weekday,
    /// Time of day.
    pub time: NaiveTime,
}

impl OpenAt {
    /// Pair a weekday with a time of day.
    pub const fn new(weekday: Weekday, time: NaiveTime) -> Self {
        Self { weekday, time }
    }

    /// The weekday and time of a local timestamp.
    pub fn from_datetime(moment: NaiveDateTime) -> Self {
        Self::new(moment.weekday(), moment.time())
    }
}

impl fmt::Display for OpenAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.weekday, self.time.format("%H:%M"))
    }
}

/// Errors returned when parsing an [`OpenAt`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpenAtError {
    /// The text was not a weekday followed by a time.
    #[error("expected '<weekday> <HH:MM>', found '{input}'")]
    Format {
        /// Rejected text.
        input: String,
    },
    /// The weekday was not recognised.
    #[error("unknown weekday '{day}'")]
    Weekday {
        /// Rejected day.
        day: String,
    },
    /// The time was not `HH:MM` or `HH:MM:SS`.
    #[error("invalid time of day '{time}'")]
    Time {
        /// Rejected time.
        time: String,
    },
}

impl FromStr for OpenAt {
    type Err = OpenAtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (Some(day), Some(time), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(OpenAtError::Format {
                input: s.to_owned(),
            });
        };
        let weekday = day.parse::<Weekday>().map_err(|_| OpenAtError::Weekday {
            day: day.to_owned(),
        })?;
        let time = NaiveTime::parse_from_str(time, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
            .map_err(|_| OpenAtError::Time {
                time: time.to_owned(),
            })?;
        Ok(Self::new(weekday, time))
    }
}
