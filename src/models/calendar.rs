//! Calendar month model.
//!
//! A roster is always built for exactly one calendar month. `MonthKey`
//! identifies that month and answers the calendar questions the rest of
//! the crate needs: how many days it has, which dates it covers, and how
//! it compares to "today".
//!
//! # Month Lengths
//! Quotas are configured per month length (28, 29, 30, 31 days), so the
//! month length is the key used by the quota allocator, not the month itself.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::RosterError;

/// All month lengths a Gregorian month can have.
pub const MONTH_LENGTHS: [u32; 4] = [28, 29, 30, 31];

/// A calendar month (year + month number).
///
/// Ordered chronologically. Displays and parses as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// Creates a month key.
    ///
    /// # Errors
    /// `RosterError::InvalidMonth` if `month` is not in 1..=12 or the year is
    /// outside chrono's supported range.
    pub fn new(year: i32, month: u32) -> Result<Self, RosterError> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(RosterError::InvalidMonth { year, month });
        }
        Ok(Self { year, month })
    }

    /// The month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Calendar year.
    #[inline]
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Month number (1-12).
    #[inline]
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Number of days in this month (28-31).
    pub fn days_in_month(&self) -> u32 {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        match (
            NaiveDate::from_ymd_opt(self.year, self.month, 1),
            NaiveDate::from_ymd_opt(next_year, next_month, 1),
        ) {
            (Some(first), Some(next_first)) => (next_first - first).num_days() as u32,
            // Last representable month: count forward until the date stops existing.
            _ => (28..=31)
                .rev()
                .find(|&d| NaiveDate::from_ymd_opt(self.year, self.month, d).is_some())
                .unwrap_or(28),
        }
    }

    /// The date of `day` (1-based) in this month.
    ///
    /// # Errors
    /// `RosterError::InvalidDate` if the day does not exist in this month.
    pub fn date(&self, day: u32) -> Result<NaiveDate, RosterError> {
        NaiveDate::from_ymd_opt(self.year, self.month, day).ok_or(RosterError::InvalidDate {
            month: *self,
            day,
        })
    }

    /// Iterates over every date of the month in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (1..=self.days_in_month())
            .filter_map(move |day| NaiveDate::from_ymd_opt(self.year, self.month, day))
    }

    /// Whether `date` falls within this month.
    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RosterError::InvalidMonthKey(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = RosterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(value: MonthKey) -> Self {
        value.to_string()
    }
}
