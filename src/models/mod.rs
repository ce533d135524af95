//! Rostering domain models.
//!
//! Provides the data types shared by the quota allocator, the optimizer,
//! and the validators.
//!
//! # Domain Mappings
//!
//! | shift-roster | Meaning |
//! |--------------|---------|
//! | Employee | A person on the roster, with an experience level |
//! | Preferences | Off-shifts, accepted shift types, quota overrides |
//! | Schedule | One month of day/night slot assignments |
//! | MonthKey | The calendar month being rostered |

mod calendar;
mod employee;
mod schedule;

pub use calendar::{MonthKey, MONTH_LENGTHS};
pub use employee::{Employee, EmployeeId, Experience, Preferences, ShiftPreference};
pub use schedule::{DayAssignment, Schedule, ShiftAssignment, ShiftType};
