//! Employee model.
//!
//! Employees are owned by the data store. The core reads snapshots and
//! never changes an employee's identity.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ShiftType;

/// Employee identifier.
pub type EmployeeId = u32;

/// Experience level. Each level forms one quota bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Experience {
    High,
    Low,
}

impl Experience {
    /// Both levels.
    pub const ALL: [Experience; 2] = [Experience::High, Experience::Low];

    /// Default per-employee quota for this level and month length.
    ///
    /// | Level | 28 | 29 | 30 | 31 |
    /// |-------|----|----|----|----|
    /// | High  | 22 | 22 | 23 | 24 |
    /// | Low   | 18 | 21 | 21 | 21 |
    pub fn default_quota(self, days_in_month: u32) -> i64 {
        match (self, days_in_month) {
            (Experience::High, 28 | 29) => 22,
            (Experience::High, 30) => 23,
            (Experience::High, 31) => 24,
            (Experience::Low, 28) => 18,
            (Experience::Low, 29..=31) => 21,
            _ => 20,
        }
    }
}

impl fmt::Display for Experience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Experience::High => f.write_str("High"),
            Experience::Low => f.write_str("Low"),
        }
    }
}

/// Which shift types an employee accepts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftPreference {
    /// Either shift ("both").
    #[default]
    Any,
    /// Only the listed shift types.
    Only(BTreeSet<ShiftType>),
}

impl ShiftPreference {
    /// Restricts to a single shift type.
    pub fn only(shift: ShiftType) -> Self {
        ShiftPreference::Only(BTreeSet::from([shift]))
    }

    /// Whether `shift` is acceptable.
    pub fn allows(&self, shift: ShiftType) -> bool {
        match self {
            ShiftPreference::Any => true,
            ShiftPreference::Only(types) => types.contains(&shift),
        }
    }
}

/// Scheduling preferences of one employee.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Specific (date, shift) pairs the employee must not work.
    pub off_shifts: BTreeSet<(NaiveDate, ShiftType)>,
    /// Accepted shift types.
    pub preferred_shifts: ShiftPreference,
    /// Quota overrides keyed by month length (28-31). Always win over bucket shares.
    pub custom_quotas: BTreeMap<u32, i64>,
    /// Free text, ignored by scheduling.
    pub notes: String,
}

impl Preferences {
    /// Creates empty preferences (no restrictions).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an off-shift.
    pub fn with_off_shift(mut self, date: NaiveDate, shift: ShiftType) -> Self {
        self.off_shifts.insert((date, shift));
        self
    }

    /// Marks a whole date off (both shifts).
    pub fn with_off_day(self, date: NaiveDate) -> Self {
        self.with_off_shift(date, ShiftType::Day)
            .with_off_shift(date, ShiftType::Night)
    }

    /// Restricts accepted shift types.
    pub fn with_preferred(mut self, preference: ShiftPreference) -> Self {
        self.preferred_shifts = preference;
        self
    }

    /// Sets a quota override for a month length.
    pub fn with_custom_quota(mut self, days_in_month: u32, quota: i64) -> Self {
        self.custom_quotas.insert(days_in_month, quota);
        self
    }

    /// Whether (date, shift) is an off-shift.
    #[inline]
    pub fn is_off_shift(&self, date: NaiveDate, shift: ShiftType) -> bool {
        self.off_shifts.contains(&(date, shift))
    }

    /// Whether both shifts of `date` are off.
    pub fn is_off_day(&self, date: NaiveDate) -> bool {
        ShiftType::ALL.iter().all(|s| self.is_off_shift(date, *s))
    }
}

/// A rostered employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier.
    pub id: EmployeeId,
    /// Display name. Quotas are keyed by name.
    pub name: String,
    /// Experience level (quota bucket).
    pub experience: Experience,
    /// Inactive employees are never scheduled.
    pub is_active: bool,
    /// Scheduling preferences.
    pub preferences: Preferences,
}

impl Employee {
    /// Creates an active employee with no preferences.
    pub fn new(id: EmployeeId, name: impl Into<String>, experience: Experience) -> Self {
        Self {
            id,
            name: name.into(),
            experience,
            is_active: true,
            preferences: Preferences::default(),
        }
    }

    /// Sets the active flag.
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Sets preferences.
    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = preferences;
        self
    }

    /// Custom quota override for a month length, if set.
    #[inline]
    pub fn custom_quota(&self, days_in_month: u32) -> Option<i64> {
        self.preferences.custom_quotas.get(&days_in_month).copied()
    }
}
