//! Schedule (roster) model.
//!
//! A schedule maps each date of a month to its two shift slots, day and
//! night. Each slot holds at most one assignee. Schedules are transient
//! working values: whoever calls the generator decides whether and how
//! to persist them.
//!
//! # Shift Units
//! Quotas are counted in shift units: a day shift is worth 1 unit and a
//! night shift 2 units.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::EmployeeId;

/// The two daily shift slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftType {
    /// Day shift (1 unit).
    Day,
    /// Night shift (2 units).
    Night,
}

impl ShiftType {
    /// Both shift types, day first.
    pub const ALL: [ShiftType; 2] = [ShiftType::Day, ShiftType::Night];

    /// Quota weight of this shift.
    #[inline]
    pub fn units(self) -> i64 {
        match self {
            ShiftType::Day => 1,
            ShiftType::Night => 2,
        }
    }

    /// The other shift of the same day.
    #[inline]
    pub fn other(self) -> ShiftType {
        match self {
            ShiftType::Day => ShiftType::Night,
            ShiftType::Night => ShiftType::Day,
        }
    }

    /// Slot index (day = 0, night = 1).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            ShiftType::Day => 0,
            ShiftType::Night => 1,
        }
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftType::Day => f.write_str("day shift"),
            ShiftType::Night => f.write_str("night shift"),
        }
    }
}

/// An employee placed on a shift slot.
///
/// Deserializes from both the legacy shape (a bare employee id) and the
/// record shape `{employee_id, is_manual}`; always serializes as the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredShift")]
pub struct ShiftAssignment {
    /// Assigned employee.
    pub employee_id: EmployeeId,
    /// Whether the assignment was made by hand rather than by the optimizer.
    pub is_manual: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredShift {
    Legacy(EmployeeId),
    Record {
        employee_id: EmployeeId,
        #[serde(default)]
        is_manual: bool,
    },
}

impl From<StoredShift> for ShiftAssignment {
    fn from(value: StoredShift) -> Self {
        match value {
            StoredShift::Legacy(employee_id) => Self::generated(employee_id),
            StoredShift::Record {
                employee_id,
                is_manual,
            } => Self {
                employee_id,
                is_manual,
            },
        }
    }
}

impl ShiftAssignment {
    /// An optimizer-made assignment.
    pub fn generated(employee_id: EmployeeId) -> Self {
        Self {
            employee_id,
            is_manual: false,
        }
    }

    /// A hand-made assignment.
    pub fn manual(employee_id: EmployeeId) -> Self {
        Self {
            employee_id,
            is_manual: true,
        }
    }
}

/// The two slots of one date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAssignment {
    /// Day-shift slot.
    #[serde(rename = "day_shift", default)]
    pub day: Option<ShiftAssignment>,
    /// Night-shift slot.
    #[serde(rename = "night_shift", default)]
    pub night: Option<ShiftAssignment>,
}

impl DayAssignment {
    /// The slot for `shift`.
    #[inline]
    pub fn slot(&self, shift: ShiftType) -> Option<ShiftAssignment> {
        match shift {
            ShiftType::Day => self.day,
            ShiftType::Night => self.night,
        }
    }

    /// Mutable access to the slot for `shift`.
    #[inline]
    pub fn slot_mut(&mut self, shift: ShiftType) -> &mut Option<ShiftAssignment> {
        match shift {
            ShiftType::Day => &mut self.day,
            ShiftType::Night => &mut self.night,
        }
    }

    /// Employee holding `shift`, if any.
    #[inline]
    pub fn employee(&self, shift: ShiftType) -> Option<EmployeeId> {
        self.slot(shift).map(|a| a.employee_id)
    }

    /// Whether both slots are filled.
    pub fn is_complete(&self) -> bool {
        self.day.is_some() && self.night.is_some()
    }

    /// Whether neither slot is filled.
    pub fn is_empty(&self) -> bool {
        self.day.is_none() && self.night.is_none()
    }
}

/// A month's roster: date → day/night assignments, ordered by date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    days: BTreeMap<NaiveDate, DayAssignment>,
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `employee_id` to a slot, replacing any previous assignee.
    pub fn assign(&mut self, date: NaiveDate, shift: ShiftType, assignment: ShiftAssignment) {
        *self.days.entry(date).or_default().slot_mut(shift) = Some(assignment);
    }

    /// Empties a slot. The date stays in the schedule.
    pub fn clear(&mut self, date: NaiveDate, shift: ShiftType) {
        *self.days.entry(date).or_default().slot_mut(shift) = None;
    }

    /// Ensures `date` has a record, even if both slots are empty.
    pub fn ensure_day(&mut self, date: NaiveDate) -> &mut DayAssignment {
        self.days.entry(date).or_default()
    }

    /// The record for `date`, if present.
    pub fn day(&self, date: NaiveDate) -> Option<&DayAssignment> {
        self.days.get(&date)
    }

    /// The assignment of one slot, if filled.
    pub fn get(&self, date: NaiveDate, shift: ShiftType) -> Option<ShiftAssignment> {
        self.days.get(&date).and_then(|d| d.slot(shift))
    }

    /// The employee on one slot, if filled.
    pub fn employee_on(&self, date: NaiveDate, shift: ShiftType) -> Option<EmployeeId> {
        self.get(date, shift).map(|a| a.employee_id)
    }

    /// Whether one slot is filled.
    pub fn is_assigned(&self, date: NaiveDate, shift: ShiftType) -> bool {
        self.get(date, shift).is_some()
    }

    /// Iterates over date records in date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &DayAssignment)> {
        self.days.iter().map(|(d, a)| (*d, a))
    }

    /// Iterates over filled slots in date order (day before night).
    pub fn assignments(&self) -> impl Iterator<Item = (NaiveDate, ShiftType, ShiftAssignment)> + '_ {
        self.days.iter().flat_map(|(date, day)| {
            ShiftType::ALL
                .into_iter()
                .filter_map(move |shift| day.slot(shift).map(|a| (*date, shift, a)))
        })
    }

    /// Shift units held by an employee across the whole schedule.
    pub fn units_for(&self, employee_id: EmployeeId) -> i64 {
        self.assignments()
            .filter(|(_, _, a)| a.employee_id == employee_id)
            .map(|(_, shift, _)| shift.units())
            .sum()
    }

    /// Number of filled slots.
    pub fn assignment_count(&self) -> usize {
        self.assignments().count()
    }

    /// Number of hand-made assignments.
    pub fn manual_count(&self) -> usize {
        self.assignments().filter(|(_, _, a)| a.is_manual).count()
    }

    /// Number of date records.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Whether the schedule has no date records.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}
