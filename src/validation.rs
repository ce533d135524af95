//! Schedule validation.
//!
//! Two independent checks over the same rule vocabulary:
//! - [`validate_solution`] re-walks a finished month and lists every
//!   unfilled slot and rule break.
//! - [`validate_assignment`] checks one proposed (employee, date, shift)
//!   edit against a schedule snapshot, for interactive use.
//!
//! Neither mutates its input or fails; an empty list means no findings.
//!
//! # Rules
//!
//! | Rule | Violation |
//! |------|-----------|
//! | Coverage | a slot has no assignee |
//! | Same day | one employee holds both shifts of a date |
//! | Rest | a day shift right after the same employee's night |
//! | Consecutive nights | the same employee on two nights in a row |

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{Employee, MonthKey, Schedule, ShiftType};

/// A rule break found in a finished schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleViolation {
    /// Violation category.
    pub kind: ScheduleViolationKind,
    /// Date the violation is reported on.
    pub date: NaiveDate,
    /// Human-readable description.
    pub message: String,
}

/// Categories of schedule violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleViolationKind {
    /// A slot has no assignee.
    Unfilled,
    /// One employee holds both shifts of a date.
    DoubleBooked,
    /// Day shift right after the same employee's night shift.
    DayAfterNight,
    /// Night shifts on two consecutive dates.
    ConsecutiveNights,
}

impl ScheduleViolation {
    fn new(kind: ScheduleViolationKind, date: NaiveDate, message: impl Into<String>) -> Self {
        Self {
            kind,
            date,
            message: message.into(),
        }
    }
}

impl fmt::Display for ScheduleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Checks every date of `month` in order.
///
/// Dates missing from `schedule` count as two unfilled slots. The check for
/// a date looks back at the previous date's night shift.
pub fn check_schedule(schedule: &Schedule, month: MonthKey) -> Vec<ScheduleViolation> {
    use ScheduleViolationKind::*;

    let mut violations = Vec::new();
    for date in month.dates() {
        let day_emp = schedule.employee_on(date, ShiftType::Day);
        let night_emp = schedule.employee_on(date, ShiftType::Night);

        for (shift, holder) in [(ShiftType::Day, day_emp), (ShiftType::Night, night_emp)] {
            if holder.is_none() {
                violations.push(ScheduleViolation::new(
                    Unfilled,
                    date,
                    format!("No employee assigned to {shift} on {date}"),
                ));
            }
        }

        if let (Some(d), Some(n)) = (day_emp, night_emp) {
            if d == n {
                violations.push(ScheduleViolation::new(
                    DoubleBooked,
                    date,
                    format!("Employee {d} assigned to both shifts on {date}"),
                ));
            }
        }

        let Some(prev) = date.checked_sub_days(Days::new(1)) else {
            continue;
        };
        let Some(prev_night) = schedule.employee_on(prev, ShiftType::Night) else {
            continue;
        };
        if day_emp == Some(prev_night) {
            violations.push(ScheduleViolation::new(
                DayAfterNight,
                date,
                format!("Employee {prev_night} assigned day shift on {date} after night shift on {prev}"),
            ));
        }
        if night_emp == Some(prev_night) {
            violations.push(ScheduleViolation::new(
                ConsecutiveNights,
                date,
                format!("Employee {prev_night} assigned consecutive night shifts on {prev} and {date}"),
            ));
        }
    }
    violations
}

/// [`check_schedule`] rendered as messages.
pub fn validate_solution(schedule: &Schedule, month: MonthKey) -> Vec<String> {
    check_schedule(schedule, month)
        .into_iter()
        .map(|v| v.message)
        .collect()
}

/// Reasons a single manual assignment is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentViolation {
    EmployeeNotFound,
    Inactive,
    Absent,
    OffShift,
    ShiftPreference,
    SameDayConflict,
    PostNightConflict,
    NextDayConflict,
    ConsecutiveNightConflict,
}

impl fmt::Display for AssignmentViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AssignmentViolation::EmployeeNotFound => "Employee not found",
            AssignmentViolation::Inactive => "Employee is inactive",
            AssignmentViolation::Absent => "Employee absent on this date",
            AssignmentViolation::OffShift => "Employee has off-day on this date",
            AssignmentViolation::ShiftPreference => "Shift type does not match employee preferences",
            AssignmentViolation::SameDayConflict => "Cannot work day and night shift on same day",
            AssignmentViolation::PostNightConflict => {
                "Cannot work any shift on the day after a night shift"
            }
            AssignmentViolation::NextDayConflict => {
                "Cannot work on day following this night shift (next day's day shift)"
            }
            AssignmentViolation::ConsecutiveNightConflict => "Cannot work consecutive night shifts",
        };
        f.write_str(text)
    }
}

/// Validates putting `employee` on (`date`, `shift`) in `schedule`.
///
/// Order of evaluation:
/// 1. Existence. A missing employee returns immediately.
/// 2. Active flag, absence, off-shift, and shift preference. Any failure
///    here returns without the relational checks.
/// 3. Relational checks, all accumulated: same-day conflict, previous
///    night, and for a night shift the next date's day and night.
pub fn validate_assignment(
    employee: Option<&Employee>,
    absences: &BTreeSet<NaiveDate>,
    date: NaiveDate,
    shift: ShiftType,
    schedule: &Schedule,
) -> Vec<AssignmentViolation> {
    let Some(employee) = employee else {
        return vec![AssignmentViolation::EmployeeNotFound];
    };

    let mut violations = Vec::new();
    if !employee.is_active {
        violations.push(AssignmentViolation::Inactive);
    }
    if absences.contains(&date) {
        violations.push(AssignmentViolation::Absent);
    }
    if employee.preferences.is_off_shift(date, shift) {
        violations.push(AssignmentViolation::OffShift);
    }
    if !employee.preferences.preferred_shifts.allows(shift) {
        violations.push(AssignmentViolation::ShiftPreference);
    }
    if !violations.is_empty() {
        return violations;
    }

    let id = employee.id;
    let holds = |d: NaiveDate, s: ShiftType| schedule.employee_on(d, s) == Some(id);

    if holds(date, shift.other()) {
        violations.push(AssignmentViolation::SameDayConflict);
    }
    if let Some(prev) = date.checked_sub_days(Days::new(1)) {
        if holds(prev, ShiftType::Night) {
            violations.push(AssignmentViolation::PostNightConflict);
        }
    }
    if shift == ShiftType::Night {
        if let Some(next) = date.checked_add_days(Days::new(1)) {
            if holds(next, ShiftType::Day) {
                violations.push(AssignmentViolation::NextDayConflict);
            }
            if holds(next, ShiftType::Night) {
                violations.push(AssignmentViolation::ConsecutiveNightConflict);
            }
        }
    }
    violations
}
