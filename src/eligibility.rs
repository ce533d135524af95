//! Eligibility evaluation.
//!
//! Turns absences, off-shifts, and shift-type preferences into a boolean
//! table per (employee, date, shift). The optimizer reads eligibility only
//! from this table; it never re-derives it.
//!
//! # Rules
//!
//! | Check | Ineligible when |
//! |-------|-----------------|
//! | Active | employee is inactive |
//! | Absence | date is in the employee's absence set |
//! | Off-shift | (date, shift) is an off-shift pair |
//! | Preference | preference is restricted and excludes the shift |

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::models::{Employee, EmployeeId, ShiftType};

/// Absence dates per employee.
pub type AbsenceMap = BTreeMap<EmployeeId, BTreeSet<NaiveDate>>;

/// Whether `employee` may work `shift` on `date`, ignoring rest rules and
/// quotas.
pub fn is_eligible(
    employee: &Employee,
    absences: &BTreeSet<NaiveDate>,
    date: NaiveDate,
    shift: ShiftType,
) -> bool {
    employee.is_active
        && !absences.contains(&date)
        && !employee.preferences.is_off_shift(date, shift)
        && employee.preferences.preferred_shifts.allows(shift)
}

/// Dense eligibility table over a fixed employee order and date list.
///
/// Rows follow the order of the employee slice passed to [`build`](Self::build);
/// columns follow the date slice, which must be sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityMatrix {
    employee_ids: Vec<EmployeeId>,
    dates: Vec<NaiveDate>,
    cells: Vec<bool>,
}

impl EligibilityMatrix {
    /// Evaluates [`is_eligible`] for every (employee, date, shift).
    pub fn build(employees: &[Employee], absences: &AbsenceMap, dates: &[NaiveDate]) -> Self {
        let empty = BTreeSet::new();
        let mut cells = Vec::with_capacity(employees.len() * dates.len() * 2);
        for employee in employees {
            let away = absences.get(&employee.id).unwrap_or(&empty);
            for &date in dates {
                for shift in ShiftType::ALL {
                    cells.push(is_eligible(employee, away, date, shift));
                }
            }
        }
        Self {
            employee_ids: employees.iter().map(|e| e.id).collect(),
            dates: dates.to_vec(),
            cells,
        }
    }

    #[inline]
    fn offset(&self, employee: usize, date: usize, shift: ShiftType) -> usize {
        (employee * self.dates.len() + date) * 2 + shift.index()
    }

    /// Eligibility by row/column index. Out-of-range indices are ineligible.
    #[inline]
    pub fn get(&self, employee: usize, date: usize, shift: ShiftType) -> bool {
        if employee >= self.employee_ids.len() || date >= self.dates.len() {
            return false;
        }
        self.cells[self.offset(employee, date, shift)]
    }

    /// Eligibility by employee id and date.
    pub fn is_eligible(&self, employee_id: EmployeeId, date: NaiveDate, shift: ShiftType) -> bool {
        match (
            self.employee_ids.iter().position(|&id| id == employee_id),
            self.dates.binary_search(&date).ok(),
        ) {
            (Some(e), Some(d)) => self.get(e, d, shift),
            _ => false,
        }
    }

    /// Row indices of employees eligible for (date index, shift).
    pub fn eligible_for(&self, date: usize, shift: ShiftType) -> impl Iterator<Item = usize> + '_ {
        (0..self.employee_ids.len()).filter(move |&e| self.get(e, date, shift))
    }

    /// Employee ids in row order.
    pub fn employee_ids(&self) -> &[EmployeeId] {
        &self.employee_ids
    }

    /// Dates in column order.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }
}
