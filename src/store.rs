//! Data store collaborator.
//!
//! The generator reads its inputs through [`ScheduleStore`]. [`MemoryStore`]
//! keeps everything in memory and applies the roster rules: any change to a
//! bucket's membership recomputes that bucket's targets and shares.
//! Persistence is left to callers (every store type is serde-ready).

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::eligibility::AbsenceMap;
use crate::error::RosterError;
use crate::models::{
    Employee, EmployeeId, Experience, MonthKey, Preferences, Schedule, ShiftAssignment, ShiftType,
    MONTH_LENGTHS,
};
use crate::quota::{DistributionMethod, QuotaAllocator};

/// Read access to rostering data.
pub trait ScheduleStore {
    /// Employees, optionally only the active ones, in id order.
    fn list_employees(&self, active_only: bool) -> Vec<Employee>;

    /// Absence dates of an employee (empty when none recorded).
    fn get_absences(&self, employee_id: EmployeeId) -> BTreeSet<NaiveDate>;

    /// Stored schedule of a month (empty when none stored).
    fn get_schedule(&self, month: MonthKey) -> Schedule;

    /// Quota of an employee by name; 0 for unknown names.
    fn quota_for(&self, name: &str, days_in_month: u32) -> i64;

    /// Looks an employee up by id.
    fn find_employee(&self, id: EmployeeId) -> Option<Employee> {
        self.list_employees(false).into_iter().find(|e| e.id == id)
    }
}

/// Outcome of [`MemoryStore::clear_future_schedules`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearReport {
    /// Dates that had at least one assignment.
    pub cleared_count: usize,
    pub affected_dates: Vec<NaiveDate>,
}

/// In-memory store owning the roster, absences, schedules, and quotas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStore {
    employees: Vec<Employee>,
    absences: AbsenceMap,
    schedules: BTreeMap<MonthKey, Schedule>,
    allocator: QuotaAllocator,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All employees in id order.
    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    /// One employee by id.
    pub fn employee(&self, id: EmployeeId) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == id)
    }

    /// The quota allocator.
    pub fn allocator(&self) -> &QuotaAllocator {
        &self.allocator
    }

    fn employee_mut(&mut self, id: EmployeeId) -> Result<&mut Employee, RosterError> {
        self.employees
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(RosterError::UnknownEmployee(id))
    }

    // ---- roster ----

    /// Adds an employee with the next free id (max + 1) and recomputes its
    /// bucket.
    pub fn add_employee(
        &mut self,
        name: impl Into<String>,
        experience: Experience,
        preferences: Preferences,
    ) -> EmployeeId {
        let id = self.employees.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        let employee = Employee::new(id, name, experience).with_preferences(preferences);
        info!(event = "employee_added", id, name = %employee.name, level = %experience);
        self.employees.push(employee);
        self.allocator.recompute_bucket(experience, &self.employees);
        id
    }

    /// Activates or deactivates an employee.
    ///
    /// # Errors
    /// `RosterError::UnknownEmployee` when `id` is not on the roster.
    pub fn set_active(&mut self, id: EmployeeId, is_active: bool) -> Result<(), RosterError> {
        let employee = self.employee_mut(id)?;
        if employee.is_active == is_active {
            return Ok(());
        }
        employee.is_active = is_active;
        let level = employee.experience;
        self.allocator.recompute_bucket(level, &self.employees);
        Ok(())
    }

    /// Moves an employee to another experience level.
    ///
    /// The new level's default quotas are written into the employee's
    /// overrides so later redistribution of either bucket leaves them as
    /// they are. Both buckets are then recomputed.
    ///
    /// # Errors
    /// `RosterError::UnknownEmployee` when `id` is not on the roster.
    pub fn set_experience(&mut self, id: EmployeeId, level: Experience) -> Result<(), RosterError> {
        let employee = self.employee_mut(id)?;
        let old_level = employee.experience;
        if old_level == level {
            return Ok(());
        }
        employee.experience = level;
        let pinned = QuotaAllocator::pinned_level_defaults(level);
        employee.preferences.custom_quotas.extend(pinned.iter());
        let name = employee.name.clone();
        info!(
            event = "quota_pinned",
            id,
            name = %name,
            from = %old_level,
            to = %level,
            quotas = ?pinned,
        );

        self.allocator.forget(&name);
        self.allocator.recompute_bucket(old_level, &self.employees);
        self.allocator.recompute_bucket(level, &self.employees);
        Ok(())
    }

    /// Deletes an employee with their absences and stored shares.
    ///
    /// Past schedules keep their assignments.
    ///
    /// # Errors
    /// `RosterError::UnknownEmployee` when `id` is not on the roster.
    pub fn remove_employee(&mut self, id: EmployeeId) -> Result<Employee, RosterError> {
        let index = self
            .employees
            .iter()
            .position(|e| e.id == id)
            .ok_or(RosterError::UnknownEmployee(id))?;
        let employee = self.employees.remove(index);
        self.absences.remove(&id);
        self.allocator.forget(&employee.name);
        self.allocator.recompute_bucket(employee.experience, &self.employees);
        info!(event = "employee_removed", id, name = %employee.name);
        Ok(employee)
    }

    /// Replaces an employee's preferences and redistributes every month
    /// length of their bucket that has a target.
    ///
    /// # Errors
    /// `RosterError::UnknownEmployee` when `id` is not on the roster.
    pub fn update_preferences(
        &mut self,
        id: EmployeeId,
        preferences: Preferences,
    ) -> Result<(), RosterError> {
        let employee = self.employee_mut(id)?;
        employee.preferences = preferences;
        let level = employee.experience;
        for days in MONTH_LENGTHS {
            if self.allocator.bucket(level).target(days).is_some() {
                self.allocator.redistribute(level, days, &self.employees);
            }
        }
        Ok(())
    }

    // ---- quotas ----

    /// Writes a custom quota override for one month length.
    ///
    /// # Errors
    /// `RosterError::InvalidMonthLength` when `days_in_month` is not 28-31,
    /// `RosterError::UnknownEmployee` when `id` is not on the roster.
    pub fn set_quota(&mut self, id: EmployeeId, days_in_month: u32, quota: i64) -> Result<(), RosterError> {
        check_month_length(days_in_month)?;
        let employee = self.employee_mut(id)?;
        employee.preferences.custom_quotas.insert(days_in_month, quota);
        let snapshot = employee.clone();
        self.allocator.record_override(&snapshot, days_in_month, quota);
        Ok(())
    }

    /// Sets a bucket target and redistributes it.
    ///
    /// # Errors
    /// `RosterError::InvalidMonthLength` when `days_in_month` is not 28-31.
    pub fn set_bucket_target(
        &mut self,
        level: Experience,
        days_in_month: u32,
        target: i64,
    ) -> Result<(), RosterError> {
        check_month_length(days_in_month)?;
        self.allocator
            .set_target(level, days_in_month, target, &self.employees);
        Ok(())
    }

    /// Sets a bucket's split method.
    pub fn set_distribution_method(
        &mut self,
        level: Experience,
        method: DistributionMethod,
        weights: Option<BTreeMap<String, f64>>,
    ) {
        self.allocator
            .set_distribution_method(level, method, weights, &self.employees);
    }

    // ---- absences ----

    /// Records an absence. Returns `false` when it was already recorded.
    ///
    /// # Errors
    /// `RosterError::UnknownEmployee` when `id` is not on the roster.
    pub fn add_absence(&mut self, id: EmployeeId, date: NaiveDate) -> Result<bool, RosterError> {
        if self.employee(id).is_none() {
            return Err(RosterError::UnknownEmployee(id));
        }
        Ok(self.absences.entry(id).or_default().insert(date))
    }

    /// Removes an absence. Returns `false` when none was recorded.
    pub fn remove_absence(&mut self, id: EmployeeId, date: NaiveDate) -> bool {
        self.absences
            .get_mut(&id)
            .is_some_and(|dates| dates.remove(&date))
    }

    /// Whether an absence is recorded.
    pub fn is_absent(&self, id: EmployeeId, date: NaiveDate) -> bool {
        self.absences.get(&id).is_some_and(|dates| dates.contains(&date))
    }

    // ---- schedules ----

    /// Replaces a month's schedule.
    pub fn save_schedule(&mut self, month: MonthKey, schedule: Schedule) {
        debug!(event = "schedule_saved", month = %month, assignments = schedule.assignment_count());
        self.schedules.insert(month, schedule);
    }

    /// Fills or empties one slot.
    ///
    /// # Errors
    /// `RosterError::InvalidDate` when `date` is outside `month`.
    pub fn set_shift_assignment(
        &mut self,
        month: MonthKey,
        date: NaiveDate,
        shift: ShiftType,
        employee_id: Option<EmployeeId>,
        is_manual: bool,
    ) -> Result<(), RosterError> {
        if !month.contains(date) {
            return Err(RosterError::InvalidDate {
                month,
                day: date.day(),
            });
        }
        let schedule = self.schedules.entry(month).or_default();
        match employee_id {
            Some(id) => {
                let assignment = if is_manual {
                    ShiftAssignment::manual(id)
                } else {
                    ShiftAssignment::generated(id)
                };
                schedule.assign(date, shift, assignment);
            }
            None => schedule.clear(date, shift),
        }
        if is_manual {
            info!(event = "manual_assignment", %date, %shift, employee = ?employee_id);
        }
        Ok(())
    }

    /// Whether a slot holds a hand-made assignment.
    pub fn is_manual_assignment(&self, month: MonthKey, date: NaiveDate, shift: ShiftType) -> bool {
        self.schedules
            .get(&month)
            .and_then(|s| s.get(date, shift))
            .is_some_and(|a| a.is_manual)
    }

    /// Empties both shifts of every date after `today` that has an
    /// assignment.
    pub fn clear_future_schedules(&mut self, month: MonthKey, today: NaiveDate) -> ClearReport {
        let Some(schedule) = self.schedules.get_mut(&month) else {
            return ClearReport::default();
        };
        let affected_dates: Vec<NaiveDate> = schedule
            .iter()
            .filter(|(date, day)| *date > today && !day.is_empty())
            .map(|(date, _)| date)
            .collect();
        for &date in &affected_dates {
            for shift in ShiftType::ALL {
                schedule.clear(date, shift);
            }
        }
        info!(event = "future_cleared", month = %month, dates = affected_dates.len());
        ClearReport {
            cleared_count: affected_dates.len(),
            affected_dates,
        }
    }
}

fn check_month_length(days_in_month: u32) -> Result<(), RosterError> {
    if MONTH_LENGTHS.contains(&days_in_month) {
        Ok(())
    } else {
        Err(RosterError::InvalidMonthLength(days_in_month))
    }
}

impl ScheduleStore for MemoryStore {
    fn list_employees(&self, active_only: bool) -> Vec<Employee> {
        self.employees
            .iter()
            .filter(|e| !active_only || e.is_active)
            .cloned()
            .collect()
    }

    fn get_absences(&self, employee_id: EmployeeId) -> BTreeSet<NaiveDate> {
        self.absences.get(&employee_id).cloned().unwrap_or_default()
    }

    fn get_schedule(&self, month: MonthKey) -> Schedule {
        self.schedules.get(&month).cloned().unwrap_or_default()
    }

    fn quota_for(&self, name: &str, days_in_month: u32) -> i64 {
        self.employees
            .iter()
            .find(|e| e.name == name)
            .map_or(0, |e| self.allocator.quota_for(e, days_in_month))
    }

    fn find_employee(&self, id: EmployeeId) -> Option<Employee> {
        self.employee(id).cloned()
    }
}
