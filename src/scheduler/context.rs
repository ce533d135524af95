//! Per-call generation inputs.

use chrono::NaiveDate;

use crate::eligibility::{AbsenceMap, EligibilityMatrix};
use crate::models::{Employee, EmployeeId, MonthKey, Schedule};
use crate::quota::QuotaTable;
use crate::store::ScheduleStore;

/// Snapshot of everything one generation call reads.
///
/// Built once at call start and passed by reference; nothing in it is
/// cached across calls.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    /// Month being generated.
    pub month: MonthKey,
    /// Active employees in id order.
    pub employees: Vec<Employee>,
    /// Absence dates per employee.
    pub absences: AbsenceMap,
    /// Schedule stored for the month before the call.
    pub existing: Schedule,
    /// Nominal month quota per employee name.
    pub quotas: QuotaTable,
}

impl GenerationContext {
    /// Creates a context with no absences, no prior schedule, and level
    /// default quotas.
    pub fn new(month: MonthKey, employees: Vec<Employee>) -> Self {
        let days = month.days_in_month();
        let quotas = employees
            .iter()
            .map(|e| {
                let quota = e
                    .custom_quota(days)
                    .unwrap_or_else(|| e.experience.default_quota(days));
                (e.name.clone(), quota)
            })
            .collect();
        Self {
            month,
            employees,
            absences: AbsenceMap::new(),
            existing: Schedule::new(),
            quotas,
        }
    }

    /// Reads a snapshot for `month` from a store.
    pub fn load<S: ScheduleStore + ?Sized>(store: &S, month: MonthKey) -> Self {
        let days = month.days_in_month();
        let employees = store.list_employees(true);
        let absences = employees
            .iter()
            .map(|e| (e.id, store.get_absences(e.id)))
            .filter(|(_, dates)| !dates.is_empty())
            .collect();
        let quotas = employees
            .iter()
            .map(|e| (e.name.clone(), store.quota_for(&e.name, days)))
            .collect();
        Self {
            month,
            absences,
            existing: store.get_schedule(month),
            quotas,
            employees,
        }
    }

    /// Sets the prior schedule.
    pub fn with_existing(mut self, schedule: Schedule) -> Self {
        self.existing = schedule;
        self
    }

    /// Adds absence dates for an employee.
    pub fn with_absences(
        mut self,
        employee_id: EmployeeId,
        dates: impl IntoIterator<Item = NaiveDate>,
    ) -> Self {
        self.absences.entry(employee_id).or_default().extend(dates);
        self
    }

    /// Overrides one employee's quota.
    pub fn with_quota(mut self, name: impl Into<String>, quota: i64) -> Self {
        self.quotas.insert(name, quota);
        self
    }

    /// Number of days in the month.
    #[inline]
    pub fn days_in_month(&self) -> u32 {
        self.month.days_in_month()
    }

    /// Eligibility over `dates` for the context's employees.
    pub fn matrix(&self, dates: &[NaiveDate]) -> EligibilityMatrix {
        EligibilityMatrix::build(&self.employees, &self.absences, dates)
    }
}
