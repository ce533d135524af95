//! Constraint-based shift assignment.
//!
//! Builds a [`ShiftModel`] from employees, an eligibility matrix, a quota
//! table and (optionally) already-decided assignments, then anneals it with
//! `u-metaheur` under a wall-clock budget.
//!
//! # Modes
//!
//! | Mode | Open slots | Objective |
//! |------|------------|-----------|
//! | Full | every slot of the month | Σ \|units − quota\| |
//! | Partial | unfilled slots on the generated dates | Σ max(0, units − (quota + slack)) |
//!
//! In partial mode the quota table holds the *remaining* quotas and fixed
//! assignments on either side of a generated date act as boundary
//! conditions for the rest rules.
//!
//! # Reference
//! - Baptiste et al. (2001), "Constraint-Based Scheduling"
//! - Burke et al. (2004), "The State of the Art of Nurse Rostering"

mod model;
mod search;

pub use model::{Grid, Objective, OpenSlot, ShiftModel};
pub use search::SearchStats;

use std::time::Instant;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::GeneratorConfig;
use crate::eligibility::EligibilityMatrix;
use crate::models::{Employee, EmployeeId, MonthKey, Schedule, ShiftAssignment, ShiftType};
use crate::quota::QuotaTable;

/// Why a search produced no roster.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("no feasible roster: {reason}")]
    Infeasible { reason: String },

    #[error("no feasible roster found within the time limit")]
    TimeLimit,
}

/// A feasible assignment of every open slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveOutcome {
    /// Decided slots in date order.
    pub assignments: Vec<(NaiveDate, ShiftType, EmployeeId)>,
    /// Objective value of the assignment.
    pub objective: i64,
    /// Search counters.
    pub stats: SearchStats,
}

impl SolveOutcome {
    /// Writes the decided slots into `schedule` as generated assignments.
    pub fn apply_to(&self, schedule: &mut Schedule) {
        for &(date, shift, employee_id) in &self.assignments {
            schedule.assign(date, shift, ShiftAssignment::generated(employee_id));
        }
    }
}

/// Builds a shift model from rostering inputs.
///
/// # Example
/// ```no_run
/// use shift_roster::cp::{Objective, ShiftCpBuilder};
/// use shift_roster::config::GeneratorConfig;
/// # use shift_roster::eligibility::{AbsenceMap, EligibilityMatrix};
/// # use shift_roster::models::{Employee, Experience, MonthKey};
/// # use shift_roster::quota::QuotaTable;
/// # let month = MonthKey::new(2025, 8).unwrap();
/// # let employees: Vec<Employee> = Vec::new();
/// # let dates: Vec<_> = month.dates().collect();
/// # let matrix = EligibilityMatrix::build(&employees, &AbsenceMap::new(), &dates);
/// # let quotas = QuotaTable::new();
///
/// let outcome = ShiftCpBuilder::new(month, &employees, &matrix, &quotas)
///     .with_objective(Objective::Absolute)
///     .solve(&GeneratorConfig::default());
/// ```
pub struct ShiftCpBuilder<'a> {
    month: MonthKey,
    employees: &'a [Employee],
    matrix: &'a EligibilityMatrix,
    quotas: &'a QuotaTable,
    fixed: Option<&'a Schedule>,
    hint: Option<&'a Schedule>,
    objective: Objective,
}

impl<'a> ShiftCpBuilder<'a> {
    /// Creates a builder. Open slots are the dates covered by `matrix`.
    pub fn new(
        month: MonthKey,
        employees: &'a [Employee],
        matrix: &'a EligibilityMatrix,
        quotas: &'a QuotaTable,
    ) -> Self {
        Self {
            month,
            employees,
            matrix,
            quotas,
            fixed: None,
            hint: None,
            objective: Objective::Absolute,
        }
    }

    /// Assignments that must be kept. Their slots are not re-decided.
    pub fn with_fixed(mut self, schedule: &'a Schedule) -> Self {
        self.fixed = Some(schedule);
        self
    }

    /// Previous roster tried first when building the initial roster.
    pub fn with_hint(mut self, schedule: &'a Schedule) -> Self {
        self.hint = Some(schedule);
        self
    }

    /// Sets the objective.
    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    /// Builds the model.
    ///
    /// Creates:
    /// - a grid of fixed occupants for every date of the month
    /// - an open slot per unassigned slot on a matrix date
    /// - a candidate list per open slot from the matrix
    /// - a hint per open slot when the hinted employee is a candidate
    pub fn build(&self) -> ShiftModel {
        let row_of = |id: EmployeeId| self.employees.iter().position(|e| e.id == id);
        let dates: Vec<NaiveDate> = self.month.dates().collect();

        let mut fixed: Grid = vec![[None, None]; dates.len()];
        let mut fixed_count = 0;
        let mut slots = Vec::new();

        for (day, &date) in dates.iter().enumerate() {
            let in_range = self.matrix.dates().binary_search(&date).is_ok();
            for shift in ShiftType::ALL {
                match self.fixed.and_then(|s| s.employee_on(date, shift)) {
                    Some(id) => {
                        fixed[day][shift.index()] = row_of(id);
                        fixed_count += 1;
                    }
                    None if in_range => slots.push(OpenSlot { day, date, shift }),
                    None => {}
                }
            }
        }

        let candidates: Vec<Vec<usize>> = slots
            .iter()
            .map(|slot| {
                self.employees
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| self.matrix.is_eligible(e.id, slot.date, slot.shift))
                    .map(|(row, _)| row)
                    .collect()
            })
            .collect();

        let hints = slots
            .iter()
            .zip(&candidates)
            .map(|(slot, rows)| {
                self.hint
                    .and_then(|s| s.employee_on(slot.date, slot.shift))
                    .and_then(row_of)
                    .filter(|row| rows.contains(row))
            })
            .collect();

        let model = ShiftModel {
            employee_ids: self.employees.iter().map(|e| e.id).collect(),
            quotas: self.employees.iter().map(|e| self.quotas.get(&e.name)).collect(),
            fixed,
            fixed_count,
            slots,
            candidates,
            hints,
            objective: self.objective,
        };

        debug!(
            event = "model_built",
            month = %self.month,
            employees = model.employee_count(),
            open_slots = model.slot_count(),
            fixed_slots = model.fixed_count(),
        );
        model
    }

    /// Builds and solves the model.
    ///
    /// # Errors
    /// `SolveError::Infeasible` when some open slot has no eligible employee
    /// or a date cannot be staffed by two people, `SolveError::TimeLimit`
    /// when no rule-clean roster was found within the budget.
    pub fn solve(&self, config: &GeneratorConfig) -> Result<SolveOutcome, SolveError> {
        let model = self.build();
        solve_model(&model, config)
    }
}

/// Searches a built model.
///
/// # Errors
/// See [`ShiftCpBuilder::solve`].
pub fn solve_model(model: &ShiftModel, config: &GeneratorConfig) -> Result<SolveOutcome, SolveError> {
    let deadline = Instant::now() + config.time_limit();
    model.precheck()?;

    let searched = search::anneal(model, deadline, config.unimproved_step_limit, config.random_seed);
    let (picks, stats) = match searched {
        Ok(found) => found,
        Err(err) => {
            warn!(event = "search_failed", open_slots = model.slot_count(), error = %err);
            return Err(err);
        }
    };

    let objective = model.evaluate(&model.loads(&picks));
    info!(
        event = "search_done",
        runs = stats.runs,
        evaluations = stats.evaluations,
        accepted = stats.accepted,
        initial_cost = stats.initial_cost,
        objective,
        lower_bound = model.lower_bound(),
    );

    let assignments = model
        .slots()
        .iter()
        .zip(&picks)
        .map(|(slot, &row)| (slot.date, slot.shift, model.employee_id(row)))
        .collect();

    Ok(SolveOutcome {
        assignments,
        objective,
        stats,
    })
}
