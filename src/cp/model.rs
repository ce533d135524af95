//! Boolean assignment model.
//!
//! Conceptually one boolean `x[employee][date][shift]` per employee and
//! open slot. Because every open slot takes exactly one employee, the model
//! stores a single decision per slot (which employee) together with that
//! slot's eligible candidates, which is the same search space with the
//! exactly-one constraint built in.
//!
//! # Constraints
//!
//! | Rule | Check |
//! |------|-------|
//! | Eligibility | candidate lists come from the eligibility matrix |
//! | Same day | an employee holds at most one of the two shifts of a date |
//! | Rest | a night on d forbids the day shift on d+1 |
//! | Consecutive nights | a night on d forbids the night on d+1 |
//!
//! Fixed slots (already assigned before the call) are not decisions; their
//! occupants constrain neighbouring decisions like any other assignment.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::SolveError;
use crate::models::{EmployeeId, ShiftType};

/// Quota objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Objective {
    /// Σ |units − quota| (full mode).
    Absolute,
    /// Σ max(0, units − (quota + slack)) (partial mode).
    Overage { slack: i64 },
}

impl Objective {
    /// Penalty of one employee holding `units` against `quota`.
    #[inline]
    pub fn penalty(self, units: i64, quota: i64) -> i64 {
        match self {
            Objective::Absolute => (units - quota).abs(),
            Objective::Overage { slack } => (units - (quota + slack)).max(0),
        }
    }
}

/// One open (to-be-decided) slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenSlot {
    /// Zero-based day of month.
    pub day: usize,
    /// Calendar date.
    pub date: NaiveDate,
    /// Shift of the slot.
    pub shift: ShiftType,
}

/// Occupants of a month: per day, per shift, the model row holding it.
///
/// Occupants that are not part of the model (e.g. an employee since
/// deactivated) are stored as `None`; they cannot clash with any model row.
pub type Grid = Vec<[Option<usize>; 2]>;

/// A built shift assignment model.
#[derive(Debug, Clone)]
pub struct ShiftModel {
    pub(crate) employee_ids: Vec<EmployeeId>,
    pub(crate) quotas: Vec<i64>,
    pub(crate) fixed: Grid,
    pub(crate) fixed_count: usize,
    pub(crate) slots: Vec<OpenSlot>,
    pub(crate) candidates: Vec<Vec<usize>>,
    pub(crate) hints: Vec<Option<usize>>,
    pub(crate) objective: Objective,
}

impl ShiftModel {
    /// Number of employees (model rows).
    pub fn employee_count(&self) -> usize {
        self.employee_ids.len()
    }

    /// Open slots in chronological order (day before night).
    pub fn slots(&self) -> &[OpenSlot] {
        &self.slots
    }

    /// Number of open slots.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of fixed (pre-assigned) slots in the month.
    pub fn fixed_count(&self) -> usize {
        self.fixed_count
    }

    /// Eligible rows for an open slot.
    pub fn candidates(&self, slot: usize) -> &[usize] {
        &self.candidates[slot]
    }

    /// The objective in use.
    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// Employee id of a model row.
    #[inline]
    pub fn employee_id(&self, row: usize) -> EmployeeId {
        self.employee_ids[row]
    }

    /// Penalty of a row at `units`.
    #[inline]
    pub fn penalty(&self, row: usize, units: i64) -> i64 {
        self.objective.penalty(units, self.quotas[row])
    }

    /// Objective value of per-row unit loads.
    pub fn evaluate(&self, loads: &[i64]) -> i64 {
        loads
            .iter()
            .enumerate()
            .map(|(row, &units)| self.penalty(row, units))
            .sum()
    }

    /// Per-row units of one row pick per open slot.
    pub fn loads(&self, picks: &[usize]) -> Vec<i64> {
        let mut loads = vec![0; self.employee_count()];
        for (slot, &row) in self.slots.iter().zip(picks) {
            loads[row] += slot.shift.units();
        }
        loads
    }

    /// Units carried by the open slots.
    pub fn open_units(&self) -> i64 {
        self.slots.iter().map(|s| s.shift.units()).sum()
    }

    /// No assignment of the open slots scores below this.
    ///
    /// Both objectives are bounded by their value on the summed loads.
    pub fn lower_bound(&self) -> i64 {
        let units = self.open_units();
        match self.objective {
            Objective::Absolute => (units - self.quotas.iter().sum::<i64>()).abs(),
            Objective::Overage { slack } => {
                (units - self.quotas.iter().map(|q| q + slack).sum::<i64>()).max(0)
            }
        }
    }

    /// No assignment of the open slots scores above this.
    pub fn upper_bound(&self) -> i64 {
        let slack = match self.objective {
            Objective::Absolute => 0,
            Objective::Overage { slack } => slack.abs(),
        };
        self.open_units() + self.quotas.iter().map(|q| q.abs() + slack).sum::<i64>()
    }

    /// Whether `row` may take (`day`, `shift`) given the occupants in `grid`.
    ///
    /// Eligibility is not checked here; callers draw `row` from the slot's
    /// candidate list. The slot itself is not inspected.
    pub fn can_place(&self, grid: &Grid, row: usize, day: usize, shift: ShiftType) -> bool {
        let holds = |d: usize, s: ShiftType| grid[d][s.index()] == Some(row);

        if holds(day, shift.other()) {
            return false;
        }
        // Any shift on `day` is blocked by last night.
        if day > 0 && holds(day - 1, ShiftType::Night) {
            return false;
        }
        if shift == ShiftType::Night && day + 1 < grid.len() {
            if holds(day + 1, ShiftType::Day) || holds(day + 1, ShiftType::Night) {
                return false;
            }
        }
        true
    }

    /// Rejects models that no search can satisfy.
    ///
    /// # Errors
    /// `SolveError::Infeasible` when an open slot has no eligible employee,
    /// or a date with both slots open has fewer than two eligible employees.
    pub fn precheck(&self) -> Result<(), SolveError> {
        for (i, slot) in self.slots.iter().enumerate() {
            if self.candidates[i].is_empty() {
                return Err(SolveError::Infeasible {
                    reason: format!("no eligible employee for the {} on {}", slot.shift, slot.date),
                });
            }
        }
        for i in 1..self.slots.len() {
            if self.slots[i - 1].day != self.slots[i].day {
                continue;
            }
            let mut union: Vec<usize> = self.candidates[i - 1]
                .iter()
                .chain(self.candidates[i].iter())
                .copied()
                .collect();
            union.sort_unstable();
            union.dedup();
            if union.len() < 2 {
                return Err(SolveError::Infeasible {
                    reason: format!("fewer than two eligible employees on {}", self.slots[i].date),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, day).unwrap()
    }

    fn three_day_model(candidates: Vec<Vec<usize>>) -> ShiftModel {
        let slots: Vec<OpenSlot> = (0..3)
            .flat_map(|day| {
                ShiftType::ALL.into_iter().map(move |shift| OpenSlot {
                    day,
                    date: d(day as u32 + 1),
                    shift,
                })
            })
            .collect();
        let n = slots.len();
        ShiftModel {
            employee_ids: vec![1, 2, 3],
            quotas: vec![3, 3, 3],
            fixed: vec![[None, None]; 3],
            fixed_count: 0,
            hints: vec![None; n],
            slots,
            candidates,
            objective: Objective::Absolute,
        }
    }

    #[test]
    fn test_penalties() {
        assert_eq!(Objective::Absolute.penalty(20, 24), 4);
        assert_eq!(Objective::Absolute.penalty(26, 24), 2);
        assert_eq!(Objective::Overage { slack: 5 }.penalty(8, 4), 0);
        assert_eq!(Objective::Overage { slack: 5 }.penalty(9, 4), 0);
        assert_eq!(Objective::Overage { slack: 5 }.penalty(12, 4), 3);
        assert_eq!(Objective::Overage { slack: 5 }.penalty(0, 4), 0);
    }

    #[test]
    fn test_can_place_rest_rules() {
        let model = three_day_model(vec![vec![0, 1, 2]; 6]);
        let mut grid: Grid = vec![[None, None]; 3];
        grid[1][ShiftType::Night.index()] = Some(0);

        // Same day.
        assert!(!model.can_place(&grid, 0, 1, ShiftType::Day));
        // Day after night, and night after night.
        assert!(!model.can_place(&grid, 0, 2, ShiftType::Day));
        assert!(!model.can_place(&grid, 0, 2, ShiftType::Night));
        // Night before a night.
        assert!(!model.can_place(&grid, 0, 0, ShiftType::Night));
        // Day before a night is fine.
        assert!(model.can_place(&grid, 0, 0, ShiftType::Day));
        // Other employees are unaffected.
        assert!(model.can_place(&grid, 1, 2, ShiftType::Day));
    }

    #[test]
    fn test_night_blocked_by_next_day_shift() {
        let model = three_day_model(vec![vec![0, 1, 2]; 6]);
        let mut grid: Grid = vec![[None, None]; 3];
        grid[2][ShiftType::Day.index()] = Some(1);
        assert!(!model.can_place(&grid, 1, 1, ShiftType::Night));
        assert!(model.can_place(&grid, 1, 1, ShiftType::Day));
    }

    #[test]
    fn test_precheck() {
        assert!(three_day_model(vec![vec![0, 1]; 6]).precheck().is_ok());

        let mut candidates = vec![vec![0, 1]; 6];
        candidates[3] = Vec::new();
        assert!(matches!(
            three_day_model(candidates).precheck(),
            Err(SolveError::Infeasible { .. })
        ));

        let mut candidates = vec![vec![0, 1]; 6];
        candidates[0] = vec![2];
        candidates[1] = vec![2];
        assert!(matches!(
            three_day_model(candidates).precheck(),
            Err(SolveError::Infeasible { .. })
        ));
    }

    #[test]
    fn test_evaluate() {
        let model = three_day_model(vec![vec![0, 1, 2]; 6]);
        assert_eq!(model.evaluate(&[3, 3, 3]), 0);
        assert_eq!(model.evaluate(&[5, 1, 3]), 4);
        // Day, night per date: rows 0/1, 2/0, 1/2.
        assert_eq!(model.loads(&[0, 1, 2, 0, 1, 2]), vec![3, 3, 3]);
    }

    #[test]
    fn test_objective_bounds() {
        let mut model = three_day_model(vec![vec![0, 1, 2]; 6]);
        assert_eq!(model.open_units(), 9);
        assert_eq!(model.lower_bound(), 0);
        assert_eq!(model.upper_bound(), 18);

        model.quotas = vec![1, 1, 1];
        assert_eq!(model.lower_bound(), 6);
        model.objective = Objective::Overage { slack: 1 };
        assert_eq!(model.lower_bound(), 3);
        assert_eq!(model.upper_bound(), 15);
    }
}
