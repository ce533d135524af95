//! Search over a [`ShiftModel`].
//!
//! Implements `u_metaheur::sa::SaProblem` for the shift model and drives
//! `SaRunner` under the solve deadline.
//!
//! # Cost
//!
//! `hard_weight × rule breaks + objective`. The weight exceeds any objective
//! value the model can reach, so every rule-clean roster costs less than
//! every roster with a break. Breaks between two fixed slots are not
//! counted; no move can change them.
//!
//! # Neighbourhood
//!
//! - *repair*: give a slot involved in a rule break to another candidate
//! - *change*: give a random slot to another candidate
//! - *swap*: exchange the employees of two slots
//!
//! # Stopping
//!
//! A run ends when the cost reaches the objective's lower bound, after
//! `unimproved_step_limit` evaluations without a new best, at the deadline,
//! or when the temperature bottoms out. A run that ends with a rule break
//! is restarted from a fresh greedy roster while time remains.
//!
//! # Reference
//! - Kirkpatrick et al. (1983), "Optimization by Simulated Annealing"
//! - Minton et al. (1992), "Minimizing Conflicts: A Heuristic Repair Method
//!   for Constraint Satisfaction and Scheduling Problems"

use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;
use u_metaheur::sa::{CoolingSchedule, SaConfig, SaProblem, SaRunner};

use super::model::{Grid, ShiftModel};
use super::SolveError;
use crate::models::ShiftType;

/// Row chosen per open slot, in slot order.
pub type Picks = Vec<usize>;

const SWAP_ATTEMPTS: usize = 8;

/// Counters reported by a search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Annealing runs started.
    pub runs: u64,
    /// Cost of the first run's greedy roster.
    pub initial_cost: i64,
    /// Neighbour evaluations over all runs.
    pub evaluations: u64,
    /// Accepted moves over all runs.
    pub accepted: u64,
}

fn annealing_schedule(seed: Option<u64>) -> SaConfig {
    let config = SaConfig::default()
        .with_initial_temperature(2.0)
        .with_min_temperature(0.01)
        .with_cooling(CoolingSchedule::Geometric { alpha: 0.99 })
        .with_iterations_per_temperature(100);
    match seed {
        Some(seed) => config.with_seed(seed),
        None => config,
    }
}

/// Per-run stop conditions, fed by every cost evaluation.
///
/// `SaRunner` polls `cancel` once per temperature level.
#[derive(Debug)]
struct StopRule {
    deadline: Instant,
    unimproved_limit: u64,
    target: i64,
    best: AtomicI64,
    unimproved: AtomicU64,
    evaluations: AtomicU64,
    cancel: Arc<AtomicBool>,
}

impl StopRule {
    fn new(deadline: Instant, unimproved_limit: u64, target: i64) -> Self {
        Self {
            deadline,
            unimproved_limit,
            target,
            best: AtomicI64::new(i64::MAX),
            unimproved: AtomicU64::new(0),
            evaluations: AtomicU64::new(0),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    fn reset(&self) {
        self.best.store(i64::MAX, Ordering::Relaxed);
        self.unimproved.store(0, Ordering::Relaxed);
        self.cancel.store(false, Ordering::Relaxed);
    }

    fn observe(&self, cost: i64) {
        let evaluations = self.evaluations.fetch_add(1, Ordering::Relaxed) + 1;
        if cost < self.best.load(Ordering::Relaxed) {
            self.best.store(cost, Ordering::Relaxed);
            self.unimproved.store(0, Ordering::Relaxed);
            if cost <= self.target {
                self.cancel.store(true, Ordering::Relaxed);
            }
        } else if self.unimproved.fetch_add(1, Ordering::Relaxed) + 1 >= self.unimproved_limit {
            self.cancel.store(true, Ordering::Relaxed);
        }
        if evaluations % 64 == 0 && self.expired() {
            self.cancel.store(true, Ordering::Relaxed);
        }
    }

    fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

/// The shift model as an annealing problem.
///
/// Requires a model that passed [`ShiftModel::precheck`], so every open
/// slot has at least one candidate.
#[derive(Debug)]
pub(crate) struct RosterProblem<'m> {
    model: &'m ShiftModel,
    /// Open slot index per (day, shift); `None` for fixed or out-of-range slots.
    slot_at: Vec<[Option<usize>; 2]>,
    hard_weight: i64,
    stop: StopRule,
}

impl<'m> RosterProblem<'m> {
    pub(crate) fn new(model: &'m ShiftModel, deadline: Instant, unimproved_limit: u64) -> Self {
        let mut slot_at = vec![[None, None]; model.fixed.len()];
        for (i, slot) in model.slots.iter().enumerate() {
            slot_at[slot.day][slot.shift.index()] = Some(i);
        }
        Self {
            model,
            slot_at,
            hard_weight: model.upper_bound() + 1,
            stop: StopRule::new(deadline, unimproved_limit, model.lower_bound()),
        }
    }

    fn grid(&self, picks: &[usize]) -> Grid {
        let mut grid = self.model.fixed.clone();
        for (slot, &row) in self.model.slots.iter().zip(picks) {
            grid[slot.day][slot.shift.index()] = Some(row);
        }
        grid
    }

    /// Rule breaks in `grid`, each as the open slots of the two clashing
    /// assignments.
    fn breaks(&self, grid: &Grid) -> Vec<[Option<usize>; 2]> {
        let (day, night) = (ShiftType::Day.index(), ShiftType::Night.index());
        let mut breaks = Vec::new();
        for d in 0..grid.len() {
            let [on_day, on_night] = grid[d];
            if on_day.is_some() && on_day == on_night {
                breaks.push([self.slot_at[d][day], self.slot_at[d][night]]);
            }
            let Some(row) = on_night else { continue };
            if d + 1 == grid.len() {
                continue;
            }
            // Day after a night, and a second night in a row.
            for shift in ShiftType::ALL {
                if grid[d + 1][shift.index()] == Some(row) {
                    breaks.push([self.slot_at[d][night], self.slot_at[d + 1][shift.index()]]);
                }
            }
        }
        breaks.retain(|pair| pair.iter().any(Option::is_some));
        breaks
    }

    /// Number of rule breaks involving an open slot.
    pub(crate) fn break_count(&self, picks: &[usize]) -> usize {
        self.breaks(&self.grid(picks)).len()
    }

    /// Penalized cost of `picks`.
    pub(crate) fn score(&self, picks: &[usize]) -> i64 {
        let breaks = self.break_count(picks) as i64;
        self.hard_weight * breaks + self.model.evaluate(&self.model.loads(picks))
    }

    /// Gives `slot` to a different candidate. False when it has only one.
    fn change<R: Rng>(&self, picks: &mut [usize], slot: usize, rng: &mut R) -> bool {
        let candidates = &self.model.candidates[slot];
        if candidates.len() < 2 {
            return false;
        }
        // Uniform over the candidates other than the current one.
        let mut row = candidates[rng.random_range(0..candidates.len() - 1)];
        if row == picks[slot] {
            row = candidates[candidates.len() - 1];
        }
        picks[slot] = row;
        true
    }

    /// Exchanges the rows of two slots that accept each other's row.
    fn swap<R: Rng>(&self, picks: &mut [usize], rng: &mut R) -> bool {
        let n = picks.len();
        for _ in 0..SWAP_ATTEMPTS {
            let (i, j) = (rng.random_range(0..n), rng.random_range(0..n));
            let (a, b) = (picks[i], picks[j]);
            if a != b && self.model.candidates[i].contains(&b) && self.model.candidates[j].contains(&a) {
                picks.swap(i, j);
                return true;
            }
        }
        false
    }
}

impl SaProblem for RosterProblem<'_> {
    type Solution = Picks;

    /// Greedy in date order: each slot takes the hinted employee, else the
    /// one with the largest remaining quota, among those the rules still
    /// allow; a random candidate when none is allowed.
    fn initial_solution<R: Rng>(&self, rng: &mut R) -> Picks {
        let model = self.model;
        let mut grid = model.fixed.clone();
        let mut loads = vec![0i64; model.employee_count()];
        let mut picks = Vec::with_capacity(model.slots.len());

        for (i, slot) in model.slots.iter().enumerate() {
            let mut order = model.candidates[i].clone();
            order.shuffle(rng);
            let hint = model.hints[i];
            order.sort_by_key(|&row| (Some(row) != hint, Reverse(model.quotas[row] - loads[row])));

            let row = order
                .iter()
                .copied()
                .find(|&row| model.can_place(&grid, row, slot.day, slot.shift))
                .unwrap_or_else(|| order[rng.random_range(0..order.len())]);
            grid[slot.day][slot.shift.index()] = Some(row);
            loads[row] += slot.shift.units();
            picks.push(row);
        }
        picks
    }

    fn cost(&self, picks: &Picks) -> f64 {
        let cost = self.score(picks);
        self.stop.observe(cost);
        cost as f64
    }

    fn neighbor<R: Rng>(&self, picks: &Picks, rng: &mut R) -> Picks {
        let mut next = picks.clone();
        let n = picks.len();
        if n == 0 {
            return next;
        }

        let broken: Vec<usize> = self
            .breaks(&self.grid(picks))
            .into_iter()
            .flatten()
            .flatten()
            .collect();
        if !broken.is_empty() && rng.random_bool(0.5) {
            let slot = broken[rng.random_range(0..broken.len())];
            if self.change(&mut next, slot, rng) {
                return next;
            }
        }
        if n > 1 && rng.random_bool(0.5) && self.swap(&mut next, rng) {
            return next;
        }
        let slot = rng.random_range(0..n);
        self.change(&mut next, slot, rng);
        next
    }
}

/// Anneals until a run ends without rule breaks.
///
/// # Errors
/// `SolveError::TimeLimit` when the deadline passes first.
pub(crate) fn anneal(
    model: &ShiftModel,
    deadline: Instant,
    unimproved_limit: u64,
    seed: Option<u64>,
) -> Result<(Picks, SearchStats), SolveError> {
    let mut stats = SearchStats::default();
    if model.slot_count() == 0 {
        return Ok((Vec::new(), stats));
    }

    let problem = RosterProblem::new(model, deadline, unimproved_limit);
    loop {
        problem.stop.reset();
        let schedule = annealing_schedule(seed.map(|s| s.wrapping_add(stats.runs)));
        let result = SaRunner::run_with_cancel(&problem, &schedule, Some(Arc::clone(&problem.stop.cancel)));

        if stats.runs == 0 {
            stats.initial_cost = result.cost_history.first().map_or(0, |&c| c as i64);
        }
        stats.runs += 1;
        stats.evaluations += result.iterations as u64;
        stats.accepted += result.accepted_moves as u64;

        let breaks = problem.break_count(&result.best);
        if breaks == 0 {
            return Ok((result.best, stats));
        }
        if problem.stop.expired() {
            return Err(SolveError::TimeLimit);
        }
        debug!(event = "search_restart", run = stats.runs, breaks, cost = result.best_cost);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::model::{Objective, OpenSlot};
    use chrono::NaiveDate;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::time::Duration;

    fn make_model(days: usize, employees: usize, quota: i64) -> ShiftModel {
        let slots: Vec<OpenSlot> = (0..days)
            .flat_map(|day| {
                ShiftType::ALL.into_iter().map(move |shift| OpenSlot {
                    day,
                    date: NaiveDate::from_ymd_opt(2025, 8, day as u32 + 1).unwrap(),
                    shift,
                })
            })
            .collect();
        let n = slots.len();
        ShiftModel {
            employee_ids: (1..=employees as u32).collect(),
            quotas: vec![quota; employees],
            fixed: vec![[None, None]; days],
            fixed_count: 0,
            hints: vec![None; n],
            candidates: vec![(0..employees).collect(); n],
            slots,
            objective: Objective::Absolute,
        }
    }

    fn soon() -> Instant {
        Instant::now() + Duration::from_secs(5)
    }

    fn assert_rule_clean(model: &ShiftModel, picks: &[usize]) {
        assert_eq!(picks.len(), model.slot_count());
        let problem = RosterProblem::new(model, soon(), 1);
        for (slot, &row) in picks.iter().enumerate() {
            assert!(model.candidates[slot].contains(&row));
        }
        assert_eq!(problem.break_count(picks), 0);
    }

    #[test]
    fn test_breaks_counted_per_rule() {
        let model = make_model(3, 3, 3);
        let problem = RosterProblem::new(&model, soon(), 1);
        // Slots: d0 day, d0 night, d1 day, d1 night, d2 day, d2 night.
        assert_eq!(problem.break_count(&[0, 1, 2, 0, 1, 2]), 0);
        // Same day.
        assert_eq!(problem.break_count(&[0, 0, 2, 1, 0, 2]), 1);
        // Day after night, then night after night.
        assert_eq!(problem.break_count(&[0, 1, 1, 2, 0, 2]), 2);
        assert!(problem.score(&[0, 0, 2, 1, 0, 2]) > model.upper_bound());
    }

    #[test]
    fn test_fixed_only_breaks_ignored() {
        let mut model = make_model(3, 3, 3);
        // Day 0 is fixed with a same-day clash; only days 1-2 are open.
        model.fixed[0] = [Some(0), Some(0)];
        model.slots.drain(..2);
        model.candidates.drain(..2);
        model.hints.drain(..2);
        let problem = RosterProblem::new(&model, soon(), 1);

        assert_eq!(problem.break_count(&[1, 2, 0, 1]), 0);
        // Row 0 after its fixed night is counted.
        assert_eq!(problem.break_count(&[0, 2, 1, 0]), 1);
    }

    #[test]
    fn test_initial_roster_follows_rules_and_hints() {
        let mut model = make_model(10, 4, 8);
        model.hints[0] = Some(3);
        let problem = RosterProblem::new(&model, soon(), 1);
        let mut rng = SmallRng::seed_from_u64(42);

        let picks = problem.initial_solution(&mut rng);
        assert_eq!(picks[0], 3);
        assert_rule_clean(&model, &picks);
    }

    #[test]
    fn test_neighbor_stays_within_candidates() {
        let mut model = make_model(5, 4, 4);
        model.candidates[3] = vec![2];
        let problem = RosterProblem::new(&model, soon(), 1);
        let mut rng = SmallRng::seed_from_u64(5);
        let mut picks = problem.initial_solution(&mut rng);

        for _ in 0..500 {
            let next = problem.neighbor(&picks, &mut rng);
            let changed = next.iter().zip(&picks).filter(|(a, b)| a != b).count();
            assert!(changed <= 2);
            for (slot, row) in next.iter().enumerate() {
                assert!(model.candidates[slot].contains(row));
            }
            picks = next;
        }
    }

    #[test]
    fn test_anneal_fills_all_slots() {
        let model = make_model(14, 5, 8);
        let (picks, stats) = anneal(&model, soon(), 5_000, Some(7)).unwrap();

        assert_rule_clean(&model, &picks);
        let objective = model.evaluate(&model.loads(&picks));
        assert!(objective <= stats.initial_cost);
        assert!(objective >= model.lower_bound());
        assert!(stats.runs >= 1);
        assert_eq!(model.loads(&picks).iter().sum::<i64>(), 14 * 3);
    }

    #[test]
    fn test_anneal_repairs_tight_chain() {
        // Nights alternate between rows 0 and 2; days belong to rows 1 and 3.
        // Row 2 cannot work the last night, which pins the whole chain.
        let mut model = make_model(31, 4, 0);
        model.quotas = vec![30, 10, 30, 10];
        for (i, slot) in model.slots.iter().enumerate() {
            model.candidates[i] = match slot.shift {
                ShiftType::Day => vec![0, 1, 3],
                ShiftType::Night if slot.day == 30 => vec![0],
                ShiftType::Night => vec![0, 2],
            };
        }

        let (picks, _) = anneal(&model, soon(), 50_000, Some(3)).unwrap();
        assert_rule_clean(&model, &picks);
        for (slot, &row) in model.slots.iter().zip(&picks) {
            if slot.shift == ShiftType::Night {
                assert_eq!(row, if slot.day % 2 == 0 { 0 } else { 2 });
            }
        }
    }

    #[test]
    fn test_anneal_times_out_on_unfillable_model() {
        // Two employees cannot cover a day and a night two days running:
        // whoever works night 1 can work nothing on day 2.
        let model = make_model(2, 2, 3);
        let deadline = Instant::now() + Duration::from_millis(200);

        assert!(matches!(
            anneal(&model, deadline, 1_000, Some(1)),
            Err(SolveError::TimeLimit)
        ));
    }

    #[test]
    fn test_empty_model() {
        let model = make_model(0, 3, 3);
        let (picks, stats) = anneal(&model, soon(), 100, Some(1)).unwrap();
        assert!(picks.is_empty());
        assert_eq!(stats.runs, 0);
    }
}
