//! Monthly roster generation.
//!
//! # Algorithm
//!
//! 1. Snapshot employees, absences, quotas, and the stored schedule.
//! 2. Full mode: every slot of the month is open; the stored schedule only
//!    seeds the initial roster.
//! 3. Partial mode: the stored schedule is fixed; only unfilled slots on the
//!    scope dates are open, against quotas reduced by units already worked.
//! 4. Solve under the time budget, merge, then re-validate the whole month.
//!
//! The generator only reads from the store. Saving the result is the
//! caller's decision.

use std::time::Instant;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::context::GenerationContext;
use super::kpi::{employee_stats, EmployeeStats};
use crate::config::GeneratorConfig;
use crate::cp::{Objective, ShiftCpBuilder};
use crate::error::RosterError;
use crate::models::{MonthKey, Schedule};
use crate::scope::{adjusted_quotas, detect_scope, MonthPhase};
use crate::store::ScheduleStore;
use crate::validation::validate_solution;

/// Which kind of generation ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    Full,
    Partial,
}

/// Outcome of one generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Whether the solver found a feasible roster.
    pub success: bool,
    /// The generated roster; on failure the prior schedule (partial) or
    /// an empty one (full).
    pub schedule: Schedule,
    /// Unfilled slots and rule breaks of `schedule`, found by re-walking
    /// the month. On failure this lists every slot left open.
    pub violations: Vec<String>,
    pub message: String,
    pub mode: GenerationMode,
    /// Objective of the solved model, when one was solved.
    pub objective: Option<i64>,
    /// Per-employee statistics of `schedule`.
    pub statistics: Vec<EmployeeStats>,
}

/// Generates monthly rosters from a store.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use shift_roster::config::GeneratorConfig;
/// use shift_roster::models::{Experience, MonthKey, Preferences};
/// use shift_roster::scheduler::ShiftGenerator;
/// use shift_roster::store::MemoryStore;
///
/// let mut store = MemoryStore::new();
/// for (name, level) in [("A", Experience::High), ("B", Experience::High), ("C", Experience::Low)] {
///     store.add_employee(name, level, Preferences::new());
/// }
/// let config = GeneratorConfig::default()
///     .with_time_limit_secs(5.0)
///     .with_random_seed(7);
/// let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
///
/// let result = ShiftGenerator::new(&store)
///     .with_config(config)
///     .generate(MonthKey::new(2025, 2).unwrap(), false, today);
/// assert!(result.success);
/// assert!(result.violations.is_empty());
/// ```
pub struct ShiftGenerator<'s, S: ScheduleStore + ?Sized> {
    store: &'s S,
    config: GeneratorConfig,
}

impl<'s, S: ScheduleStore + ?Sized> ShiftGenerator<'s, S> {
    /// Creates a generator with the default configuration.
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            config: GeneratorConfig::default(),
        }
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates a roster for a (year, month) pair.
    ///
    /// # Errors
    /// `RosterError::InvalidMonth` when the pair is not a calendar month.
    pub fn generate_for(
        &self,
        year: i32,
        month: u32,
        partial: bool,
        today: NaiveDate,
    ) -> Result<GenerationResult, RosterError> {
        let month = MonthKey::new(year, month)?;
        Ok(self.generate(month, partial, today))
    }

    /// Generates a roster for `month`.
    ///
    /// With `partial` set, a current or past month is gap-filled around the
    /// stored schedule; a future month is generated in full.
    pub fn generate(&self, month: MonthKey, partial: bool, today: NaiveDate) -> GenerationResult {
        let ctx = GenerationContext::load(self.store, month);
        generate_in(&ctx, &self.config, partial, today)
    }
}

/// Generates a roster from an explicit snapshot.
pub fn generate_in(
    ctx: &GenerationContext,
    config: &GeneratorConfig,
    partial: bool,
    today: NaiveDate,
) -> GenerationResult {
    let start = Instant::now();
    info!(
        event = "generation_start",
        month = %ctx.month,
        partial,
        employees = ctx.employees.len(),
    );

    let result = if partial {
        let scope = detect_scope(ctx.month, &ctx.existing, today);
        match scope.phase {
            MonthPhase::Future => generate_full(ctx, config),
            _ if !scope.is_partial => nothing_to_fill(ctx),
            _ => generate_partial(ctx, config, &scope.days),
        }
    } else {
        generate_full(ctx, config)
    };

    info!(
        event = "generation_end",
        month = %ctx.month,
        mode = ?result.mode,
        success = result.success,
        objective = ?result.objective,
        violations = result.violations.len(),
        duration_ms = start.elapsed().as_millis() as u64,
    );
    result
}

fn generate_full(ctx: &GenerationContext, config: &GeneratorConfig) -> GenerationResult {
    let dates: Vec<NaiveDate> = ctx.month.dates().collect();
    let matrix = ctx.matrix(&dates);
    let mut builder = ShiftCpBuilder::new(ctx.month, &ctx.employees, &matrix, &ctx.quotas)
        .with_objective(Objective::Absolute);
    if config.warm_start && !ctx.existing.is_empty() {
        builder = builder.with_hint(&ctx.existing);
    }

    match builder.solve(config) {
        Ok(outcome) => {
            let mut schedule = Schedule::new();
            outcome.apply_to(&mut schedule);
            let violations = validate_solution(&schedule, ctx.month);
            let mut message = "Schedule generated successfully".to_string();
            if !violations.is_empty() {
                message.push_str(&format!(" with {} constraint violations", violations.len()));
            }
            finish(ctx, true, schedule, violations, message, GenerationMode::Full, Some(outcome.objective))
        }
        Err(err) => {
            let schedule = Schedule::new();
            let violations = validate_solution(&schedule, ctx.month);
            finish(
                ctx,
                false,
                schedule,
                violations,
                format!("Failed to generate complete schedule: {err}"),
                GenerationMode::Full,
                None,
            )
        }
    }
}

fn generate_partial(ctx: &GenerationContext, config: &GeneratorConfig, days: &[NaiveDate]) -> GenerationResult {
    let matrix = ctx.matrix(days);
    let remaining = adjusted_quotas(&ctx.quotas, &ctx.existing, &ctx.employees);
    let solved = ShiftCpBuilder::new(ctx.month, &ctx.employees, &matrix, &remaining)
        .with_fixed(&ctx.existing)
        .with_objective(Objective::Overage {
            slack: config.partial_slack_units,
        })
        .solve(config);

    match solved {
        Ok(outcome) => {
            let mut schedule = ctx.existing.clone();
            outcome.apply_to(&mut schedule);
            let violations = validate_solution(&schedule, ctx.month);
            let mut message = format!("Partial schedule generated successfully for {} days.", days.len());
            if !violations.is_empty() {
                message.push_str(&format!(" with {} constraint violations found.", violations.len()));
            }
            finish(ctx, true, schedule, violations, message, GenerationMode::Partial, Some(outcome.objective))
        }
        Err(err) => {
            let listed: Vec<String> = days.iter().map(|d| d.day().to_string()).collect();
            let violations = validate_solution(&ctx.existing, ctx.month);
            finish(
                ctx,
                false,
                ctx.existing.clone(),
                violations,
                format!(
                    "Failed to generate partial schedule for days: [{}] ({err})",
                    listed.join(", ")
                ),
                GenerationMode::Partial,
                None,
            )
        }
    }
}

fn nothing_to_fill(ctx: &GenerationContext) -> GenerationResult {
    let violations = validate_solution(&ctx.existing, ctx.month);
    finish(
        ctx,
        true,
        ctx.existing.clone(),
        violations,
        format!("No days to generate for {}", ctx.month),
        GenerationMode::Partial,
        None,
    )
}

fn finish(
    ctx: &GenerationContext,
    success: bool,
    schedule: Schedule,
    violations: Vec<String>,
    message: String,
    mode: GenerationMode,
    objective: Option<i64>,
) -> GenerationResult {
    let statistics = employee_stats(&ctx.employees, &schedule, &ctx.quotas, &ctx.absences);
    GenerationResult {
        success,
        schedule,
        violations,
        message,
        mode,
        objective,
        statistics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Employee, Experience, Preferences, ShiftAssignment, ShiftType};
    use crate::store::MemoryStore;

    fn august() -> MonthKey {
        MonthKey::new(2025, 8).unwrap()
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, day).unwrap()
    }

    fn fast_config() -> GeneratorConfig {
        GeneratorConfig::default()
            .with_time_limit_secs(10.0)
            .with_random_seed(11)
            .with_unimproved_step_limit(20_000)
    }

    fn make_test_data() -> GenerationContext {
        GenerationContext::new(
            august(),
            vec![
                Employee::new(1, "H1", Experience::High),
                Employee::new(2, "H2", Experience::High),
                Employee::new(3, "L1", Experience::Low),
                Employee::new(4, "L2", Experience::Low),
            ],
        )
    }

    /// Days 1..=last on a valid four-person rotation, some marked manual.
    fn rotation_through(last: u32) -> Schedule {
        let ids = [1, 2, 3, 4];
        let mut schedule = Schedule::new();
        for day in 1..=last {
            let k = day as usize;
            let day_shift = if day % 5 == 0 {
                ShiftAssignment::manual(ids[(k + 1) % 4])
            } else {
                ShiftAssignment::generated(ids[(k + 1) % 4])
            };
            schedule.assign(d(day), ShiftType::Day, day_shift);
            schedule.assign(d(day), ShiftType::Night, ShiftAssignment::generated(ids[(k + 3) % 4]));
        }
        schedule
    }

    #[test]
    fn test_full_generation() {
        let ctx = make_test_data();
        let result = generate_in(&ctx, &fast_config(), false, d(1));

        assert!(result.success);
        assert_eq!(result.mode, GenerationMode::Full);
        assert!(result.violations.is_empty());
        assert_eq!(result.message, "Schedule generated successfully");
        assert_eq!(result.schedule.assignment_count(), 62);
        assert_eq!(result.statistics.len(), 4);

        let total_deviation: i64 = result.statistics.iter().map(|s| s.deviation.abs()).sum();
        assert_eq!(Some(total_deviation), result.objective);
    }

    #[test]
    fn test_full_generation_ignores_existing_assignments() {
        let ctx = make_test_data().with_existing(rotation_through(31));
        let result = generate_in(&ctx, &fast_config(), false, d(1));

        assert!(result.success);
        assert!(result.violations.is_empty());
        assert_eq!(result.schedule.manual_count(), 0);
    }

    #[test]
    fn test_partial_preserves_existing() {
        let existing = rotation_through(14);
        let ctx = make_test_data().with_existing(existing.clone());
        let result = generate_in(&ctx, &fast_config(), true, d(14));

        assert!(result.success);
        assert_eq!(result.mode, GenerationMode::Partial);
        assert!(result.violations.is_empty());
        assert_eq!(
            result.message,
            "Partial schedule generated successfully for 17 days."
        );
        for (date, shift, assignment) in existing.assignments() {
            assert_eq!(result.schedule.get(date, shift), Some(assignment));
        }
        assert_eq!(result.schedule.assignment_count(), 62);
    }

    #[test]
    fn test_partial_fills_past_gaps() {
        let mut existing = rotation_through(31);
        existing.clear(d(6), ShiftType::Night);
        let ctx = make_test_data().with_existing(existing);
        let today = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let result = generate_in(&ctx, &fast_config(), true, today);

        assert!(result.success);
        assert_eq!(result.message, "Partial schedule generated successfully for 1 days.");
        assert!(result.schedule.is_assigned(d(6), ShiftType::Night));
        assert!(result.violations.is_empty());
    }

    #[test]
    fn test_partial_with_nothing_to_fill() {
        let existing = rotation_through(31);
        let ctx = make_test_data().with_existing(existing.clone());
        let today = NaiveDate::from_ymd_opt(2025, 9, 3).unwrap();
        let result = generate_in(&ctx, &fast_config(), true, today);

        assert!(result.success);
        assert_eq!(result.schedule, existing);
        assert_eq!(result.objective, None);
    }

    #[test]
    fn test_partial_future_month_runs_full() {
        let ctx = make_test_data();
        let today = NaiveDate::from_ymd_opt(2025, 7, 20).unwrap();
        let result = generate_in(&ctx, &fast_config(), true, today);

        assert!(result.success);
        assert_eq!(result.mode, GenerationMode::Full);
    }

    #[test]
    fn test_infeasible_reports_failure() {
        let every_day: Vec<NaiveDate> = august().dates().collect();
        let ctx = make_test_data()
            .with_absences(2, every_day.clone())
            .with_absences(3, every_day.clone())
            .with_absences(4, every_day);
        let result = generate_in(&ctx, &fast_config(), false, d(1));

        assert!(!result.success);
        assert!(result.message.starts_with("Failed to generate complete schedule"));
        assert!(result.schedule.is_empty());
        assert_eq!(result.objective, None);
        // Every slot of the month is reported open.
        assert_eq!(result.violations.len(), 62);
        assert!(result.violations.contains(&"No employee assigned to night shift on 2025-08-31".to_string()));
    }

    #[test]
    fn test_partial_failure_returns_existing() {
        let existing = rotation_through(20);
        let late: Vec<NaiveDate> = (21..=31).map(d).collect();
        let ctx = make_test_data()
            .with_existing(existing.clone())
            .with_absences(1, late.clone())
            .with_absences(2, late.clone())
            .with_absences(3, late);
        let result = generate_in(&ctx, &fast_config(), true, d(20));

        assert!(!result.success);
        assert_eq!(result.schedule, existing);
        assert!(result.message.starts_with("Failed to generate partial schedule for days: [21, 22"));
        // Days 21-31 stay open, two slots each.
        assert_eq!(result.violations.len(), 22);
    }

    #[test]
    fn test_partial_current_month_keeps_manual_slots_after_today() {
        let mut existing = rotation_through(14);
        existing.assign(d(20), ShiftType::Day, ShiftAssignment::manual(1));
        existing.assign(d(25), ShiftType::Night, ShiftAssignment::manual(2));
        existing.assign(d(26), ShiftType::Day, ShiftAssignment::manual(3));
        let ctx = make_test_data().with_existing(existing.clone());
        let result = generate_in(&ctx, &fast_config(), true, d(14));

        assert!(result.success);
        assert_eq!(result.mode, GenerationMode::Partial);
        assert!(result.violations.is_empty(), "{:?}", result.violations);
        assert_eq!(
            result.message,
            "Partial schedule generated successfully for 17 days."
        );
        for (date, shift, assignment) in existing.assignments() {
            assert_eq!(result.schedule.get(date, shift), Some(assignment));
        }
        assert_eq!(result.schedule.manual_count(), existing.manual_count());
        assert_eq!(result.schedule.assignment_count(), 62);
        // The manual night on the 25th rules employee 2 out of the 26th.
        assert_ne!(result.schedule.employee_on(d(26), ShiftType::Night), Some(2));
    }

    #[test]
    fn test_generate_from_store() {
        let mut store = MemoryStore::new();
        for (name, level) in [
            ("H1", Experience::High),
            ("H2", Experience::High),
            ("L1", Experience::Low),
        ] {
            store.add_employee(name, level, Preferences::new());
        }
        let generator = ShiftGenerator::new(&store).with_config(fast_config());

        let result = generator.generate_for(2025, 8, false, d(1)).unwrap();
        assert!(result.success);
        assert!(result.violations.is_empty());

        assert!(matches!(
            generator.generate_for(2025, 13, false, d(1)),
            Err(RosterError::InvalidMonth { month: 13, .. })
        ));
    }
}
