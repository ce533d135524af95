//! Roster quality metrics.
//!
//! Computes per-employee quota deviation, team totals, and improvement
//! suggestions from a month's schedule.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Units | day shifts + 2 × night shifts |
//! | Deviation | units − quota |
//! | Severity | exact; \|dev\| ≤ 2 low; ≤ 5 medium; > 5 high |
//! | Quota violations | employees with non-zero deviation |
//! | Bucket deviation | level units − level target |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::eligibility::AbsenceMap;
use crate::models::{Employee, EmployeeId, Experience, MonthKey, Schedule, ShiftType};
use crate::quota::{QuotaAllocator, QuotaTable};

/// Direction of a quota deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviationType {
    Exact,
    OverQuota,
    UnderQuota,
}

/// Size band of a quota deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
}

impl Severity {
    /// Band of an absolute deviation.
    pub fn of(deviation: i64) -> Self {
        match deviation.abs() {
            0 => Severity::None,
            1..=2 => Severity::Low,
            3..=5 => Severity::Medium,
            _ => Severity::High,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::None => "none",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        };
        f.write_str(s)
    }
}

/// Classified deviation of one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviationFlag {
    pub employee_name: String,
    pub deviation_type: DeviationType,
    /// Signed deviation (units − quota).
    pub units: i64,
    pub severity: Severity,
    pub description: String,
}

impl DeviationFlag {
    /// Classifies a signed deviation.
    pub fn classify(employee_name: impl Into<String>, deviation: i64) -> Self {
        let severity = Severity::of(deviation);
        let deviation_type = match deviation {
            0 => DeviationType::Exact,
            d if d > 0 => DeviationType::OverQuota,
            _ => DeviationType::UnderQuota,
        };
        let description = match deviation_type {
            DeviationType::Exact => "Quota met exactly".to_string(),
            _ => {
                let degree = match severity {
                    Severity::Low => "Slightly",
                    Severity::Medium => "Moderately",
                    _ => "Significantly",
                };
                let direction = if deviation > 0 { "over" } else { "under" };
                format!("{degree} {direction} quota by {} units", deviation.abs())
            }
        };
        Self {
            employee_name: employee_name.into(),
            deviation_type,
            units: deviation,
            severity,
            description,
        }
    }
}

/// Per-employee statistics for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeStats {
    pub employee_id: EmployeeId,
    pub name: String,
    pub experience: Experience,
    pub day_shifts: usize,
    pub night_shifts: usize,
    /// day_shifts + 2 × night_shifts.
    pub units: i64,
    pub quota: i64,
    /// units − quota.
    pub deviation: i64,
    /// Recorded absence dates (all months).
    pub absences: usize,
    pub flag: DeviationFlag,
}

impl EmployeeStats {
    /// Counts an employee's shifts in `schedule` against `quota`.
    pub fn calculate(employee: &Employee, schedule: &Schedule, quota: i64, absences: usize) -> Self {
        let mut day_shifts = 0;
        let mut night_shifts = 0;
        for (_, shift, a) in schedule.assignments() {
            if a.employee_id != employee.id {
                continue;
            }
            match shift {
                ShiftType::Day => day_shifts += 1,
                ShiftType::Night => night_shifts += 1,
            }
        }
        let units = day_shifts as i64 + 2 * night_shifts as i64;
        let deviation = units - quota;
        Self {
            employee_id: employee.id,
            name: employee.name.clone(),
            experience: employee.experience,
            day_shifts,
            night_shifts,
            units,
            quota,
            deviation,
            absences,
            flag: DeviationFlag::classify(&employee.name, deviation),
        }
    }
}

/// Statistics for every employee, in roster order.
pub fn employee_stats(
    employees: &[Employee],
    schedule: &Schedule,
    quotas: &QuotaTable,
    absences: &AbsenceMap,
) -> Vec<EmployeeStats> {
    employees
        .iter()
        .map(|e| {
            let away = absences.get(&e.id).map_or(0, |dates| dates.len());
            EmployeeStats::calculate(e, schedule, quotas.get(&e.name), away)
        })
        .collect()
}

/// Team-level totals for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStats {
    pub total_employees: usize,
    pub high_count: usize,
    pub low_count: usize,
    pub total_units: i64,
    pub total_quota: i64,
    pub high_units: i64,
    pub low_units: i64,
    pub high_target: i64,
    pub low_target: i64,
    /// high_units − high_target.
    pub high_target_deviation: i64,
    /// low_units − low_target.
    pub low_target_deviation: i64,
    /// Employees whose deviation is not zero.
    pub quota_violations: usize,
    pub over_quota: Vec<String>,
    pub under_quota: Vec<String>,
    pub flags: Vec<DeviationFlag>,
    pub manual_assignments: usize,
}

impl TeamStats {
    /// Aggregates employee statistics. Bucket targets come from `allocator`
    /// (0 when unset).
    pub fn calculate(
        stats: &[EmployeeStats],
        allocator: &QuotaAllocator,
        days_in_month: u32,
        schedule: &Schedule,
    ) -> Self {
        let level_units = |level: Experience| -> i64 {
            stats
                .iter()
                .filter(|s| s.experience == level)
                .map(|s| s.units)
                .sum()
        };
        let target = |level: Experience| allocator.bucket(level).target(days_in_month).unwrap_or(0);
        let names = |pred: fn(i64) -> bool| -> Vec<String> {
            stats
                .iter()
                .filter(|s| pred(s.deviation))
                .map(|s| s.name.clone())
                .collect()
        };

        let high_units = level_units(Experience::High);
        let low_units = level_units(Experience::Low);
        let high_target = target(Experience::High);
        let low_target = target(Experience::Low);

        Self {
            total_employees: stats.len(),
            high_count: stats.iter().filter(|s| s.experience == Experience::High).count(),
            low_count: stats.iter().filter(|s| s.experience == Experience::Low).count(),
            total_units: stats.iter().map(|s| s.units).sum(),
            total_quota: stats.iter().map(|s| s.quota).sum(),
            high_units,
            low_units,
            high_target,
            low_target,
            high_target_deviation: high_units - high_target,
            low_target_deviation: low_units - low_target,
            quota_violations: stats.iter().filter(|s| s.deviation != 0).count(),
            over_quota: names(|d| d > 0),
            under_quota: names(|d| d < 0),
            flags: stats.iter().map(|s| s.flag.clone()).collect(),
            manual_assignments: schedule.manual_count(),
        }
    }

    /// Flags of a given severity.
    pub fn flags_with(&self, severity: Severity) -> Vec<&DeviationFlag> {
        self.flags.iter().filter(|f| f.severity == severity).collect()
    }
}

/// Slot counts and improvement suggestions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    /// Two per date of the month.
    pub total_slots: usize,
    pub day_shifts: usize,
    pub night_shifts: usize,
    pub unassigned: usize,
    pub suggestions: Vec<String>,
}

impl ScheduleSummary {
    /// Share of units the High level should carry before no suggestion is made.
    pub const HIGH_SHARE_THRESHOLD: f64 = 0.6;

    /// Summarizes `schedule` over every date of `month`.
    pub fn calculate(schedule: &Schedule, month: MonthKey, stats: &[EmployeeStats]) -> Self {
        let mut day_shifts = 0;
        let mut night_shifts = 0;
        let mut unassigned = 0;
        for date in month.dates() {
            for shift in ShiftType::ALL {
                match (schedule.is_assigned(date, shift), shift) {
                    (false, _) => unassigned += 1,
                    (true, ShiftType::Day) => day_shifts += 1,
                    (true, ShiftType::Night) => night_shifts += 1,
                }
            }
        }

        let mut suggestions = Vec::new();
        if unassigned > 0 {
            suggestions.push(format!("Fill {unassigned} unassigned shifts"));
        }
        let any_over = stats.iter().any(|s| s.deviation > 0);
        let any_under = stats.iter().any(|s| s.deviation < 0);
        if any_over && any_under {
            suggestions.push("Redistribute shifts to balance quotas".to_string());
        }
        let total_units: i64 = stats.iter().map(|s| s.units).sum();
        let high_units: i64 = stats
            .iter()
            .filter(|s| s.experience == Experience::High)
            .map(|s| s.units)
            .sum();
        if (high_units as f64) / (total_units.max(1) as f64) < Self::HIGH_SHARE_THRESHOLD {
            suggestions.push("Consider assigning more shifts to high experience employees".to_string());
        }

        Self {
            total_slots: month.days_in_month() as usize * 2,
            day_shifts,
            night_shifts,
            unassigned,
            suggestions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShiftAssignment;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, day).unwrap()
    }

    fn make_test_data() -> (Vec<Employee>, QuotaTable, Schedule) {
        let employees = vec![
            Employee::new(1, "EmpHigh", Experience::High),
            Employee::new(2, "EmpLow", Experience::Low),
        ];
        let quotas: QuotaTable = [("EmpHigh".to_string(), 24), ("EmpLow".to_string(), 21)]
            .into_iter()
            .collect();

        // EmpHigh: 2 nights = 4 units. EmpLow: 9 nights + 1 day = 19 units.
        let mut schedule = Schedule::new();
        for day in [1, 3] {
            schedule.assign(d(day), ShiftType::Night, ShiftAssignment::generated(1));
        }
        for day in [5, 7, 9, 11, 13, 15, 17, 19, 21] {
            schedule.assign(d(day), ShiftType::Night, ShiftAssignment::generated(2));
        }
        schedule.assign(d(2), ShiftType::Day, ShiftAssignment::manual(2));
        (employees, quotas, schedule)
    }

    #[test]
    fn test_deviation_scenario() {
        let (employees, quotas, schedule) = make_test_data();
        let stats = employee_stats(&employees, &schedule, &quotas, &AbsenceMap::new());

        assert_eq!(stats[0].units, 4);
        assert_eq!(stats[0].deviation, -20);
        assert_eq!(stats[0].flag.severity, Severity::High);
        assert_eq!(stats[0].flag.deviation_type, DeviationType::UnderQuota);
        assert_eq!(stats[0].flag.description, "Significantly under quota by 20 units");

        assert_eq!(stats[1].units, 19);
        assert_eq!(stats[1].deviation, -2);
        assert_eq!(stats[1].flag.severity, Severity::Low);
        assert_eq!(stats[1].flag.deviation_type, DeviationType::UnderQuota);

        let team = TeamStats::calculate(&stats, &QuotaAllocator::new(), 31, &schedule);
        assert_eq!(team.quota_violations, 2);
        assert_eq!(team.under_quota, vec!["EmpHigh".to_string(), "EmpLow".to_string()]);
        assert!(team.over_quota.is_empty());
        assert_eq!(team.total_units, 23);
        assert_eq!(team.total_quota, 45);
        assert_eq!(team.manual_assignments, 1);
        assert_eq!(team.flags_with(Severity::High).len(), 1);
    }

    #[test]
    fn test_severity_bands() {
        assert_eq!(DeviationFlag::classify("A", 0).description, "Quota met exactly");
        assert_eq!(DeviationFlag::classify("A", 0).severity, Severity::None);
        assert_eq!(DeviationFlag::classify("A", 2).description, "Slightly over quota by 2 units");
        assert_eq!(DeviationFlag::classify("A", 3).severity, Severity::Medium);
        assert_eq!(DeviationFlag::classify("A", -5).description, "Moderately under quota by 5 units");
        assert_eq!(DeviationFlag::classify("A", 6).severity, Severity::High);
        assert_eq!(DeviationFlag::classify("A", 6).deviation_type, DeviationType::OverQuota);
    }

    #[test]
    fn test_team_bucket_targets() {
        let (employees, quotas, schedule) = make_test_data();
        let mut allocator = QuotaAllocator::new();
        for level in Experience::ALL {
            allocator.recompute_bucket(level, &employees);
        }
        let stats = employee_stats(&employees, &schedule, &quotas, &AbsenceMap::new());
        let team = TeamStats::calculate(&stats, &allocator, 31, &schedule);

        assert_eq!(team.high_target, 24);
        assert_eq!(team.high_target_deviation, 4 - 24);
        assert_eq!(team.low_target_deviation, 19 - 21);
        assert_eq!((team.high_count, team.low_count), (1, 1));
    }

    #[test]
    fn test_summary_suggestions() {
        let (employees, quotas, schedule) = make_test_data();
        let stats = employee_stats(&employees, &schedule, &quotas, &AbsenceMap::new());
        let month = MonthKey::new(2025, 8).unwrap();
        let summary = ScheduleSummary::calculate(&schedule, month, &stats);

        assert_eq!(summary.total_slots, 62);
        assert_eq!(summary.night_shifts, 11);
        assert_eq!(summary.day_shifts, 1);
        assert_eq!(summary.unassigned, 50);
        assert_eq!(
            summary.suggestions,
            vec![
                "Fill 50 unassigned shifts".to_string(),
                "Consider assigning more shifts to high experience employees".to_string(),
            ]
        );
    }

    #[test]
    fn test_summary_balance_suggestion() {
        let employees = vec![
            Employee::new(1, "A", Experience::High),
            Employee::new(2, "B", Experience::High),
        ];
        let mut schedule = Schedule::new();
        schedule.assign(d(1), ShiftType::Night, ShiftAssignment::generated(1));
        let quotas: QuotaTable = [("A".to_string(), 1), ("B".to_string(), 1)].into_iter().collect();
        let stats = employee_stats(&employees, &schedule, &quotas, &AbsenceMap::new());
        let summary = ScheduleSummary::calculate(&schedule, MonthKey::new(2025, 8).unwrap(), &stats);

        assert!(summary
            .suggestions
            .contains(&"Redistribute shifts to balance quotas".to_string()));
        assert!(!summary
            .suggestions
            .iter()
            .any(|s| s.starts_with("Consider assigning")));
    }
}
