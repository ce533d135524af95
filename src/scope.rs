//! Partial generation scope.
//!
//! Decides, from the month being generated and today's date, whether a
//! generation call is full or partial, and which dates a partial call must
//! fill.
//!
//! # Rules
//!
//! | Month vs. today | Dates to generate |
//! |-----------------|-------------------|
//! | Future | none; caller runs full generation |
//! | Current | dates ≤ today with an unfilled slot, plus every date after today |
//! | Past | dates with an unfilled slot |
//!
//! A date is unfilled when either of its two slots has no assignee.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{Employee, MonthKey, Schedule};
use crate::quota::QuotaTable;

/// Where a month sits relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthPhase {
    Past,
    Current,
    Future,
}

/// Result of scope detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialScope {
    /// Month position relative to today.
    pub phase: MonthPhase,
    /// Whether there is anything to generate.
    pub is_partial: bool,
    /// Dates to generate, ascending.
    pub days: Vec<NaiveDate>,
    /// Today's day of month.
    pub current_day: u32,
}

/// Detects the generation scope for `month`.
pub fn detect_scope(month: MonthKey, schedule: &Schedule, today: NaiveDate) -> PartialScope {
    let this_month = MonthKey::of(today);
    let phase = if month > this_month {
        MonthPhase::Future
    } else if month == this_month {
        MonthPhase::Current
    } else {
        MonthPhase::Past
    };

    let unfilled = |date: &NaiveDate| {
        schedule
            .day(*date)
            .map_or(true, |record| !record.is_complete())
    };

    let days: Vec<NaiveDate> = match phase {
        MonthPhase::Future => Vec::new(),
        MonthPhase::Current => month
            .dates()
            .filter(|date| *date > today || unfilled(date))
            .collect(),
        MonthPhase::Past => month.dates().filter(unfilled).collect(),
    };

    PartialScope {
        phase,
        is_partial: !days.is_empty(),
        days,
        current_day: today.day(),
    }
}

/// Quota remaining after the shift units already in `schedule`, floored at 0.
pub fn adjusted_quotas(quotas: &QuotaTable, schedule: &Schedule, employees: &[Employee]) -> QuotaTable {
    employees
        .iter()
        .map(|e| {
            let remaining = (quotas.get(&e.name) - schedule.units_for(e.id)).max(0);
            (e.name.clone(), remaining)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Experience, ShiftAssignment, ShiftType};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, day).unwrap()
    }

    fn august() -> MonthKey {
        MonthKey::new(2025, 8).unwrap()
    }

    fn filled_through(last: u32) -> Schedule {
        let mut s = Schedule::new();
        for day in 1..=last {
            s.assign(d(day), ShiftType::Day, ShiftAssignment::generated(1));
            s.assign(d(day), ShiftType::Night, ShiftAssignment::generated(2));
        }
        s
    }

    #[test]
    fn test_future_month() {
        let today = NaiveDate::from_ymd_opt(2025, 7, 20).unwrap();
        let scope = detect_scope(august(), &Schedule::new(), today);
        assert_eq!(scope.phase, MonthPhase::Future);
        assert!(!scope.is_partial);
        assert!(scope.days.is_empty());
    }

    #[test]
    fn test_current_month() {
        let mut schedule = filled_through(10);
        schedule.clear(d(4), ShiftType::Night);
        let scope = detect_scope(august(), &schedule, d(10));

        assert_eq!(scope.phase, MonthPhase::Current);
        assert!(scope.is_partial);
        assert_eq!(scope.current_day, 10);
        assert_eq!(scope.days[0], d(4));
        // 4, then 11..=31
        assert_eq!(scope.days.len(), 1 + 21);
        assert!(!scope.days.contains(&d(10)));
    }

    #[test]
    fn test_current_month_future_days_always_included() {
        let schedule = filled_through(31);
        let scope = detect_scope(august(), &schedule, d(30));
        assert_eq!(scope.days, vec![d(31)]);
    }

    #[test]
    fn test_past_month_gap_fill() {
        let mut schedule = filled_through(31);
        schedule.clear(d(7), ShiftType::Day);
        let today = NaiveDate::from_ymd_opt(2025, 9, 15).unwrap();
        let scope = detect_scope(august(), &schedule, today);

        assert_eq!(scope.phase, MonthPhase::Past);
        assert_eq!(scope.days, vec![d(7)]);
    }

    #[test]
    fn test_past_month_complete() {
        let today = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let scope = detect_scope(august(), &filled_through(31), today);
        assert!(!scope.is_partial);
        assert_eq!(scope.phase, MonthPhase::Past);
    }

    #[test]
    fn test_adjusted_quotas() {
        let employees = vec![
            Employee::new(1, "A", Experience::High),
            Employee::new(2, "B", Experience::Low),
            Employee::new(3, "C", Experience::Low),
        ];
        let quotas: QuotaTable = [("A".to_string(), 24), ("B".to_string(), 5), ("C".to_string(), 21)]
            .into_iter()
            .collect();
        // A: 5 day units, B: 5 nights = 10 units
        let schedule = filled_through(5);
        let adjusted = adjusted_quotas(&quotas, &schedule, &employees);

        assert_eq!(adjusted.get("A"), 19);
        assert_eq!(adjusted.get("B"), 0);
        assert_eq!(adjusted.get("C"), 21);
    }
}
