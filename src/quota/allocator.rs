//! Quota allocator.
//!
//! Owns one [`ExperienceBucket`] per experience level. The roster itself
//! belongs to the data store and is passed in on every call, so the
//! allocator never holds a stale copy of it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DistributionMethod, ExperienceBucket, QuotaTable};
use crate::models::{Employee, Experience, MONTH_LENGTHS};

/// Per-level monthly targets and their distributed shares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaAllocator {
    high: ExperienceBucket,
    low: ExperienceBucket,
}

impl Default for QuotaAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl QuotaAllocator {
    /// Creates an allocator with an empty equal-split bucket per level.
    pub fn new() -> Self {
        Self {
            high: ExperienceBucket::new(Experience::High),
            low: ExperienceBucket::new(Experience::Low),
        }
    }

    /// The bucket for a level.
    pub fn bucket(&self, level: Experience) -> &ExperienceBucket {
        match level {
            Experience::High => &self.high,
            Experience::Low => &self.low,
        }
    }

    fn bucket_mut(&mut self, level: Experience) -> &mut ExperienceBucket {
        match level {
            Experience::High => &mut self.high,
            Experience::Low => &mut self.low,
        }
    }

    /// Quota of one employee for a month length.
    ///
    /// The custom override wins; otherwise the last distributed share;
    /// otherwise the level default.
    pub fn quota_for(&self, employee: &Employee, days_in_month: u32) -> i64 {
        if let Some(custom) = employee.custom_quota(days_in_month) {
            return custom;
        }
        self.bucket(employee.experience)
            .share(days_in_month, &employee.name)
            .unwrap_or_else(|| employee.experience.default_quota(days_in_month))
    }

    /// Quota table (name → quota) for the given employees.
    pub fn quota_table(&self, employees: &[Employee], days_in_month: u32) -> QuotaTable {
        employees
            .iter()
            .map(|e| (e.name.clone(), self.quota_for(e, days_in_month)))
            .collect()
    }

    /// Stores a target and redistributes that (level, month length).
    pub fn set_target(
        &mut self,
        level: Experience,
        days_in_month: u32,
        target: i64,
        roster: &[Employee],
    ) {
        self.bucket_mut(level).targets.insert(days_in_month, target);
        self.redistribute(level, days_in_month, roster);
    }

    /// Stores the split method (and weights, when given) and redistributes
    /// every month length that already has a target.
    pub fn set_distribution_method(
        &mut self,
        level: Experience,
        method: DistributionMethod,
        weights: Option<BTreeMap<String, f64>>,
        roster: &[Employee],
    ) {
        let bucket = self.bucket_mut(level);
        bucket.method = method;
        if let Some(weights) = weights {
            bucket.weights = weights;
        }
        let lengths: Vec<u32> = bucket.targets.keys().copied().collect();
        for days in lengths {
            self.redistribute(level, days, roster);
        }
    }

    /// Recomputes shares for one (level, month length).
    ///
    /// With no stored target, the target becomes active headcount × level
    /// default. Employees with a custom override keep the override as their
    /// stored quota; everyone else gets the computed share.
    pub fn redistribute(&mut self, level: Experience, days_in_month: u32, roster: &[Employee]) {
        let members = active_members(roster, level);
        let bucket = self.bucket_mut(level);
        if members.is_empty() {
            bucket.shares.remove(&days_in_month);
            return;
        }

        let target = match bucket.target(days_in_month) {
            Some(t) if t > 0 => t,
            _ => {
                let derived = members.len() as i64 * level.default_quota(days_in_month);
                bucket.targets.insert(days_in_month, derived);
                derived
            }
        };

        let computed = bucket.distribute(&members, target);
        let stored: BTreeMap<String, i64> = members
            .iter()
            .map(|e| {
                let quota = e
                    .custom_quota(days_in_month)
                    .or_else(|| computed.get(&e.name).copied())
                    .unwrap_or(0);
                (e.name.clone(), quota)
            })
            .collect();
        bucket.shares.insert(days_in_month, stored);

        debug!(
            event = "redistribute",
            level = %level,
            days_in_month,
            target,
            members = members.len(),
        );
    }

    /// Roster membership changed for `level`: reset every month length's
    /// target to active headcount × default, then redistribute.
    ///
    /// With no active employees left the targets are kept and the shares
    /// cleared.
    pub fn recompute_bucket(&mut self, level: Experience, roster: &[Employee]) {
        let headcount = active_members(roster, level).len() as i64;
        let bucket = self.bucket_mut(level);
        if headcount == 0 {
            bucket.shares.clear();
            return;
        }
        for days in MONTH_LENGTHS {
            bucket
                .targets
                .insert(days, headcount * level.default_quota(days));
        }
        for days in MONTH_LENGTHS {
            self.redistribute(level, days, roster);
        }
    }

    /// The overrides an employee moving to `level` should receive.
    ///
    /// Writing these as custom quotas pins the new level's defaults so later
    /// redistribution cannot shift them. This turns an implicit default into
    /// a sticky explicit override; the caller decides whether to apply it.
    pub fn pinned_level_defaults(level: Experience) -> BTreeMap<u32, i64> {
        MONTH_LENGTHS
            .iter()
            .map(|&days| (days, level.default_quota(days)))
            .collect()
    }

    /// Records an explicit quota in the stored shares. The override itself
    /// lives in the employee's preferences.
    pub fn record_override(&mut self, employee: &Employee, days_in_month: u32, quota: i64) {
        self.bucket_mut(employee.experience)
            .shares
            .entry(days_in_month)
            .or_default()
            .insert(employee.name.clone(), quota);
    }

    /// Drops every stored share of an employee.
    pub fn forget(&mut self, name: &str) {
        for level in Experience::ALL {
            for shares in self.bucket_mut(level).shares.values_mut() {
                shares.remove(name);
            }
        }
    }
}

fn active_members(roster: &[Employee], level: Experience) -> Vec<&Employee> {
    roster
        .iter()
        .filter(|e| e.is_active && e.experience == level)
        .collect()
}
