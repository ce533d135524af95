//! Experience buckets and share distribution.
//!
//! A bucket holds the monthly shift-unit target for one experience level
//! and splits it across that level's active employees.
//!
//! # Distribution Methods
//!
//! | Method | Share of employee e |
//! |--------|---------------------|
//! | Equal | ⌊T/n⌋, plus 1 for the first T mod n employees by id |
//! | Weighted | round(w(e) / Σw × T), w defaults to 1.0 |
//! | Proportional | same as Equal |
//!
//! Weighted falls back to Equal when the weights sum to zero or less.
//! Rounding is half-to-even, so weighted shares need not sum to T.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Employee, Experience};

/// How a bucket target is split across employees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionMethod {
    /// Integer split; remainder goes to the lowest ids.
    #[default]
    Equal,
    /// Split by per-employee weight factors.
    Weighted,
    /// Currently identical to `Equal`.
    Proportional,
}

/// Quota bucket for one experience level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceBucket {
    /// Level this bucket covers.
    pub level: Experience,
    /// Target shift units keyed by month length (28-31).
    pub targets: BTreeMap<u32, i64>,
    /// Split method.
    pub method: DistributionMethod,
    /// Weight factors by employee name (weighted method only).
    pub weights: BTreeMap<String, f64>,
    /// Last distributed quotas: month length → employee name → quota.
    #[serde(default)]
    pub shares: BTreeMap<u32, BTreeMap<String, i64>>,
}

impl ExperienceBucket {
    /// Creates an empty bucket using equal distribution.
    pub fn new(level: Experience) -> Self {
        Self {
            level,
            targets: BTreeMap::new(),
            method: DistributionMethod::Equal,
            weights: BTreeMap::new(),
            shares: BTreeMap::new(),
        }
    }

    /// Stored target for a month length, if any.
    #[inline]
    pub fn target(&self, days_in_month: u32) -> Option<i64> {
        self.targets.get(&days_in_month).copied()
    }

    /// Stored quota of an employee for a month length, if distributed.
    #[inline]
    pub fn share(&self, days_in_month: u32, name: &str) -> Option<i64> {
        self.shares.get(&days_in_month).and_then(|m| m.get(name)).copied()
    }

    /// Weight of an employee (1.0 when unspecified).
    #[inline]
    pub fn weight(&self, name: &str) -> f64 {
        self.weights.get(name).copied().unwrap_or(1.0)
    }

    /// Splits `target` across `members` using this bucket's method.
    ///
    /// Members are ordered by id first, so the result does not depend on
    /// the order the caller passes them in.
    pub fn distribute(&self, members: &[&Employee], target: i64) -> BTreeMap<String, i64> {
        if members.is_empty() {
            return BTreeMap::new();
        }
        let mut ordered: Vec<&Employee> = members.to_vec();
        ordered.sort_by_key(|e| e.id);

        match self.method {
            DistributionMethod::Equal | DistributionMethod::Proportional => {
                equal_shares(&ordered, target)
            }
            DistributionMethod::Weighted => match self.weighted_shares(&ordered, target) {
                Some(shares) => shares,
                None => equal_shares(&ordered, target),
            },
        }
    }

    /// `None` when the weights do not sum to a positive value.
    fn weighted_shares(&self, members: &[&Employee], target: i64) -> Option<BTreeMap<String, i64>> {
        let total: f64 = members.iter().map(|e| self.weight(&e.name)).sum();
        if total <= 0.0 {
            return None;
        }
        Some(
            members
                .iter()
                .map(|e| {
                    let share = (self.weight(&e.name) / total * target as f64).round_ties_even();
                    (e.name.clone(), share as i64)
                })
                .collect(),
        )
    }
}

fn equal_shares(members: &[&Employee], target: i64) -> BTreeMap<String, i64> {
    let n = members.len() as i64;
    let base = target / n;
    let remainder = target % n;
    members
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let bonus = if (i as i64) < remainder { 1 } else { 0 };
            (e.name.clone(), base + bonus)
        })
        .collect()
}
