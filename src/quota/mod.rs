//! Quota allocation.
//!
//! Each experience level has a monthly target of shift units per month
//! length. The target is split across the level's active employees, and a
//! per-employee custom override always beats the computed share.
//!
//! # Components
//!
//! | Type | Role |
//! |------|------|
//! | [`ExperienceBucket`] | Targets, split method, and weights for one level |
//! | [`QuotaAllocator`] | Owns both buckets; redistributes on roster change |
//! | [`QuotaTable`] | Derived name → quota table fed to the optimizer |

mod allocator;
mod bucket;

pub use allocator::QuotaAllocator;
pub use bucket::{DistributionMethod, ExperienceBucket};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Employee name → quota (shift units) for one month length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuotaTable(BTreeMap<String, i64>);

impl QuotaTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Quota for `name`; 0 when absent.
    #[inline]
    pub fn get(&self, name: &str) -> i64 {
        self.0.get(name).copied().unwrap_or(0)
    }

    /// Sets a quota.
    pub fn insert(&mut self, name: impl Into<String>, quota: i64) {
        self.0.insert(name.into(), quota);
    }

    /// Iterates in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, i64)> for QuotaTable {
    fn from_iter<I: IntoIterator<Item = (String, i64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
