//! Monthly shift rostering for small teams.
//!
//! Assigns one employee to each day shift and each night shift of a calendar
//! month, respecting absences, off-shifts, shift-type preferences, and rest
//! rules, while keeping everyone's worked units close to a per-employee
//! quota drawn from an experience-level bucket.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Employee`, `Preferences`, `Schedule`,
//!   `ShiftType`, `MonthKey`
//! - **`quota`**: Experience buckets and the `QuotaAllocator`
//! - **`eligibility`**: Per (employee, date, shift) availability
//! - **`scope`**: Full vs. partial generation scope and adjusted quotas
//! - **`cp`**: Shift assignment model, annealed with `u-metaheur`
//! - **`scheduler`**: Generation orchestration and KPI statistics
//! - **`validation`**: Finished-roster and manual-edit checks
//! - **`store`**: Data store trait and an in-memory implementation
//! - **`config`**: Generator settings, loadable from TOML
//! - **`error`**: Input error types
//!
//! # Shift Units
//!
//! | Shift | Units |
//! |-------|-------|
//! | Day | 1 |
//! | Night | 2 |
//!
//! # References
//!
//! - Burke et al. (2004), "The State of the Art of Nurse Rostering"
//! - Baptiste et al. (2001), "Constraint-Based Scheduling"

pub mod config;
pub mod cp;
pub mod eligibility;
pub mod error;
pub mod models;
pub mod quota;
pub mod scheduler;
pub mod scope;
pub mod store;
pub mod validation;

pub use config::GeneratorConfig;
pub use error::{ConfigError, RosterError};
pub use scheduler::{GenerationMode, GenerationResult, ShiftGenerator};
pub use store::{MemoryStore, ScheduleStore};
