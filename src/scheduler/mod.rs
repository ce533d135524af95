//! Roster generation and quality metrics.
//!
//! Orchestrates one generation call: snapshot the store, decide between
//! full and partial mode, build and solve the shift model, then validate
//! and measure the result.
//!
//! # Modes
//!
//! | Request | Month | Behaviour |
//! |---------|-------|-----------|
//! | full | any | regenerate every slot |
//! | partial | future | same as full |
//! | partial | current | keep filled slots up to today, fill the rest |
//! | partial | past | fill gaps only |
//!
//! # KPI
//!
//! `EmployeeStats`, `TeamStats`, and `ScheduleSummary` report quota
//! deviation per employee and per experience bucket, plus suggestions.
//!
//! # References
//!
//! - Burke et al. (2004), "The State of the Art of Nurse Rostering"
//! - Ernst et al. (2004), "Staff scheduling and rostering: A review"

mod context;
mod generator;
mod kpi;

pub use context::GenerationContext;
pub use generator::{generate_in, GenerationMode, GenerationResult, ShiftGenerator};
pub use kpi::{
    employee_stats, DeviationFlag, DeviationType, EmployeeStats, ScheduleSummary, Severity,
    TeamStats,
};
