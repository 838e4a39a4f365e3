//! Version-upgrade verification harness: runs the old and new version of a
//! tool over the same inputs, grades the artifact and log differences, and
//! writes CSV/HTML reports.

pub mod cli;
pub mod commands;
pub mod comparison;
pub mod config;
pub mod errors;
pub mod extraction;
pub mod report;
pub mod runner;

pub use comparison::{
    ComparatorRegistry, ComparatorStrategy, ComparisonCriterion, ComparisonVerdict,
    CriterionStatus, OverallStatus,
};
pub use errors::HarnessError;
