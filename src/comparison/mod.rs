//! Artifact and log comparison: the strategy trait, its implementations,
//! and the grading rules shared between them.

pub mod builtin;
pub mod config_strategy;
pub mod diff_builder;
pub mod registry;
pub mod strategy;
pub mod types;

pub use config_strategy::ConfigComparator;
pub use diff_builder::{CriteriaSet, DiffBuilder};
pub use registry::{ComparatorRegistry, Resolution, ResolutionKind};
pub use strategy::{ComparatorStrategy, ComparisonOutcome, DefaultComparator};
pub use types::{
    ComparisonCriterion, ComparisonVerdict, CriterionStatus, OverallStatus, ToolInvocationResult,
};
