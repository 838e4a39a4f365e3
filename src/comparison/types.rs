//! Data types shared across the comparison pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Graded status of a single comparison criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CriterionStatus {
    Success,
    Failed,
    NotApplicable,
    Error,
}

impl CriterionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CriterionStatus::Success => "Success",
            CriterionStatus::Failed => "Failed",
            CriterionStatus::NotApplicable => "N/A",
            CriterionStatus::Error => "Error",
        }
    }
}

impl fmt::Display for CriterionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One graded fact about the old→new transition.
///
/// Every criterion is derived deterministically from the two extracted field
/// sets (or the embedded payload) by a fixed threshold rule in
/// [`crate::comparison::diff_builder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonCriterion {
    pub name: String,
    pub status: CriterionStatus,
    pub description: String,
}

impl ComparisonCriterion {
    pub fn new(
        name: impl Into<String>,
        status: CriterionStatus,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status,
            description: description.into(),
        }
    }

    /// N/A entry used when an artifact or log is missing on disk.
    pub fn not_applicable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(name, CriterionStatus::NotApplicable, reason)
    }
}

/// Aggregate status for one tool's old→new comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallStatus {
    Success,
    Failed,
    Error,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Success => "Success",
            OverallStatus::Failed => "Failed",
            OverallStatus::Error => "Error",
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Captured result of running one version of a tool. Created synchronously
/// by the execution step and consumed by exactly one comparison pass.
#[derive(Debug, Clone)]
pub struct ToolInvocationResult {
    pub exit_succeeded: bool,
    pub captured_output: String,
    pub artifact_path: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
}

/// Immutable verdict handed to the report sink. Criterion order matches
/// extraction order and is significant for report readability.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonVerdict {
    pub tool_name: String,
    pub old_version: String,
    pub new_version: String,
    pub overall: OverallStatus,
    pub detail: String,
    pub criteria: Vec<ComparisonCriterion>,
    pub old_artifact: Option<PathBuf>,
    pub new_artifact: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub timestamp: String,
}

impl ComparisonVerdict {
    /// Build a verdict from graded criteria. Any `Failed` criterion fails
    /// the verdict; `Error` is reserved for execution/extraction faults and
    /// never produced by grading well-formed data.
    pub fn from_criteria(
        tool_name: impl Into<String>,
        old_version: impl Into<String>,
        new_version: impl Into<String>,
        criteria: Vec<ComparisonCriterion>,
        detail: String,
    ) -> Self {
        let overall = if criteria
            .iter()
            .any(|c| c.status == CriterionStatus::Failed)
        {
            OverallStatus::Failed
        } else {
            OverallStatus::Success
        };

        Self {
            tool_name: tool_name.into(),
            old_version: old_version.into(),
            new_version: new_version.into(),
            overall,
            detail,
            criteria,
            old_artifact: None,
            new_artifact: None,
            log_file: None,
            timestamp: now_stamp(),
        }
    }

    /// Error verdict for a tool whose pipeline failed outright. The batch
    /// still continues with the remaining tools.
    pub fn error(
        tool_name: impl Into<String>,
        old_version: impl Into<String>,
        new_version: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            old_version: old_version.into(),
            new_version: new_version.into(),
            overall: OverallStatus::Error,
            detail: detail.into(),
            criteria: Vec::new(),
            old_artifact: None,
            new_artifact: None,
            log_file: None,
            timestamp: now_stamp(),
        }
    }
}

fn now_stamp() -> String {
    chrono::Local::now().format("%Y/%m/%d %H:%M:%S").to_string()
}
