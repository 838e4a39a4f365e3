//! Error taxonomy for the verification harness.
//!
//! Only `ReportWrite` is allowed to surface at the I/O boundary; everything
//! else is caught inside the per-tool pipeline and narrowed into either a
//! criterion status or an `Error` verdict, so the batch driver always sees a
//! completed verdict per tool.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    /// Missing executable or non-zero exit for one version. Fatal for that
    /// tool's comparison, recoverable for the batch.
    #[error("failed to execute {tool} {version}: {message}")]
    Execution {
        tool: String,
        version: String,
        message: String,
    },

    /// Malformed embedded payload. Extraction degrades to plain-text
    /// heuristics instead of aborting the comparison.
    #[error("embedded payload could not be parsed: {0}")]
    Extraction(String),

    /// Downgrades artifact-dependent criteria to N/A.
    #[error("artifact not found for {tool} {version} under {dir}")]
    MissingArtifact {
        tool: String,
        version: String,
        dir: PathBuf,
    },

    /// Downgrades log-dependent criteria to N/A.
    #[error("log not found for {tool} {version} under {dir}")]
    MissingLog {
        tool: String,
        version: String,
        dir: PathBuf,
    },

    #[error("invalid comparator config {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("failed to write report {path}")]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
