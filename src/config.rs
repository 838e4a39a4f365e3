//! Declarative comparator configuration.
//!
//! A tool can be compared without any code by dropping a YAML/JSON config
//! into one of the candidate directories. The config declares how to run
//! the tool and which comparison methods to apply, with per-method
//! tolerances under `verification_criteria`.

use crate::errors::HarnessError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComparatorConfig {
    /// Command template for running one version. `{version}`, `{tool}`,
    /// `{input_dir}` and `{output_dir}` placeholders are substituted.
    #[serde(default)]
    pub execute_command: Option<String>,
    #[serde(default)]
    pub old_artifact_pattern: Option<String>,
    #[serde(default)]
    pub new_artifact_pattern: Option<String>,
    #[serde(default)]
    pub input_files: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub comparison_methods: ComparisonMethods,
    #[serde(default)]
    pub verification_criteria: VerificationCriteria,
}

/// Enabled comparison methods. A disabled method emits no criterion at all
/// rather than an N/A one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComparisonMethods {
    #[serde(default)]
    pub format_check: bool,
    #[serde(default)]
    pub line_count: bool,
    #[serde(default)]
    pub content_diff: bool,
    #[serde(default)]
    pub keyword_check: Vec<String>,
    #[serde(default)]
    pub custom_patterns: Vec<CustomPattern>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomPattern {
    #[serde(default)]
    pub name: Option<String>,
    pub pattern: String,
}

impl CustomPattern {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.pattern)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationCriteria {
    #[serde(default)]
    pub format: FormatCriteria,
    #[serde(default)]
    pub precision: PrecisionCriteria,
    #[serde(default)]
    pub performance: PerformanceCriteria,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormatCriteria {
    #[serde(default)]
    pub allowed_changes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrecisionCriteria {
    #[serde(default = "default_precision_tolerance")]
    pub tolerance_percent: f64,
}

impl Default for PrecisionCriteria {
    fn default() -> Self {
        Self {
            tolerance_percent: default_precision_tolerance(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceCriteria {
    #[serde(default = "default_performance_tolerance")]
    pub tolerance_percent: f64,
}

impl Default for PerformanceCriteria {
    fn default() -> Self {
        Self {
            tolerance_percent: default_performance_tolerance(),
        }
    }
}

fn default_precision_tolerance() -> f64 {
    1.0
}

fn default_performance_tolerance() -> f64 {
    10.0
}

/// Candidate config locations for a tool, in resolution order. The first
/// existing file wins.
pub fn candidate_config_paths(base_dir: &Path, tool_name: &str) -> Vec<PathBuf> {
    let stem = tool_name.to_lowercase();
    let mut candidates = Vec::new();
    for dir in ["comparators/configs", "configs"] {
        for ext in ["yaml", "yml", "json"] {
            candidates.push(base_dir.join(dir).join(format!("{stem}.{ext}")));
        }
    }
    candidates
}

/// Read and parse a comparator config. The format is chosen by extension;
/// anything that is not JSON parses as YAML.
pub fn load_comparator_config(path: &Path) -> Result<ComparatorConfig, HarnessError> {
    let contents = fs::read_to_string(path).map_err(|e| HarnessError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_comparator_config(path, &contents)
}

fn parse_comparator_config(
    path: &Path,
    contents: &str,
) -> Result<ComparatorConfig, HarnessError> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(contents).map_err(|e| HarnessError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    } else {
        serde_yaml::from_str(contents).map_err(|e| HarnessError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn yaml_config_parses_methods_and_criteria() {
        let yaml = indoc! {"
            execute_command: python tools/{tool}/{version}/main.py
            comparison_methods:
              format_check: true
              content_diff: true
              keyword_check:
                - 完了
                - サマリー
              custom_patterns:
                - name: warn-lines
                  pattern: '\\[WARNING\\]'
            verification_criteria:
              precision:
                tolerance_percent: 2.5
        "};
        let config =
            parse_comparator_config(Path::new("sampletool.yaml"), yaml).unwrap();
        assert!(config.comparison_methods.format_check);
        assert!(!config.comparison_methods.line_count);
        assert_eq!(config.comparison_methods.keyword_check.len(), 2);
        assert_eq!(
            config.comparison_methods.custom_patterns[0].display_name(),
            "warn-lines"
        );
        assert_eq!(config.verification_criteria.precision.tolerance_percent, 2.5);
        // Untouched sections keep their defaults.
        assert_eq!(
            config.verification_criteria.performance.tolerance_percent,
            10.0
        );
    }

    #[test]
    fn json_config_parses() {
        let json = r#"{"comparison_methods": {"line_count": true}}"#;
        let config = parse_comparator_config(Path::new("demo.json"), json).unwrap();
        assert!(config.comparison_methods.line_count);
    }

    #[test]
    fn invalid_config_is_a_config_error() {
        let err = parse_comparator_config(Path::new("x.yaml"), ": : :").unwrap_err();
        assert!(matches!(err, HarnessError::Config { .. }));
    }

    #[test]
    fn candidate_paths_follow_resolution_order() {
        let paths = candidate_config_paths(Path::new("/base"), "SampleTool");
        assert_eq!(paths.len(), 6);
        assert_eq!(
            paths[0],
            Path::new("/base/comparators/configs/sampletool.yaml")
        );
        assert_eq!(paths[5], Path::new("/base/configs/sampletool.json"));
    }
}
