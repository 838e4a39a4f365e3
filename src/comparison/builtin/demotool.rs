//! Comparator for DemoTool, a batch tool whose report prints one
//! 処理時間 line per processed file. When both reports carry timings the
//! run is graded purely on performance (average and per-file improvement);
//! otherwise it falls back to the shared content grading.

use crate::comparison::builtin::{grade_artifacts, grade_logs_with};
use crate::comparison::diff_builder::{CriteriaSet, DiffBuilder};
use crate::comparison::strategy::{read_lossy, ComparatorStrategy, ComparisonOutcome};
use crate::comparison::types::ComparisonCriterion;
use crate::extraction::{ExtractedFields, FieldPair, FieldValue};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

pub struct DemoToolComparator;

static FILE_TIMING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"処理時間:\s*(\d+\.\d+)秒").expect("timing pattern must compile"));
static FAILURE_MARKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"失敗|エラー|異常").expect("failure pattern must compile"));
static LOG_ERROR_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)error|exception|fail|fault").expect("log error pattern must compile")
});

fn enrich(fields: &mut ExtractedFields, content: &str) {
    fields
        .values
        .insert("file_size_bytes".into(), FieldValue::Int(content.len() as i64));
    fields
        .values
        .entry("line_count".into())
        .or_insert(FieldValue::Int(content.lines().count() as i64));
    fields.values.insert(
        "success_count".into(),
        FieldValue::Int(content.matches("成功").count() as i64),
    );
    fields.values.insert(
        "failure_count".into(),
        FieldValue::Int(FAILURE_MARKS.find_iter(content).count() as i64),
    );
}

/// The log text keeps English tracebacks, so errors are counted by loose
/// keyword rather than the `[ERROR]` mark the other tools print.
fn log_enrich(fields: &mut ExtractedFields, content: &str) {
    fields.values.insert(
        "error_marks".into(),
        FieldValue::Int(LOG_ERROR_WORDS.find_iter(content).count() as i64),
    );
}

fn timings(content: &str) -> Vec<f64> {
    FILE_TIMING
        .captures_iter(content)
        .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
        .collect()
}

/// Grade the run on timing alone: the average over all per-file lines plus
/// one criterion for the per-file improvement rate.
fn performance_set(old_times: &[f64], new_times: &[f64]) -> CriteriaSet {
    let avg = |times: &[f64]| times.iter().sum::<f64>() / times.len() as f64;
    let mut fields = ExtractedFields {
        analysis_type: Some("performance".to_string()),
        ..Default::default()
    };
    fields.pairs.insert(
        "processing_time".into(),
        FieldPair {
            old: avg(old_times),
            new: avg(new_times),
        },
    );
    for (i, (old, new)) in old_times.iter().zip(new_times).enumerate() {
        fields.pairs.insert(
            format!("ファイル{} の処理時間", i + 1),
            FieldPair { old: *old, new: *new },
        );
    }
    DiffBuilder::artifacts().build_from_payload(&fields)
}

fn grade(old: Option<&Path>, new: Option<&Path>) -> CriteriaSet {
    if let (Some(old_path), Some(new_path)) = (
        old.filter(|p| p.exists()),
        new.filter(|p| p.exists()),
    ) {
        let old_times = timings(&read_lossy(old_path));
        let new_times = timings(&read_lossy(new_path));
        if !old_times.is_empty() && !new_times.is_empty() {
            return performance_set(&old_times, &new_times);
        }
    }
    grade_artifacts(old, new, enrich)
}

impl ComparatorStrategy for DemoToolComparator {
    fn name(&self) -> &str {
        "demotool"
    }

    fn compare_artifacts(
        &self,
        old: Option<&Path>,
        new: Option<&Path>,
    ) -> Vec<ComparisonCriterion> {
        grade(old, new).criteria
    }

    fn compare_logs(&self, old: Option<&Path>, new: Option<&Path>) -> Vec<ComparisonCriterion> {
        grade_logs_with(old, new, log_enrich).criteria
    }

    fn compare(
        &self,
        old_artifact: Option<&Path>,
        new_artifact: Option<&Path>,
        old_log: Option<&Path>,
        new_log: Option<&Path>,
    ) -> ComparisonOutcome {
        let artifacts = grade(old_artifact, new_artifact);
        let logs = grade_logs_with(old_log, new_log, log_enrich);

        let mut detail = artifacts.message;
        if logs.message != "有意な差分はありません" && logs.message != detail {
            detail = format!("{detail}, {}", logs.message);
        }

        let mut criteria = artifacts.criteria;
        criteria.extend(logs.criteria);
        ComparisonOutcome { criteria, detail }
    }
}
