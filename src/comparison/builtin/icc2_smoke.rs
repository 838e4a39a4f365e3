//! Comparator for the ICC2 smoke-run flow. The artifact is a place-and-route
//! summary; the comparison grades timing violations, processed file counts, memory
//! use, and run time, and checks that the design inputs themselves did not
//! drift between the two runs.

use crate::comparison::builtin::{grade_artifacts, grade_logs};
use crate::comparison::strategy::{ComparatorStrategy, ComparisonOutcome};
use crate::comparison::types::{ComparisonCriterion, CriterionStatus};
use crate::extraction::{extract, ExtractedFields, FieldValue};
use crate::comparison::strategy::read_lossy;
use std::path::Path;

pub struct Icc2SmokeComparator;

fn enrich(fields: &mut ExtractedFields, content: &str) {
    fields
        .values
        .insert("file_size_bytes".into(), FieldValue::Int(content.len() as i64));
}

/// The design inputs (RTL modules, constraints, library cells) must be the
/// same in both runs, otherwise the QoR numbers are not comparable.
fn design_data_criterion(old: &ExtractedFields, new: &ExtractedFields) -> Option<ComparisonCriterion> {
    let counters = [
        ("rtl_modules", "RTLモジュール数"),
        ("constraints", "制約数"),
        ("tech_cells", "テクノロジセル数"),
    ];

    let mut seen = false;
    let mut mismatches = Vec::new();
    for (field, label) in counters {
        if let (Some(o), Some(n)) = (old.int(field), new.int(field)) {
            seen = true;
            if o != n {
                mismatches.push(format!("{label}: {o} → {n}"));
            }
        }
    }
    if !seen {
        return None;
    }

    Some(if mismatches.is_empty() {
        ComparisonCriterion::new(
            "設計データ一致",
            CriterionStatus::Success,
            "両バージョンで同一の設計データを使用",
        )
    } else {
        ComparisonCriterion::new(
            "設計データ一致",
            CriterionStatus::Failed,
            format!("設計データが一致しません ({})", mismatches.join(", ")),
        )
    })
}

fn extract_side(path: Option<&Path>) -> Option<ExtractedFields> {
    let path = path.filter(|p| p.exists())?;
    Some(extract(&read_lossy(path)))
}

impl ComparatorStrategy for Icc2SmokeComparator {
    fn name(&self) -> &str {
        "icc2_smoke"
    }

    fn compare_artifacts(
        &self,
        old: Option<&Path>,
        new: Option<&Path>,
    ) -> Vec<ComparisonCriterion> {
        let mut criteria = grade_artifacts(old, new, enrich).criteria;
        if let (Some(old_fields), Some(new_fields)) = (extract_side(old), extract_side(new)) {
            if let Some(criterion) = design_data_criterion(&old_fields, &new_fields) {
                criteria.insert(0, criterion);
            }
        }
        criteria
    }

    fn compare_logs(&self, old: Option<&Path>, new: Option<&Path>) -> Vec<ComparisonCriterion> {
        grade_logs(old, new).criteria
    }

    fn compare(
        &self,
        old_artifact: Option<&Path>,
        new_artifact: Option<&Path>,
        old_log: Option<&Path>,
        new_log: Option<&Path>,
    ) -> ComparisonOutcome {
        let artifacts = grade_artifacts(old_artifact, new_artifact, enrich);
        let logs = grade_logs(old_log, new_log);

        let mut criteria = Vec::new();
        if let (Some(old_fields), Some(new_fields)) =
            (extract_side(old_artifact), extract_side(new_artifact))
        {
            if let Some(criterion) = design_data_criterion(&old_fields, &new_fields) {
                criteria.push(criterion);
            }
        }

        let mut detail = artifacts.message;
        if logs.message != "有意な差分はありません" && logs.message != detail {
            detail = format!("{detail}, {}", logs.message);
        }

        criteria.extend(artifacts.criteria);
        criteria.extend(logs.criteria);
        ComparisonOutcome { criteria, detail }
    }
}
