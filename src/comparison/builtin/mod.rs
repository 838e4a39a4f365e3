//! Code comparators shipped with the harness, keyed by tool name.

pub mod demotool;
pub mod icc2_smoke;
pub mod sampletool;

pub use demotool::DemoToolComparator;
pub use icc2_smoke::Icc2SmokeComparator;
pub use sampletool::SampleToolComparator;

use crate::comparison::diff_builder::{CriteriaSet, DiffBuilder};
use crate::comparison::strategy::{count_changed_lines, read_lossy};
use crate::comparison::types::ComparisonCriterion;
use crate::extraction::{extract, ExtractedFields, FieldValue};
use std::path::Path;

/// Extract both artifacts, enrich each side with facts only the harness can
/// see (byte sizes, changed-line counts), and grade the transition. An
/// embedded payload on either side short-circuits the enrichment; identical
/// contents short-circuit to the identity verdict.
pub(crate) fn grade_artifacts(
    old: Option<&Path>,
    new: Option<&Path>,
    enrich: impl Fn(&mut ExtractedFields, &str),
) -> CriteriaSet {
    let old = old.filter(|p| p.exists());
    let new = new.filter(|p| p.exists());
    let (Some(old_path), Some(new_path)) = (old, new) else {
        return missing(ComparisonCriterion::not_applicable("成果物一致", "成果物なし"));
    };

    let old_content = read_lossy(old_path);
    let new_content = read_lossy(new_path);
    let mut old_fields = extract(&old_content);
    let mut new_fields = extract(&new_content);
    let builder = DiffBuilder::artifacts();

    if old_fields.from_payload || new_fields.from_payload {
        return builder.build(&old_fields, &new_fields);
    }

    enrich(&mut old_fields, &old_content);
    enrich(&mut new_fields, &new_content);

    if old_content == new_content {
        let mut fields = new_fields;
        fields.analysis_type = Some("no_differences".to_string());
        fields
            .values
            .entry("failure_count".into())
            .or_insert(FieldValue::Int(0));
        return builder.build_from_payload(&fields);
    }

    let diff = count_changed_lines(&old_content, &new_content);
    new_fields
        .values
        .entry("diff_lines".into())
        .or_insert(FieldValue::Int(diff as i64));

    builder.build(&old_fields, &new_fields)
}

/// Grade the two run logs: line counts and diff volume from the harness,
/// timing and error marks from the log text itself.
pub(crate) fn grade_logs(old: Option<&Path>, new: Option<&Path>) -> CriteriaSet {
    grade_logs_with(old, new, |_, _| {})
}

/// [`grade_logs`] with a per-side hook for comparators that read their own
/// error or timing facts out of the log text.
pub(crate) fn grade_logs_with(
    old: Option<&Path>,
    new: Option<&Path>,
    enrich: impl Fn(&mut ExtractedFields, &str),
) -> CriteriaSet {
    let old = old.filter(|p| p.exists());
    let new = new.filter(|p| p.exists());
    let (Some(old_path), Some(new_path)) = (old, new) else {
        return missing(ComparisonCriterion::not_applicable("ログ内容の一致", "ログなし"));
    };

    let old_content = read_lossy(old_path);
    let new_content = read_lossy(new_path);
    let mut old_fields = extract(&old_content);
    let mut new_fields = extract(&new_content);
    enrich(&mut old_fields, &old_content);
    enrich(&mut new_fields, &new_content);

    let old_lines = old_content.lines().count();
    let new_lines = new_content.lines().count();
    let diff = count_changed_lines(&old_content, &new_content);
    new_fields
        .values
        .insert("old_log_lines".into(), FieldValue::Int(old_lines as i64));
    new_fields
        .values
        .insert("new_log_lines".into(), FieldValue::Int(new_lines as i64));
    new_fields
        .values
        .insert("diff_lines".into(), FieldValue::Int(diff as i64));

    let mut set = DiffBuilder::logs().build(&old_fields, &new_fields);
    if diff == 0 {
        set.criteria
            .push(DiffBuilder::log_content_criterion(0, old_lines));
    }
    set
}

fn missing(criterion: ComparisonCriterion) -> CriteriaSet {
    let message = criterion.description.clone();
    CriteriaSet {
        criteria: vec![criterion],
        message,
    }
}
