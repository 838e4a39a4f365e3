//! Comparator for SampleTool, a text-statistics batch tool. Its artifact
//! prints 行数/文字数/単語数 blocks per input file; the comparison grades
//! file size, line totals, and the per-file success count.

use crate::comparison::builtin::{grade_artifacts, grade_logs};
use crate::comparison::strategy::{ComparatorStrategy, ComparisonOutcome};
use crate::comparison::types::ComparisonCriterion;
use crate::extraction::{ExtractedFields, FieldValue};
use std::path::Path;

pub struct SampleToolComparator;

fn enrich(fields: &mut ExtractedFields, content: &str) {
    fields
        .values
        .insert("file_size_bytes".into(), FieldValue::Int(content.len() as i64));
    fields
        .values
        .entry("line_count".into())
        .or_insert(FieldValue::Int(content.lines().count() as i64));
    // Every per-file block counts as one success; the tool has no partial
    // failure mode, so the failure counter is pinned at zero.
    if let Some(files) = fields.int("file_count") {
        fields
            .values
            .entry("success_count".into())
            .or_insert(FieldValue::Int(files));
    }
    // A printed error counter takes over as the failure counter downstream,
    // so only pin zero when the artifact is silent about errors.
    if fields.float("error_count").is_none() {
        fields
            .values
            .entry("failure_count".into())
            .or_insert(FieldValue::Int(0));
    }
}

impl ComparatorStrategy for SampleToolComparator {
    fn name(&self) -> &str {
        "sampletool"
    }

    fn compare_artifacts(
        &self,
        old: Option<&Path>,
        new: Option<&Path>,
    ) -> Vec<ComparisonCriterion> {
        grade_artifacts(old, new, enrich).criteria
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

        let mut detail = artifacts.message;
        if logs.message != "有意な差分はありません" && logs.message != detail {
            detail = format!("{detail}, {}", logs.message);
        }

        let mut criteria = artifacts.criteria;
        criteria.extend(logs.criteria);
        ComparisonOutcome { criteria, detail }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::types::CriterionStatus;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn find<'a>(criteria: &'a [ComparisonCriterion], name: &str) -> &'a ComparisonCriterion {
        criteria
            .iter()
            .find(|c| c.name == name)
            .unwrap_or_else(|| panic!("criterion {name} not emitted"))
    }

    fn report(lines: usize, chars: usize) -> String {
        format!(
            "alpha.txt の処理結果:\n  行数: {lines}\n  文字数: {chars}\n  単語数: 40\n"
        )
    }

    #[test]
    fn growing_line_count_within_size_tolerance_passes() {
        let dir = TempDir::new().unwrap();
        let old = write(&dir, "old.txt", &report(100, 500));
        let new = write(&dir, "new.txt", &report(120, 600));

        let criteria = SampleToolComparator.compare_artifacts(Some(&old), Some(&new));
        assert_eq!(find(&criteria, "行数の変化").status, CriterionStatus::Success);
        assert_eq!(
            find(&criteria, "ファイルサイズの変化").status,
            CriterionStatus::Success
        );
        assert!(criteria.iter().all(|c| c.status != CriterionStatus::Failed));
    }

    #[test]
    fn identical_artifacts_take_the_identity_path() {
        let dir = TempDir::new().unwrap();
        let content = report(100, 500);
        let old = write(&dir, "old.txt", &content);
        let new = write(&dir, "new.txt", &content);

        let criteria = SampleToolComparator.compare_artifacts(Some(&old), Some(&new));
        assert_eq!(find(&criteria, "成果物一致").status, CriterionStatus::Success);
    }

    #[test]
    fn error_count_regression_in_artifact_fails() {
        let dir = TempDir::new().unwrap();
        let old = write(&dir, "old.txt", &format!("{}error_count: 0\n", report(100, 500)));
        let new = write(&dir, "new.txt", &format!("{}error_count: 3\n", report(100, 500)));

        let criteria = SampleToolComparator.compare_artifacts(Some(&old), Some(&new));
        assert_eq!(
            find(&criteria, "エラー/失敗数の変化").status,
            CriterionStatus::Failed
        );
    }

    #[test]
    fn log_error_resolution_is_narrated() {
        let dir = TempDir::new().unwrap();
        let old = write(
            &dir,
            "old.log",
            "[ERROR] boom\n[ERROR] bang\n処理時間: 2.0秒\n",
        );
        let new = write(&dir, "new.log", "all clear\n処理時間: 1.0秒\n");

        let criteria = SampleToolComparator.compare_logs(Some(&old), Some(&new));
        assert_eq!(find(&criteria, "エラー数の変化").status, CriterionStatus::Success);
        assert_eq!(find(&criteria, "エラー解消").status, CriterionStatus::Success);
        assert_eq!(find(&criteria, "処理時間").status, CriterionStatus::Success);
    }

    #[test]
    fn missing_new_artifact_is_not_applicable() {
        let dir = TempDir::new().unwrap();
        let old = write(&dir, "old.txt", &report(100, 500));
        let ghost = dir.path().join("missing.txt");

        let criteria = SampleToolComparator.compare_artifacts(Some(&old), Some(&ghost));
        assert_eq!(criteria.len(), 1);
        assert_eq!(criteria[0].status, CriterionStatus::NotApplicable);
    }
}
