//! Comparison strategy interface and the byte-equality fallback.

use crate::comparison::types::{ComparisonCriterion, CriterionStatus};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Criteria plus the one-line narrative that ends up in the verdict detail
/// column of the report.
#[derive(Debug, Clone)]
pub struct ComparisonOutcome {
    pub criteria: Vec<ComparisonCriterion>,
    pub detail: String,
}

/// Polymorphic comparison strategy: custom code, declarative config, or the
/// default byte-equality fallback. Implementations must tolerate a missing
/// artifact or log on either side by emitting an N/A criterion instead of
/// failing.
pub trait ComparatorStrategy {
    fn name(&self) -> &str;

    fn compare_artifacts(
        &self,
        old: Option<&Path>,
        new: Option<&Path>,
    ) -> Vec<ComparisonCriterion>;

    fn compare_logs(&self, old: Option<&Path>, new: Option<&Path>) -> Vec<ComparisonCriterion>;

    /// Full artifact+log pass. Strategies with a richer narrative override
    /// this; the default summarizes the failed criteria.
    fn compare(
        &self,
        old_artifact: Option<&Path>,
        new_artifact: Option<&Path>,
        old_log: Option<&Path>,
        new_log: Option<&Path>,
    ) -> ComparisonOutcome {
        let mut criteria = self.compare_artifacts(old_artifact, new_artifact);
        criteria.extend(self.compare_logs(old_log, new_log));
        let detail = summarize(&criteria);
        ComparisonOutcome { criteria, detail }
    }
}

/// Default detail line: the failed criteria, or a fixed all-clear phrase.
pub(crate) fn summarize(criteria: &[ComparisonCriterion]) -> String {
    let failed: Vec<&str> = criteria
        .iter()
        .filter(|c| c.status == CriterionStatus::Failed)
        .map(|c| c.description.as_str())
        .collect();
    if failed.is_empty() {
        "有意な差分はありません".to_string()
    } else {
        failed.join(", ")
    }
}

/// Resolve both sides to file contents, or produce the N/A criterion for
/// whichever side is missing. Reads are lossy so odd encodings in tool
/// output cannot abort a comparison.
pub(crate) fn read_both(
    old: Option<&Path>,
    new: Option<&Path>,
    missing_name: &str,
    missing_reason: &str,
) -> Result<(String, String), ComparisonCriterion> {
    let old = old.filter(|p| p.exists());
    let new = new.filter(|p| p.exists());
    match (old, new) {
        (Some(old), Some(new)) => Ok((read_lossy(old), read_lossy(new))),
        _ => Err(ComparisonCriterion::not_applicable(
            missing_name,
            missing_reason,
        )),
    }
}

pub(crate) fn read_lossy(path: &Path) -> String {
    match fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            log::warn!("could not read {}: {e}", path.display());
            String::new()
        }
    }
}

/// Count of lines added plus lines removed between two texts, computed as a
/// multiset difference. This matches how the report consumes diff volume (a
/// magnitude, not a patch).
pub(crate) fn count_changed_lines(old: &str, new: &str) -> usize {
    let mut counts: HashMap<&str, i64> = HashMap::new();
    for line in old.lines() {
        *counts.entry(line).or_insert(0) += 1;
    }
    for line in new.lines() {
        *counts.entry(line).or_insert(0) -= 1;
    }
    counts.values().map(|c| c.unsigned_abs() as usize).sum()
}

/// Fallback strategy: plain content equality, used when no code comparator
/// and no config exists for a tool.
pub struct DefaultComparator;

impl ComparatorStrategy for DefaultComparator {
    fn name(&self) -> &str {
        "default"
    }

    fn compare_artifacts(
        &self,
        old: Option<&Path>,
        new: Option<&Path>,
    ) -> Vec<ComparisonCriterion> {
        let (old_content, new_content) =
            match read_both(old, new, "成果物一致", "成果物なし") {
                Ok(contents) => contents,
                Err(criterion) => return vec![criterion],
            };

        if old_content == new_content {
            vec![ComparisonCriterion::new(
                "成果物一致",
                CriterionStatus::Success,
                "旧バージョンと新バージョンの成果物が完全に一致しています",
            )]
        } else {
            let changed = count_changed_lines(&old_content, &new_content);
            vec![ComparisonCriterion::new(
                "成果物差分",
                CriterionStatus::Failed,
                format!("旧バージョンと新バージョンの成果物が一致しません ({changed}行の差分)"),
            )]
        }
    }

    fn compare_logs(&self, old: Option<&Path>, new: Option<&Path>) -> Vec<ComparisonCriterion> {
        let (old_content, new_content) = match read_both(old, new, "ログ内容の一致", "ログなし")
        {
            Ok(contents) => contents,
            Err(criterion) => return vec![criterion],
        };

        // Missing or differing logs never fail the verdict on their own.
        let changed = count_changed_lines(&old_content, &new_content);
        if changed == 0 {
            vec![ComparisonCriterion::new(
                "ログ内容の一致",
                CriterionStatus::Success,
                "ログ内容が完全に一致しています",
            )]
        } else {
            vec![ComparisonCriterion::new(
                "ログ内容の差分",
                CriterionStatus::Success,
                format!("ログ内容の差分: {changed}行"),
            )]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn identical_artifacts_yield_single_success_criterion() {
        let dir = TempDir::new().unwrap();
        let old = write_file(&dir, "a.txt", "same\ncontent\n");
        let new = write_file(&dir, "b.txt", "same\ncontent\n");

        let criteria = DefaultComparator.compare_artifacts(Some(&old), Some(&new));
        assert_eq!(criteria.len(), 1);
        assert_eq!(criteria[0].name, "成果物一致");
        assert_eq!(criteria[0].status, CriterionStatus::Success);
    }

    #[test]
    fn differing_artifacts_fail_with_changed_line_count() {
        let dir = TempDir::new().unwrap();
        let old = write_file(&dir, "a.txt", "one\ntwo\n");
        let new = write_file(&dir, "b.txt", "one\nthree\n");

        let criteria = DefaultComparator.compare_artifacts(Some(&old), Some(&new));
        assert_eq!(criteria[0].status, CriterionStatus::Failed);
        assert!(criteria[0].description.contains("2行"));
    }

    #[test]
    fn missing_new_artifact_degrades_to_not_applicable() {
        let dir = TempDir::new().unwrap();
        let old = write_file(&dir, "a.txt", "content\n");
        let ghost = dir.path().join("missing.txt");

        let criteria = DefaultComparator.compare_artifacts(Some(&old), Some(&ghost));
        assert_eq!(criteria.len(), 1);
        assert_eq!(criteria[0].status, CriterionStatus::NotApplicable);
    }

    #[test]
    fn missing_logs_never_fail() {
        let criteria = DefaultComparator.compare_logs(None, None);
        assert_eq!(criteria[0].status, CriterionStatus::NotApplicable);
    }

    #[test]
    fn changed_line_count_is_a_multiset_difference() {
        assert_eq!(count_changed_lines("a\nb\n", "a\nb\n"), 0);
        assert_eq!(count_changed_lines("a\nb\n", "a\nc\n"), 2);
        assert_eq!(count_changed_lines("a\n", "a\na\n"), 1);
    }
}
