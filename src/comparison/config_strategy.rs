//! Config-driven comparison strategy.
//!
//! Interprets a [`ComparatorConfig`]: each enabled comparison method maps to
//! one or more criteria, disabled methods are omitted entirely. Tolerances
//! from `verification_criteria` surface in the criterion descriptions so the
//! report shows what each judgment was held against.

use crate::comparison::strategy::{count_changed_lines, read_lossy, ComparatorStrategy};
use crate::comparison::types::{ComparisonCriterion, CriterionStatus};
use crate::config::ComparatorConfig;
use regex::Regex;
use std::path::Path;

pub struct ConfigComparator {
    tool_name: String,
    config: ComparatorConfig,
}

impl ConfigComparator {
    pub fn new(tool_name: impl Into<String>, config: ComparatorConfig) -> Self {
        Self {
            tool_name: tool_name.into(),
            config,
        }
    }

    pub fn config(&self) -> &ComparatorConfig {
        &self.config
    }

    fn not_applicable_criteria(&self) -> Vec<ComparisonCriterion> {
        let methods = &self.config.comparison_methods;
        let mut criteria = Vec::new();
        if methods.format_check || methods.line_count {
            criteria.push(ComparisonCriterion::not_applicable(
                "出力フォーマット検証",
                "成果物なし",
            ));
        }
        if methods.content_diff {
            criteria.push(ComparisonCriterion::not_applicable(
                "計算結果精度検証",
                "成果物なし",
            ));
        }
        if !methods.keyword_check.is_empty() {
            criteria.push(ComparisonCriterion::not_applicable(
                "サマリー情報検証",
                "成果物なし",
            ));
        }
        if !methods.custom_patterns.is_empty() {
            criteria.push(ComparisonCriterion::not_applicable(
                "カスタムパターン検証",
                "成果物なし",
            ));
        }
        criteria
    }

    fn check_format(
        &self,
        old_path: &Path,
        new_path: &Path,
        old_content: &str,
        new_content: &str,
        line_count: bool,
    ) -> ComparisonCriterion {
        let allowed = self.config.verification_criteria.format.allowed_changes;
        let tolerance_note = format!("許容変更: {}", if allowed { "あり" } else { "なし" });

        let old_ext = old_path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let new_ext = new_path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if old_ext != new_ext {
            return ComparisonCriterion::new(
                "出力フォーマット検証",
                CriterionStatus::Failed,
                format!("ファイル形式の変更: .{old_ext} → .{new_ext} ({tolerance_note})"),
            );
        }

        // A size swing above half the original is treated as a format change.
        let old_size = old_content.len();
        let new_size = new_content.len();
        if old_size > 0 {
            let diff_percent = (new_size as f64 - old_size as f64).abs() * 100.0 / old_size as f64;
            if diff_percent > 50.0 {
                return ComparisonCriterion::new(
                    "出力フォーマット検証",
                    CriterionStatus::Failed,
                    format!(
                        "ファイルサイズの大幅な変更: {old_size} → {new_size} バイト ({diff_percent:.1}%)"
                    ),
                );
            }
        }

        if line_count {
            let old_lines = old_content.lines().count();
            let new_lines = new_content.lines().count();
            if old_lines != new_lines {
                return ComparisonCriterion::new(
                    "出力フォーマット検証",
                    CriterionStatus::Failed,
                    format!("行数の変更: {old_lines} → {new_lines} ({tolerance_note})"),
                );
            }
        }

        ComparisonCriterion::new(
            "出力フォーマット検証",
            CriterionStatus::Success,
            format!("差異なし ({tolerance_note})"),
        )
    }

    fn check_content_diff(&self, old_content: &str, new_content: &str) -> ComparisonCriterion {
        let tolerance = self.config.verification_criteria.precision.tolerance_percent;
        let tolerance_note = format!("許容誤差: {tolerance}%");
        let changed = count_changed_lines(old_content, new_content);
        if changed > 0 {
            ComparisonCriterion::new(
                "計算結果精度検証",
                CriterionStatus::Failed,
                format!("内容の変更: {changed}行 ({tolerance_note})"),
            )
        } else {
            ComparisonCriterion::new(
                "計算結果精度検証",
                CriterionStatus::Success,
                format!("期待通り ({tolerance_note})"),
            )
        }
    }

    fn check_keywords(&self, old_content: &str, new_content: &str) -> ComparisonCriterion {
        let keywords = &self.config.comparison_methods.keyword_check;
        let shown: Vec<&str> = keywords.iter().take(3).map(String::as_str).collect();
        let summary_note = format!(
            "確認キーワード: {}{}",
            shown.join(", "),
            if keywords.len() > 3 { "..." } else { "" }
        );

        let mut issues = Vec::new();
        for keyword in keywords {
            let old_count = old_content.matches(keyword.as_str()).count();
            let new_count = new_content.matches(keyword.as_str()).count();
            if old_count != new_count {
                issues.push(format!(
                    "キーワード '{keyword}' の出現回数変更: {old_count} → {new_count}"
                ));
            }
        }

        if issues.is_empty() {
            ComparisonCriterion::new(
                "サマリー情報検証",
                CriterionStatus::Success,
                summary_note,
            )
        } else {
            ComparisonCriterion::new(
                "サマリー情報検証",
                CriterionStatus::Failed,
                format!("{} ({summary_note})", issues.join("; ")),
            )
        }
    }

    fn check_custom_patterns(
        &self,
        old_content: &str,
        new_content: &str,
    ) -> Vec<ComparisonCriterion> {
        let mut criteria = Vec::new();
        for pattern in &self.config.comparison_methods.custom_patterns {
            let name = format!("カスタムパターン検証 ({})", pattern.display_name());
            let regex = match Regex::new(&pattern.pattern) {
                Ok(regex) => regex,
                Err(e) => {
                    criteria.push(ComparisonCriterion::new(
                        name,
                        CriterionStatus::Failed,
                        format!("正規表現エラー: {e}"),
                    ));
                    continue;
                }
            };
            let old_count = regex.find_iter(old_content).count();
            let new_count = regex.find_iter(new_content).count();
            let (status, description) = if old_count == new_count {
                (
                    CriterionStatus::Success,
                    format!("一致回数: {old_count} (変化なし)"),
                )
            } else {
                (
                    CriterionStatus::Failed,
                    format!("一致回数変更: {old_count} → {new_count}"),
                )
            };
            criteria.push(ComparisonCriterion::new(name, status, description));
        }
        criteria
    }
}

impl ComparatorStrategy for ConfigComparator {
    fn name(&self) -> &str {
        &self.tool_name
    }

    fn compare_artifacts(
        &self,
        old: Option<&Path>,
        new: Option<&Path>,
    ) -> Vec<ComparisonCriterion> {
        let old = old.filter(|p| p.exists());
        let new = new.filter(|p| p.exists());
        let (Some(old_path), Some(new_path)) = (old, new) else {
            log::info!(
                "{}: artifacts are missing, artifact checks are not evaluated",
                self.tool_name
            );
            return self.not_applicable_criteria();
        };

        let old_content = read_lossy(old_path);
        let new_content = read_lossy(new_path);
        let methods = &self.config.comparison_methods;
        let mut criteria = Vec::new();

        if methods.format_check || methods.line_count {
            criteria.push(self.check_format(
                old_path,
                new_path,
                &old_content,
                &new_content,
                methods.line_count,
            ));
        }
        if methods.content_diff {
            criteria.push(self.check_content_diff(&old_content, &new_content));
        }
        if !methods.keyword_check.is_empty() {
            criteria.push(self.check_keywords(&old_content, &new_content));
        }
        criteria.extend(self.check_custom_patterns(&old_content, &new_content));

        criteria
    }

    fn compare_logs(&self, _old: Option<&Path>, new: Option<&Path>) -> Vec<ComparisonCriterion> {
        let Some(new_log) = new.filter(|p| p.exists()) else {
            return vec![ComparisonCriterion::not_applicable(
                "警告・エラー解析",
                "ログなし",
            )];
        };

        let content = read_lossy(new_log);
        let has_problems = content.contains("エラー")
            || content.contains("警告")
            || content.contains("[ERROR]")
            || content.contains("[WARNING]");
        if has_problems {
            vec![ComparisonCriterion::new(
                "警告・エラー解析",
                CriterionStatus::Failed,
                "警告/エラーメッセージあり",
            )]
        } else {
            vec![ComparisonCriterion::new(
                "警告・エラー解析",
                CriterionStatus::Success,
                "警告/エラーメッセージなし",
            )]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ComparisonMethods, CustomPattern};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn comparator(methods: ComparisonMethods) -> ConfigComparator {
        ConfigComparator::new(
            "demotool",
            ComparatorConfig {
                comparison_methods: methods,
                ..Default::default()
            },
        )
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn disabled_methods_emit_no_criteria() {
        let dir = TempDir::new().unwrap();
        let old = write(&dir, "a.txt", "x\n");
        let new = write(&dir, "b.txt", "x\n");
        let criteria =
            comparator(ComparisonMethods::default()).compare_artifacts(Some(&old), Some(&new));
        assert!(criteria.is_empty());
    }

    #[test]
    fn missing_artifacts_mark_enabled_methods_not_applicable() {
        let criteria = comparator(ComparisonMethods {
            format_check: true,
            content_diff: true,
            ..Default::default()
        })
        .compare_artifacts(None, None);
        assert_eq!(criteria.len(), 2);
        assert!(criteria
            .iter()
            .all(|c| c.status == CriterionStatus::NotApplicable));
    }

    #[test]
    fn format_check_flags_large_size_swing() {
        let dir = TempDir::new().unwrap();
        let old = write(&dir, "a.txt", "short\n");
        let new = write(&dir, "b.txt", &"long line\n".repeat(40));
        let criteria = comparator(ComparisonMethods {
            format_check: true,
            ..Default::default()
        })
        .compare_artifacts(Some(&old), Some(&new));
        assert_eq!(criteria[0].status, CriterionStatus::Failed);
        assert!(criteria[0].description.contains("ファイルサイズの大幅な変更"));
    }

    #[test]
    fn keyword_count_change_fails_summary_check() {
        let dir = TempDir::new().unwrap();
        let old = write(&dir, "a.txt", "完了 完了\n");
        let new = write(&dir, "b.txt", "完了\n");
        let criteria = comparator(ComparisonMethods {
            keyword_check: vec!["完了".into()],
            ..Default::default()
        })
        .compare_artifacts(Some(&old), Some(&new));
        assert_eq!(criteria[0].name, "サマリー情報検証");
        assert_eq!(criteria[0].status, CriterionStatus::Failed);
    }

    #[test]
    fn invalid_custom_pattern_is_a_failed_criterion_not_a_crash() {
        let dir = TempDir::new().unwrap();
        let old = write(&dir, "a.txt", "x\n");
        let new = write(&dir, "b.txt", "x\n");
        let criteria = comparator(ComparisonMethods {
            custom_patterns: vec![CustomPattern {
                name: Some("broken".into()),
                pattern: "([".into(),
            }],
            ..Default::default()
        })
        .compare_artifacts(Some(&old), Some(&new));
        assert_eq!(criteria[0].status, CriterionStatus::Failed);
        assert!(criteria[0].description.contains("正規表現エラー"));
    }

    #[test]
    fn new_log_with_error_markers_fails_log_analysis() {
        let dir = TempDir::new().unwrap();
        let log = write(&dir, "new.log", "[ERROR] something broke\n");
        let criteria = comparator(ComparisonMethods::default()).compare_logs(None, Some(&log));
        assert_eq!(criteria[0].status, CriterionStatus::Failed);
    }
}
