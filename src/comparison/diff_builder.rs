//! Structured diff grading.
//!
//! Folds two extracted field sets (or one embedded payload) into an ordered
//! list of graded criteria plus a narrative message. The threshold rules
//! here are the core business logic and must stay reproducible: every
//! emitted criterion is derived from a fixed rule over well-defined inputs,
//! and a field absent on either side skips its criterion entirely.

use crate::comparison::types::{ComparisonCriterion, CriterionStatus};
use crate::extraction::{ExtractedFields, FieldPair};

/// Fixed emission order. Insertion order is significant for report
/// readability, so pair grading always walks this list.
const PAIR_ORDER: &[&str] = &[
    "file_size",
    "line_count",
    "success_count",
    "failure_count",
    "processing_time",
    "errors",
    "timing_violations",
    "memory_usage",
    "processed_files",
];

/// Graded criteria plus the comma-joined narrative of notable clauses.
#[derive(Debug, Clone, Default)]
pub struct CriteriaSet {
    pub criteria: Vec<ComparisonCriterion>,
    pub message: String,
}

impl CriteriaSet {
    pub fn has_failure(&self) -> bool {
        self.criteria
            .iter()
            .any(|c| c.status == CriterionStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DiffBuilder {
    is_log: bool,
}

impl DiffBuilder {
    /// Builder for artifact comparisons.
    pub fn artifacts() -> Self {
        Self { is_log: false }
    }

    /// Builder for log comparisons; enables the log-specific error-count and
    /// diff-volume rules.
    pub fn logs() -> Self {
        Self { is_log: true }
    }

    /// Grade the old→new transition. When either side carries an embedded
    /// payload it wins over deriving pairs from the two sides.
    pub fn build(&self, old: &ExtractedFields, new: &ExtractedFields) -> CriteriaSet {
        if new.from_payload {
            return self.build_from_payload(new);
        }
        if old.from_payload {
            return self.build_from_payload(old);
        }

        let mut pairs = ExtractedFields::default();
        for (name, source) in [
            ("file_size", "file_size_bytes"),
            ("line_count", "line_count"),
            ("success_count", "success_count"),
            ("failure_count", "failure_count"),
            ("processing_time", "processing_time_seconds"),
            ("timing_violations", "timing_violations"),
            ("memory_usage", "memory_usage_mb"),
            ("processed_files", "processed_files"),
        ] {
            if let (Some(o), Some(n)) = (old.float(source), new.float(source)) {
                pairs.pairs.insert(name.into(), FieldPair { old: o, new: n });
            }
        }
        // A labeled error counter counts as a failure counter when no
        // explicit failure_count is printed.
        if !pairs.pairs.contains_key("failure_count") {
            if let (Some(o), Some(n)) = (old.float("error_count"), new.float("error_count")) {
                pairs
                    .pairs
                    .insert("failure_count".into(), FieldPair { old: o, new: n });
            }
        }
        if self.is_log {
            if let (Some(o), Some(n)) = (old.float("error_marks"), new.float("error_marks")) {
                pairs
                    .pairs
                    .entry("errors".into())
                    .or_insert(FieldPair { old: o, new: n });
            }
        }

        // Transition-level facts the tool prints itself (per-file timing
        // lines, diff summaries, log line counts) ride along; the new side
        // wins when both printed them.
        for side in [old, new] {
            for (key, pair) in &side.pairs {
                pairs.pairs.insert(key.clone(), *pair);
            }
            for (key, value) in &side.values {
                pairs.values.insert(key.clone(), value.clone());
            }
        }

        self.grade(&pairs)
    }

    /// Grade a single field set carrying an embedded payload.
    pub fn build_from_payload(&self, fields: &ExtractedFields) -> CriteriaSet {
        if fields.analysis_type.as_deref() == Some("no_differences") {
            return self.identical_artifacts(fields);
        }
        self.grade(fields)
    }

    fn grade(&self, fields: &ExtractedFields) -> CriteriaSet {
        let mut set = CriteriaSet::default();
        let mut clauses: Vec<String> = Vec::new();

        for name in PAIR_ORDER {
            let Some(pair) = fields.pair(name) else { continue };
            match *name {
                "file_size" => set.criteria.push(grade_file_size(pair)),
                "line_count" => set.criteria.push(grade_line_count(pair)),
                "success_count" => set.criteria.push(grade_success_count(pair)),
                "failure_count" => {
                    let criterion = grade_failure_count(pair);
                    if pair.old != pair.new {
                        clauses.push(format!(
                            "エラー/失敗数: {} → {}",
                            pair.old as i64, pair.new as i64
                        ));
                    }
                    set.criteria.push(criterion);
                }
                "processing_time" => {
                    let (criterion, clause) = grade_timing(pair);
                    if let Some(clause) = clause {
                        clauses.push(clause);
                    }
                    set.criteria.push(criterion);
                    if let Some(improvement) = fields.float("improvement_percent") {
                        set.criteria.push(grade_improvement_rate(improvement));
                    }
                }
                "errors" => {
                    let mut emitted = grade_log_errors(pair);
                    if pair.old != pair.new {
                        clauses.push(format!(
                            "エラー数: {} → {}",
                            pair.old as i64, pair.new as i64
                        ));
                    }
                    set.criteria.append(&mut emitted);
                }
                "timing_violations" => {
                    let criterion = grade_timing_violations(pair);
                    if pair.new < pair.old {
                        clauses.push(format!(
                            "タイミング違反が{}件減少",
                            (pair.old - pair.new) as i64
                        ));
                    }
                    set.criteria.push(criterion);
                }
                "memory_usage" => {
                    if pair.old > 0.0 || pair.new > 0.0 {
                        let criterion = grade_memory_usage(pair);
                        if pair.new > pair.old {
                            clauses.push(format!(
                                "メモリ使用量が増加 ({}MB → {}MB)",
                                pair.old as i64, pair.new as i64
                            ));
                        }
                        set.criteria.push(criterion);
                    }
                }
                "processed_files" => set.criteria.push(grade_processed_files(pair)),
                _ => unreachable!("unknown pair name in PAIR_ORDER"),
            }
        }

        // Per-file timing pairs arrive keyed by their labels; grade them as
        // one criterion over the average improvement rate.
        let file_times: Vec<FieldPair> = fields
            .pairs
            .iter()
            .filter(|(key, _)| key.contains("処理時間") && !PAIR_ORDER.contains(&key.as_str()))
            .map(|(_, pair)| *pair)
            .collect();
        if !file_times.is_empty() {
            let avg_improvement = file_times
                .iter()
                .map(|p| if p.old > 0.0 { (p.old - p.new) / p.old * 100.0 } else { 0.0 })
                .sum::<f64>()
                / file_times.len() as f64;
            let status = if avg_improvement > 0.0 {
                CriterionStatus::Success
            } else {
                CriterionStatus::Failed
            };
            set.criteria.push(ComparisonCriterion::new(
                "個別ファイル処理時間",
                status,
                format!(
                    "平均改善率: {avg_improvement:.1}% ({}ファイル)",
                    file_times.len()
                ),
            ));
        }

        // Diff-line volume: informational for artifacts, graded for logs.
        if let Some(diff) = fields.int("diff_lines") {
            if diff > 0 {
                if self.is_log {
                    let old_lines = fields.int("old_log_lines").unwrap_or(0);
                    set.criteria
                        .push(Self::log_content_criterion(diff as usize, old_lines as usize));
                } else {
                    set.criteria.push(ComparisonCriterion::new(
                        "差分行数",
                        CriterionStatus::Success,
                        format!("{diff} 行の差分あり"),
                    ));
                }
            }
        }

        if self.is_log {
            if let (Some(old_lines), Some(new_lines)) =
                (fields.int("old_log_lines"), fields.int("new_log_lines"))
            {
                set.criteria.insert(
                    0,
                    ComparisonCriterion::new(
                        "ログサイズの変化",
                        CriterionStatus::Success,
                        format!("旧ログ: {old_lines}行 → 新ログ: {new_lines}行"),
                    ),
                );
            }
            // Printed summary counters only grade when the error marks
            // themselves did not already produce the criterion.
            if fields.pair("errors").is_none() {
                if let (Some(old_errors), Some(new_errors)) =
                    (fields.int("old_log_errors"), fields.int("new_log_errors"))
                {
                    let mut emitted = grade_log_errors(FieldPair {
                        old: old_errors as f64,
                        new: new_errors as f64,
                    });
                    set.criteria.append(&mut emitted);
                }
            }
        }

        set.message = if clauses.is_empty() {
            "有意な差分はありません".to_string()
        } else {
            clauses.join(", ")
        };
        set
    }

    fn identical_artifacts(&self, fields: &ExtractedFields) -> CriteriaSet {
        let mut set = CriteriaSet {
            criteria: vec![ComparisonCriterion::new(
                "成果物一致",
                CriterionStatus::Success,
                "旧バージョンと新バージョンの成果物が完全に一致しています",
            )],
            message: "成果物に差分なし".to_string(),
        };

        if let Some(success) = fields.int("success_count") {
            if success > 0 {
                set.criteria.push(ComparisonCriterion::new(
                    "成功件数",
                    CriterionStatus::Success,
                    format!("成功: {success} 件"),
                ));
            }
        }
        if let Some(failures) = fields.int("failure_count") {
            let (status, description) = if failures == 0 {
                (CriterionStatus::Success, "エラーや失敗はありません".to_string())
            } else {
                (CriterionStatus::Failed, format!("エラー/失敗: {failures} 件"))
            };
            set.criteria
                .push(ComparisonCriterion::new("エラー/失敗数", status, description));
        }
        set
    }

    /// Log-content difference rule: diff volume above half the old log's
    /// line count flips the criterion to Failed.
    pub fn log_content_criterion(diff_lines: usize, old_log_lines: usize) -> ComparisonCriterion {
        if diff_lines == 0 {
            return ComparisonCriterion::new(
                "ログ内容の一致",
                CriterionStatus::Success,
                "ログ内容が完全に一致しています",
            );
        }
        let diff_percent = if old_log_lines > 0 {
            diff_lines as f64 / old_log_lines as f64 * 100.0
        } else {
            0.0
        };
        if diff_percent > 50.0 {
            ComparisonCriterion::new(
                "ログ内容の差分",
                CriterionStatus::Failed,
                format!("ログ内容に大きな変化があります: {diff_lines}行の差分 ({diff_percent:.1}%)"),
            )
        } else {
            ComparisonCriterion::new(
                "ログ内容の差分",
                CriterionStatus::Success,
                format!("ログ内容の差分: {diff_lines}行 ({diff_percent:.1}%)"),
            )
        }
    }
}

/// File-size rule: percent delta ≤ +20% passes (inclusive boundary); a
/// shrink is always fine. old=0 is undefined and narrated as such.
fn grade_file_size(pair: FieldPair) -> ComparisonCriterion {
    if pair.old == 0.0 {
        return ComparisonCriterion::new(
            "ファイルサイズの変化",
            CriterionStatus::Success,
            format!("旧:0 バイト → 新:{} バイト (変化率は未定義)", pair.new as i64),
        );
    }
    let percent = (pair.new - pair.old) / pair.old * 100.0;
    let status = if percent > 20.0 {
        CriterionStatus::Failed
    } else {
        CriterionStatus::Success
    };
    ComparisonCriterion::new(
        "ファイルサイズの変化",
        status,
        format!(
            "旧:{} バイト → 新:{} バイト ({percent:.1}% 変化)",
            pair.old as i64, pair.new as i64
        ),
    )
}

/// Line-count changes are purely informational and never fail a build.
fn grade_line_count(pair: FieldPair) -> ComparisonCriterion {
    let diff = pair.new as i64 - pair.old as i64;
    ComparisonCriterion::new(
        "行数の変化",
        CriterionStatus::Success,
        format!(
            "旧:{} 行 → 新:{} 行 ({diff:+} 行)",
            pair.old as i64, pair.new as i64
        ),
    )
}

fn grade_success_count(pair: FieldPair) -> ComparisonCriterion {
    let status = if pair.new >= pair.old {
        CriterionStatus::Success
    } else {
        CriterionStatus::Failed
    };
    ComparisonCriterion::new(
        "成功数の変化",
        status,
        format!("旧:{} 件 → 新:{} 件", pair.old as i64, pair.new as i64),
    )
}

/// Failure counts must not grow; a drop to zero is narrated as full
/// resolution but stays a plain Success, not a separate tier.
fn grade_failure_count(pair: FieldPair) -> ComparisonCriterion {
    let status = if pair.new > pair.old {
        CriterionStatus::Failed
    } else {
        CriterionStatus::Success
    };
    let description = if pair.old > 0.0 && pair.new == 0.0 {
        format!(
            "旧:{} 件 → 新:0 件 (完全に解消)",
            pair.old as i64
        )
    } else {
        format!("旧:{} 件 → 新:{} 件", pair.old as i64, pair.new as i64)
    };
    ComparisonCriterion::new("エラー/失敗数の変化", status, description)
}

fn grade_timing(pair: FieldPair) -> (ComparisonCriterion, Option<String>) {
    let status = if pair.new < pair.old {
        CriterionStatus::Success
    } else {
        CriterionStatus::Failed
    };
    let improvement = if pair.old > 0.0 {
        Some((pair.old - pair.new) / pair.old * 100.0)
    } else {
        None
    };
    let description = match improvement {
        Some(pct) if pct > 0.0 => format!(
            "旧:{:.1}秒 → 新:{:.1}秒 ({pct:.1}%改善)",
            pair.old, pair.new
        ),
        _ => format!("旧:{:.1}秒 → 新:{:.1}秒", pair.old, pair.new),
    };
    let clause = match improvement {
        Some(pct) if pct > 0.0 => Some(format!("処理時間が{pct:.1}%改善")),
        Some(pct) if pct < 0.0 => Some(format!(
            "処理時間が低下: {:.2}秒 → {:.2}秒",
            pair.old, pair.new
        )),
        _ => None,
    };
    (
        ComparisonCriterion::new("処理時間", status, description),
        clause,
    )
}

fn grade_improvement_rate(improvement: f64) -> ComparisonCriterion {
    let (status, note) = if improvement > 20.0 {
        (CriterionStatus::Success, "20%超の大幅改善")
    } else if improvement > 10.0 {
        (CriterionStatus::Success, "10%超の改善")
    } else if improvement > 0.0 {
        (CriterionStatus::Success, "10%未満の改善")
    } else {
        (CriterionStatus::Failed, "パフォーマンス低下")
    };
    ComparisonCriterion::new(
        "パフォーマンス改善率",
        status,
        format!("改善率: {improvement:.1}% ({note})"),
    )
}

/// Log error-count rule: must not grow; drop to zero narrated as full
/// resolution with an extra エラー解消 criterion.
fn grade_log_errors(pair: FieldPair) -> Vec<ComparisonCriterion> {
    let status = if pair.new > pair.old {
        CriterionStatus::Failed
    } else {
        CriterionStatus::Success
    };
    let mut criteria = vec![ComparisonCriterion::new(
        "エラー数の変化",
        status,
        format!(
            "旧バージョン: {}件 → 新バージョン: {}件",
            pair.old as i64, pair.new as i64
        ),
    )];
    if pair.old > 0.0 && pair.new == 0.0 {
        criteria.push(ComparisonCriterion::new(
            "エラー解消",
            CriterionStatus::Success,
            "新バージョンでエラーが完全に解消されました",
        ));
    }
    criteria
}

fn grade_timing_violations(pair: FieldPair) -> ComparisonCriterion {
    let status = if pair.new > pair.old {
        CriterionStatus::Failed
    } else {
        CriterionStatus::Success
    };
    ComparisonCriterion::new(
        "タイミング違反数の変化",
        status,
        format!("旧:{} 件 → 新:{} 件", pair.old as i64, pair.new as i64),
    )
}

fn grade_memory_usage(pair: FieldPair) -> ComparisonCriterion {
    let status = if pair.new > pair.old {
        CriterionStatus::Failed
    } else {
        CriterionStatus::Success
    };
    ComparisonCriterion::new(
        "メモリ使用量検証",
        status,
        format!("旧:{}MB → 新:{}MB", pair.old as i64, pair.new as i64),
    )
}

fn grade_processed_files(pair: FieldPair) -> ComparisonCriterion {
    let description = if pair.old == pair.new {
        format!("処理ファイル数: {} 件 (変化なし)", pair.old as i64)
    } else {
        format!(
            "処理ファイル数: {} → {} 件",
            pair.old as i64, pair.new as i64
        )
    };
    ComparisonCriterion::new("処理ファイル数", CriterionStatus::Success, description)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{extract, FieldValue};
    use pretty_assertions::assert_eq;

    fn payload_fields(json: &str) -> ExtractedFields {
        crate::extraction::payload::parse_payload(json).unwrap()
    }

    fn find<'a>(set: &'a CriteriaSet, name: &str) -> &'a ComparisonCriterion {
        set.criteria
            .iter()
            .find(|c| c.name == name)
            .unwrap_or_else(|| panic!("criterion {name} not emitted"))
    }

    #[test]
    fn file_size_boundary_is_inclusive_at_plus_twenty() {
        let ok = grade_file_size(FieldPair { old: 100.0, new: 120.0 });
        assert_eq!(ok.status, CriterionStatus::Success);

        let over = grade_file_size(FieldPair { old: 10000.0, new: 12001.0 });
        assert_eq!(over.status, CriterionStatus::Failed);
    }

    #[test]
    fn file_size_shrink_passes() {
        let c = grade_file_size(FieldPair { old: 100.0, new: 80.0 });
        assert_eq!(c.status, CriterionStatus::Success);
    }

    #[test]
    fn file_size_from_zero_is_undefined_but_success() {
        let c = grade_file_size(FieldPair { old: 0.0, new: 500.0 });
        assert_eq!(c.status, CriterionStatus::Success);
        assert!(c.description.contains("未定義"));
    }

    #[test]
    fn line_count_is_always_informational_success() {
        let c = grade_line_count(FieldPair { old: 100.0, new: 120.0 });
        assert_eq!(c.status, CriterionStatus::Success);
        assert!(c.description.contains("+20"));
    }

    #[test]
    fn success_count_drop_fails() {
        let c = grade_success_count(FieldPair { old: 100.0, new: 80.0 });
        assert_eq!(c.status, CriterionStatus::Failed);
        let c = grade_success_count(FieldPair { old: 80.0, new: 100.0 });
        assert_eq!(c.status, CriterionStatus::Success);
    }

    #[test]
    fn failure_full_resolution_is_success_with_narration() {
        let c = grade_failure_count(FieldPair { old: 5.0, new: 0.0 });
        assert_eq!(c.status, CriterionStatus::Success);
        assert!(c.description.contains("完全に解消"));
    }

    #[test]
    fn timing_equal_or_slower_fails() {
        let (c, _) = grade_timing(FieldPair { old: 2.0, new: 2.0 });
        assert_eq!(c.status, CriterionStatus::Failed);
        let (c, clause) = grade_timing(FieldPair { old: 2.0, new: 1.0 });
        assert_eq!(c.status, CriterionStatus::Success);
        assert_eq!(clause.unwrap(), "処理時間が50.0%改善");
    }

    #[test]
    fn log_errors_resolved_emits_resolution_criterion() {
        let criteria = grade_log_errors(FieldPair { old: 5.0, new: 0.0 });
        assert_eq!(criteria.len(), 2);
        assert_eq!(criteria[1].name, "エラー解消");
    }

    #[test]
    fn log_diff_volume_over_half_fails() {
        let c = DiffBuilder::log_content_criterion(120, 200);
        assert_eq!(c.status, CriterionStatus::Failed);
        let c = DiffBuilder::log_content_criterion(80, 200);
        assert_eq!(c.status, CriterionStatus::Success);
    }

    #[test]
    fn absent_field_skips_criterion() {
        let old = extract("行数: 100\n");
        let new = extract("行数: 120\n");
        let set = DiffBuilder::artifacts().build(&old, &new);
        assert!(set.criteria.iter().all(|c| c.name != "処理時間"));
        assert_eq!(find(&set, "行数の変化").status, CriterionStatus::Success);
    }

    #[test]
    fn payload_wins_over_side_fields() {
        let mut old = ExtractedFields::default();
        old.values
            .insert("line_count".into(), FieldValue::Int(999));
        let new = payload_fields(
            "{\"analysis_type\": \"differences\", \"line_count\": {\"old\": 100, \"new\": 120}}",
        );
        let set = DiffBuilder::artifacts().build(&old, &new);
        let c = find(&set, "行数の変化");
        assert!(c.description.contains("旧:100"));
    }

    #[test]
    fn no_differences_payload_yields_identity_criterion() {
        let fields = payload_fields(
            "{\"analysis_type\": \"no_differences\", \"success_count\": 10, \"failure_count\": 0}",
        );
        let set = DiffBuilder::artifacts().build_from_payload(&fields);
        assert_eq!(find(&set, "成果物一致").status, CriterionStatus::Success);
        assert_eq!(find(&set, "エラー/失敗数").status, CriterionStatus::Success);
        assert!(!set.has_failure());
    }

    #[test]
    fn error_count_regression_fails_the_set() {
        let old = extract("error_count: 0\n");
        let new = extract("error_count: 3\n");
        let set = DiffBuilder::artifacts().build(&old, &new);
        assert_eq!(
            find(&set, "エラー/失敗数の変化").status,
            CriterionStatus::Failed
        );
        assert!(set.has_failure());
    }

    #[test]
    fn error_marks_and_summary_counters_grade_errors_once() {
        let old = extract("[ERROR] boom\n[ERROR] bang\nErrors in old log: 2\nErrors in new log: 0\n");
        let new = extract("clean run\nErrors in old log: 2\nErrors in new log: 0\n");
        let set = DiffBuilder::logs().build(&old, &new);
        let emitted = set
            .criteria
            .iter()
            .filter(|c| c.name == "エラー数の変化")
            .count();
        assert_eq!(emitted, 1);
    }

    #[test]
    fn no_notable_clause_states_no_significant_difference() {
        let old = extract("行数: 100\n");
        let new = extract("行数: 100\n");
        let set = DiffBuilder::artifacts().build(&old, &new);
        assert_eq!(set.message, "有意な差分はありません");
    }
}
