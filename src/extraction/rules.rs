//! Declarative plain-text extraction rules.
//!
//! Each recognized report field is one `(name, pattern, parser)` entry in
//! [`FIELD_RULES`], so supporting a new field is a data change rather than a
//! code change, and every rule is testable field-by-field.

use crate::extraction::{ExtractedFields, FieldPair, FieldValue};
use once_cell::sync::Lazy;
use regex::Regex;

enum RuleKind {
    /// Sum all integer captures (per-file counters repeated per section).
    SumInt,
    /// First integer capture wins.
    FirstInt,
    /// First float capture wins.
    FirstFloat,
    /// Number of occurrences of the pattern. Always recorded: zero matches
    /// is a measurement, unlike a labeled counter that was never printed.
    CountMatches,
    /// `<label>: <old>秒 → <new>秒` pair; capture 1 is the label.
    LabeledPair,
}

struct FieldRule {
    name: &'static str,
    pattern: &'static str,
    kind: RuleKind,
}

static FIELD_RULES: Lazy<Vec<(FieldRule, Regex)>> = Lazy::new(|| {
    let rules = vec![
        // Per-file counters emitted by the sample tools, summed across files.
        FieldRule { name: "line_count", pattern: r"行数:\s*(\d+)", kind: RuleKind::SumInt },
        FieldRule { name: "char_count", pattern: r"文字数:\s*(\d+)", kind: RuleKind::SumInt },
        FieldRule { name: "word_count", pattern: r"単語数:\s*(\d+)", kind: RuleKind::SumInt },
        // Section markers and log error marks are occurrence counts.
        FieldRule { name: "file_count", pattern: r"の処理結果", kind: RuleKind::CountMatches },
        FieldRule { name: "error_marks", pattern: r"\[ERROR\]", kind: RuleKind::CountMatches },
        // Smoke-run summary counters.
        FieldRule { name: "processed_files", pattern: r"処理ファイル数:\s*(\d+)", kind: RuleKind::FirstInt },
        FieldRule { name: "timing_violations", pattern: r"タイミング違反数:\s*(\d+)", kind: RuleKind::FirstInt },
        FieldRule { name: "rtl_modules", pattern: r"RTLファイル:\s*\d+\s*\(モジュール数:\s*(\d+)\)", kind: RuleKind::FirstInt },
        FieldRule { name: "constraints", pattern: r"制約ファイル:\s*\d+\s*\(制約数:\s*(\d+)\)", kind: RuleKind::FirstInt },
        FieldRule { name: "tech_cells", pattern: r"技術ファイル:\s*\d+\s*\(セル定義数:\s*(\d+)\)", kind: RuleKind::FirstInt },
        FieldRule { name: "memory_usage_mb", pattern: r"メモリ使用量:\s*(\d+)MB", kind: RuleKind::FirstInt },
        // English labeled counters.
        FieldRule { name: "error_count", pattern: r"(?mi)^error_count:\s*(\d+)", kind: RuleKind::FirstInt },
        FieldRule { name: "success_count", pattern: r"(?mi)^success_count:\s*(\d+)", kind: RuleKind::FirstInt },
        FieldRule { name: "failure_count", pattern: r"(?mi)^failure_count:\s*(\d+)", kind: RuleKind::FirstInt },
        FieldRule { name: "file_size_bytes", pattern: r"(?mi)^file_size_bytes:\s*(\d+)", kind: RuleKind::FirstInt },
        // Log-comparison summary lines.
        FieldRule { name: "old_log_lines", pattern: r"Old log lines:\s*(\d+)", kind: RuleKind::FirstInt },
        FieldRule { name: "new_log_lines", pattern: r"New log lines:\s*(\d+)", kind: RuleKind::FirstInt },
        FieldRule { name: "diff_lines", pattern: r"Different lines:\s*(\d+)", kind: RuleKind::FirstInt },
        FieldRule { name: "old_log_errors", pattern: r"Errors in old log:\s*(\d+)", kind: RuleKind::FirstInt },
        FieldRule { name: "new_log_errors", pattern: r"Errors in new log:\s*(\d+)", kind: RuleKind::FirstInt },
        // Timings.
        FieldRule { name: "processing_time_seconds", pattern: r"処理時間:\s*(\d+(?:\.\d+)?)秒", kind: RuleKind::FirstFloat },
        FieldRule { name: "processing_time_old", pattern: r"Old version:\s*(\d+(?:\.\d+)?)", kind: RuleKind::FirstFloat },
        FieldRule { name: "processing_time_new", pattern: r"New version:\s*(\d+(?:\.\d+)?)", kind: RuleKind::FirstFloat },
        FieldRule { name: "improvement_percent", pattern: r"Improvement:\s*([+-]?\d+(?:\.\d+)?)", kind: RuleKind::FirstFloat },
        // `<label>: 1.23秒 → 0.98秒` timing pairs, keyed by their label.
        FieldRule { name: "", pattern: r"(?m)^(.*処理時間.*?):\s*(\d+(?:\.\d+)?)秒\s*→\s*(\d+(?:\.\d+)?)秒", kind: RuleKind::LabeledPair },
    ];

    rules
        .into_iter()
        .map(|rule| {
            let regex = Regex::new(rule.pattern).expect("field rule pattern must compile");
            (rule, regex)
        })
        .collect()
});

/// Apply the rule table to one text. Values that fail the strict numeric
/// grammar are treated as absent, never zero.
pub fn extract_plain(content: &str) -> ExtractedFields {
    let mut fields = ExtractedFields::default();

    for (rule, regex) in FIELD_RULES.iter() {
        match rule.kind {
            RuleKind::SumInt => {
                let mut sum: i64 = 0;
                let mut seen = false;
                for caps in regex.captures_iter(content) {
                    if let Some(v) = caps.get(1).and_then(|m| m.as_str().parse::<i64>().ok()) {
                        sum += v;
                        seen = true;
                    }
                }
                if seen {
                    fields.values.insert(rule.name.into(), FieldValue::Int(sum));
                }
            }
            RuleKind::FirstInt => {
                if let Some(v) = regex
                    .captures(content)
                    .and_then(|c| c.get(1))
                    .and_then(|m| m.as_str().parse::<i64>().ok())
                {
                    fields.values.insert(rule.name.into(), FieldValue::Int(v));
                }
            }
            RuleKind::FirstFloat => {
                if let Some(v) = regex
                    .captures(content)
                    .and_then(|c| c.get(1))
                    .and_then(|m| m.as_str().parse::<f64>().ok())
                {
                    fields.values.insert(rule.name.into(), FieldValue::Float(v));
                }
            }
            RuleKind::CountMatches => {
                let count = regex.find_iter(content).count() as i64;
                fields
                    .values
                    .insert(rule.name.into(), FieldValue::Int(count));
            }
            RuleKind::LabeledPair => {
                for caps in regex.captures_iter(content) {
                    let label = caps.get(1).map(|m| m.as_str().trim().to_string());
                    let old = caps.get(2).and_then(|m| m.as_str().parse::<f64>().ok());
                    let new = caps.get(3).and_then(|m| m.as_str().parse::<f64>().ok());
                    if let (Some(label), Some(old), Some(new)) = (label, old, new) {
                        fields.pairs.insert(label, FieldPair { old, new });
                    }
                }
            }
        }
    }

    // `Performance differences:` blocks report the two sides on separate
    // lines; fold them into a single processing_time pair.
    if let (Some(old), Some(new)) = (
        fields.float("processing_time_old"),
        fields.float("processing_time_new"),
    ) {
        fields
            .pairs
            .insert("processing_time".into(), FieldPair { old, new });
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn repeated_counters_are_summed() {
        let text = indoc! {"
            a.txt の処理結果
            行数: 40
            b.txt の処理結果
            行数: 60
        "};
        let fields = extract_plain(text);
        assert_eq!(fields.int("line_count"), Some(100));
        assert_eq!(fields.int("file_count"), Some(2));
    }

    #[test]
    fn labeled_timing_pairs_are_keyed_by_label() {
        let text = "input.v の処理時間: 2.50秒 → 1.75秒\n";
        let fields = extract_plain(text);
        let pair = fields.pair("input.v の処理時間").unwrap();
        assert_eq!(pair.old, 2.5);
        assert_eq!(pair.new, 1.75);
    }

    #[test]
    fn performance_block_folds_into_processing_time_pair() {
        let text = indoc! {"
            Performance differences:
              Old version: 3.20
              New version: 2.40
              Improvement: 25.0
        "};
        let fields = extract_plain(text);
        assert_eq!(fields.pair("processing_time"), Some(FieldPair { old: 3.2, new: 2.4 }));
        assert_eq!(fields.float("improvement_percent"), Some(25.0));
    }

    #[test]
    fn log_comparison_counters_are_extracted() {
        let text = indoc! {"
            Log comparison:
            Old log lines: 200
            New log lines: 210
            Different lines: 120
            Errors in old log: 5
            Errors in new log: 0
        "};
        let fields = extract_plain(text);
        assert_eq!(fields.int("old_log_lines"), Some(200));
        assert_eq!(fields.int("diff_lines"), Some(120));
        assert_eq!(fields.int("new_log_errors"), Some(0));
    }

    #[test]
    fn unparseable_number_is_absent_not_zero() {
        let fields = extract_plain("処理時間: abc秒\n");
        assert_eq!(fields.float("processing_time_seconds"), None);
    }

    #[test]
    fn smoke_summary_counters() {
        let text = indoc! {"
            処理ファイル数: 12
            タイミング違反数: 3
            RTLファイル: 4 (モジュール数: 18)
            メモリ使用量: 2048MB
        "};
        let fields = extract_plain(text);
        assert_eq!(fields.int("processed_files"), Some(12));
        assert_eq!(fields.int("timing_violations"), Some(3));
        assert_eq!(fields.int("rtl_modules"), Some(18));
        assert_eq!(fields.int("memory_usage_mb"), Some(2048));
    }
}
