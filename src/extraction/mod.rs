//! Pattern extraction: turns unstructured report/log text into an
//! [`ExtractedFields`] mapping.
//!
//! Extraction is stateless and idempotent. If the text carries an embedded
//! `STRUCTURED_DATA={...}` payload it is the single source of truth and all
//! plain-text heuristics are bypassed; a malformed payload degrades to the
//! heuristics with a warning instead of failing the comparison.

pub mod payload;
pub mod rules;

use std::collections::BTreeMap;

/// A single extracted value. Absence of a field means "not found in this
/// text", which is distinct from a field holding zero.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            FieldValue::Float(v) => Some(*v as i64),
            FieldValue::Text(_) => None,
        }
    }
}

/// An old/new value pair captured from a single text, either from a labeled
/// `<label>: <x>秒 → <y>秒` line or from an embedded payload entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldPair {
    pub old: f64,
    pub new: f64,
}

/// Mapping from field name to extracted value, derived from one text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedFields {
    pub values: BTreeMap<String, FieldValue>,
    pub pairs: BTreeMap<String, FieldPair>,
    /// Set when the fields came from an embedded payload.
    pub from_payload: bool,
    /// `analysis_type` of the embedded payload, when present.
    pub analysis_type: Option<String>,
}

impl ExtractedFields {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.pairs.is_empty() && self.analysis_type.is_none()
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(FieldValue::as_i64)
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(FieldValue::as_f64)
    }

    pub fn pair(&self, name: &str) -> Option<FieldPair> {
        self.pairs.get(name).copied()
    }
}

/// Extract recognized fields from free-form text. Never fails; unmatched
/// input yields an empty mapping.
pub fn extract(content: &str) -> ExtractedFields {
    if let Some(raw) = payload::find_payload(content) {
        match payload::parse_payload(raw) {
            Ok(fields) => return fields,
            Err(e) => log::warn!("{e}; falling back to plain-text heuristics"),
        }
    }
    rules::extract_plain(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn extraction_is_idempotent() {
        let text = indoc! {"
            SampleTool の処理結果
            行数: 100
            文字数: 500
            処理時間: 1.25秒
        "};
        assert_eq!(extract(text), extract(text));
    }

    #[test]
    fn payload_takes_precedence_over_plain_text() {
        let text = concat!(
            "行数: 999\n",
            "STRUCTURED_DATA={\"analysis_type\": \"differences\", ",
            "\"line_count\": {\"old\": 100, \"new\": 120}}\n",
            "文字数: 999\n",
        );
        let fields = extract(text);
        assert!(fields.from_payload);
        assert_eq!(fields.pair("line_count"), Some(FieldPair { old: 100.0, new: 120.0 }));
        // Plain-text labeled counters must be ignored entirely.
        assert_eq!(fields.int("line_count"), None);
        assert_eq!(fields.int("char_count"), None);
    }

    #[test]
    fn malformed_payload_degrades_to_heuristics() {
        let text = "STRUCTURED_DATA={\"analysis_type\": \"diff\n行数: 42\n";
        let fields = extract(text);
        assert!(!fields.from_payload);
        assert_eq!(fields.int("line_count"), Some(42));
    }

    #[test]
    fn missing_timing_field_is_absent_not_zero() {
        let fields = extract("行数: 10\n");
        assert_eq!(fields.float("processing_time_seconds"), None);
    }

    #[test]
    fn empty_input_yields_empty_mapping_except_scanned_counters() {
        let fields = extract("");
        assert_eq!(fields.int("line_count"), None);
        assert_eq!(fields.pairs.len(), 0);
    }
}
