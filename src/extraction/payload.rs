//! Embedded structured payload handling.
//!
//! Tools may embed a machine-readable JSON object in otherwise free-text
//! output, marked by the fixed prefix `STRUCTURED_DATA=`. The object is the
//! preferred channel over regex heuristics.

use crate::errors::HarnessError;
use crate::extraction::{ExtractedFields, FieldPair, FieldValue};
use serde_json::Value;

pub const PAYLOAD_MARKER: &str = "STRUCTURED_DATA=";

/// Locate the raw JSON object following the payload marker. The scan is
/// balanced-brace so the object may span the rest of the line or further;
/// braces inside JSON strings are ignored.
pub fn find_payload(content: &str) -> Option<&str> {
    let start = content.find(PAYLOAD_MARKER)? + PAYLOAD_MARKER.len();
    let rest = &content[start..];
    if !rest.starts_with('{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in rest.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&rest[..=i]);
                }
            }
            _ => {}
        }
    }

    // Unterminated object: return what we have so the parser can report it.
    Some(rest)
}

/// Parse a raw payload into fields. Numbers become values, strings become
/// text, and `{"old": x, "new": y}` objects become pairs. Sub-keys such as
/// `diff_percent` are kept as `<name>.<key>` values.
pub fn parse_payload(raw: &str) -> Result<ExtractedFields, HarnessError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| HarnessError::Extraction(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| HarnessError::Extraction("payload is not a JSON object".into()))?;

    let mut fields = ExtractedFields {
        from_payload: true,
        ..Default::default()
    };

    for (key, entry) in object {
        match entry {
            Value::String(s) if key == "analysis_type" => {
                fields.analysis_type = Some(s.clone());
            }
            Value::String(s) => {
                fields
                    .values
                    .insert(key.clone(), FieldValue::Text(s.clone()));
            }
            Value::Number(_) => {
                if let Some(v) = numeric(entry) {
                    fields.values.insert(key.clone(), v);
                }
            }
            Value::Object(map) => {
                let old = map.get("old").and_then(as_f64);
                let new = map.get("new").and_then(as_f64);
                if let (Some(old), Some(new)) = (old, new) {
                    fields.pairs.insert(key.clone(), FieldPair { old, new });
                }
                for (sub, sub_value) in map {
                    if sub == "old" || sub == "new" {
                        continue;
                    }
                    if let Some(v) = numeric(sub_value) {
                        fields.values.insert(format!("{key}.{sub}"), v);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(fields)
}

fn numeric(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Number(n) if n.is_i64() => n.as_i64().map(FieldValue::Int),
        Value::Number(n) => n.as_f64().map(FieldValue::Float),
        Value::Bool(b) => Some(FieldValue::Int(*b as i64)),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    value.as_f64()
}
