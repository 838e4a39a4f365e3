//! CSV report writer. UTF-8, comma separated, RFC 4180 quoting.

use crate::comparison::types::ComparisonVerdict;
use crate::errors::HarnessError;
use crate::report::{rows_for, ROW_HEADERS};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub fn generate_csv(
    path: &Path,
    verdicts: &[ComparisonVerdict],
) -> Result<PathBuf, HarnessError> {
    let report_error = |source: std::io::Error| HarnessError::ReportWrite {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(report_error)?;
    let mut out = BufWriter::new(file);

    writeln!(out, "{}", ROW_HEADERS.map(escape_field).join(",")).map_err(report_error)?;
    for verdict in verdicts {
        for row in rows_for(verdict) {
            let line: Vec<String> = row.columns().iter().map(|c| escape_field(c)).collect();
            writeln!(out, "{}", line.join(",")).map_err(report_error)?;
        }
    }
    out.flush().map_err(report_error)?;

    Ok(path.to_path_buf())
}

fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::types::{ComparisonCriterion, CriterionStatus};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn quotes_fields_containing_separators() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn writes_header_and_one_row_per_applicable_criterion() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.csv");
        let verdict = ComparisonVerdict::from_criteria(
            "SampleTool",
            "1.0.0",
            "2.0.0",
            vec![ComparisonCriterion::new(
                "行数の変化",
                CriterionStatus::Success,
                "旧:100 行 → 新:120 行",
            )],
            "有意な差分はありません".to_string(),
        );

        generate_csv(&path, &[verdict]).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        // Header, launch row, criterion row, overall row.
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Timestamp,ツール名"));
        assert!(lines[2].contains("行数の変化"));
    }
}
