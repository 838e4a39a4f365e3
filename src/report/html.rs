//! HTML report writer: a summary box plus one table row per report row.

use crate::comparison::types::{ComparisonVerdict, OverallStatus};
use crate::errors::HarnessError;
use crate::report::{rows_for, ROW_HEADERS};
use html_escape::encode_text;
use std::fs;
use std::path::{Path, PathBuf};

pub fn generate_html(
    path: &Path,
    verdicts: &[ComparisonVerdict],
) -> Result<PathBuf, HarnessError> {
    fs::write(path, render(verdicts)).map_err(|source| HarnessError::ReportWrite {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(path.to_path_buf())
}

fn render(verdicts: &[ComparisonVerdict]) -> String {
    let total = verdicts.len();
    let success = count(verdicts, OverallStatus::Success);
    let failed = count(verdicts, OverallStatus::Failed);
    let errors = count(verdicts, OverallStatus::Error);

    let mut body = String::new();
    for verdict in verdicts {
        for row in rows_for(verdict) {
            body.push_str("      <tr>\n");
            for (i, column) in row.columns().iter().enumerate() {
                // 判定 column gets its status class for the stylesheet.
                if ROW_HEADERS[i] == "判定" {
                    body.push_str(&format!(
                        "        <td class=\"status-{}\">{}</td>\n",
                        column.to_lowercase().replace('/', "-"),
                        encode_text(column)
                    ));
                } else {
                    body.push_str(&format!("        <td>{}</td>\n", encode_text(column)));
                }
            }
            body.push_str("      </tr>\n");
        }
    }

    let headers: String = ROW_HEADERS
        .iter()
        .map(|h| format!("        <th>{}</th>\n", encode_text(h)))
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="ja">
<head>
  <meta charset="UTF-8">
  <title>バージョンアップ検証レポート</title>
  <style>
    body {{ font-family: sans-serif; margin: 2em; }}
    table {{ border-collapse: collapse; width: 100%; }}
    th, td {{ border: 1px solid #ccc; padding: 6px 10px; text-align: left; }}
    th {{ background: #f0f0f0; }}
    .summary {{ background: #f8f8f8; border: 1px solid #ddd; padding: 1em; margin-bottom: 1.5em; }}
    .status-success {{ color: #1a7f37; font-weight: bold; }}
    .status-failed {{ color: #cf222e; font-weight: bold; }}
    .status-error {{ color: #9a6700; font-weight: bold; }}
    .status-n-a {{ color: #6e7781; }}
  </style>
</head>
<body>
  <h1>バージョンアップ検証レポート</h1>
  <div class="summary">
    <p>対象ツール: {total} 件 / 成功: {success} 件 / 失敗: {failed} 件 / エラー: {errors} 件</p>
  </div>
  <table>
    <thead>
      <tr>
{headers}      </tr>
    </thead>
    <tbody>
{body}    </tbody>
  </table>
</body>
</html>
"#
    )
}

fn count(verdicts: &[ComparisonVerdict], status: OverallStatus) -> usize {
    verdicts.iter().filter(|v| v.overall == status).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::types::{ComparisonCriterion, CriterionStatus};

    #[test]
    fn renders_summary_counts_and_status_classes() {
        let verdicts = vec![
            ComparisonVerdict::from_criteria(
                "SampleTool",
                "1.0.0",
                "2.0.0",
                vec![ComparisonCriterion::new(
                    "行数の変化",
                    CriterionStatus::Success,
                    "旧:100 行 → 新:120 行",
                )],
                "有意な差分はありません".to_string(),
            ),
            ComparisonVerdict::error("OtherTool", "1.0.0", "2.0.0", "起動失敗"),
        ];

        let html = render(&verdicts);
        assert!(html.contains("対象ツール: 2 件 / 成功: 1 件 / 失敗: 0 件 / エラー: 1 件"));
        assert!(html.contains("class=\"status-success\""));
        assert!(html.contains("class=\"status-error\""));
    }

    #[test]
    fn escapes_markup_in_descriptions() {
        let verdicts = vec![ComparisonVerdict::from_criteria(
            "SampleTool",
            "1.0.0",
            "2.0.0",
            vec![ComparisonCriterion::new(
                "成果物差分",
                CriterionStatus::Failed,
                "<script>alert(1)</script>",
            )],
            "diff".to_string(),
        )];

        let html = render(&verdicts);
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
