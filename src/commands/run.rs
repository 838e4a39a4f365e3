//! The `run` subcommand: execute and compare one tool, or every tool the
//! registry knows, then write the reports.

use crate::comparison::registry::ComparatorRegistry;
use crate::comparison::types::{ComparisonVerdict, OverallStatus};
use crate::report;
use crate::runner::{run_tool, RunContext, RunLog};
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

pub struct RunOptions {
    pub tool_name: Option<String>,
    pub old_version: String,
    pub new_version: String,
    pub input_dir: PathBuf,
    pub artifacts_dir: PathBuf,
    pub log_dir: PathBuf,
    pub tools_dir: PathBuf,
    pub comparator: Option<String>,
    pub csv_report: PathBuf,
    pub html_report: PathBuf,
    pub no_report: bool,
}

/// Returns the process exit code: 0 when every verdict is Success, 1 when
/// any tool failed or errored.
pub fn execute(options: RunOptions) -> Result<i32> {
    for dir in [&options.artifacts_dir, &options.log_dir] {
        fs::create_dir_all(dir)
            .with_context(|| format!("could not create {}", dir.display()))?;
    }

    let registry = ComparatorRegistry::new(&options.tools_dir);
    let tools = match &options.tool_name {
        Some(name) => vec![name.clone()],
        None => registry.list_available(),
    };
    anyhow::ensure!(!tools.is_empty(), "no tools to verify");

    let mut verdicts = Vec::new();
    for tool in &tools {
        let resolution = registry.resolve(tool, options.comparator.as_deref());
        let ctx = RunContext::new(
            tool,
            &options.old_version,
            &options.new_version,
            &options.input_dir,
            &options.artifacts_dir,
            &options.log_dir,
            &options.tools_dir,
        );
        let mut journal = RunLog::create(&ctx);
        let verdict = run_tool(&ctx, &resolution, &mut journal);
        println!(
            "{}: {} ({})",
            verdict.tool_name, verdict.overall, verdict.detail
        );
        verdicts.push(verdict);
    }

    // A report that cannot be written is reported but does not invalidate
    // the computed verdicts or the exit code.
    if !options.no_report {
        match (
            report::generate_csv(&options.csv_report, &verdicts),
            report::generate_html(&options.html_report, &verdicts),
        ) {
            (Ok(csv), Ok(html)) => {
                println!("レポート: {} / {}", csv.display(), html.display());
            }
            (csv, html) => {
                for result in [csv, html] {
                    if let Err(e) = result {
                        log::error!("{e}");
                        eprintln!("レポート書き込み失敗: {e}");
                    }
                }
            }
        }
    }

    println!("{}", summary_line(&verdicts));

    let all_clean = verdicts
        .iter()
        .all(|v| v.overall == OverallStatus::Success);
    Ok(if all_clean { 0 } else { 1 })
}

fn summary_line(verdicts: &[ComparisonVerdict]) -> String {
    let count = |status| {
        verdicts
            .iter()
            .filter(|v| v.overall == status)
            .count()
    };
    format!(
        "合計: {} 件 / 成功: {} 件 / 失敗: {} 件 / エラー: {} 件",
        verdicts.len(),
        count(OverallStatus::Success),
        count(OverallStatus::Failed),
        count(OverallStatus::Error),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn summary_line_counts_by_overall_status() {
        let verdicts = vec![
            ComparisonVerdict::from_criteria("a", "1", "2", vec![], "ok".into()),
            ComparisonVerdict::error("b", "1", "2", "boom"),
        ];
        assert_eq!(
            summary_line(&verdicts),
            "合計: 2 件 / 成功: 1 件 / 失敗: 0 件 / エラー: 1 件"
        );
    }
}
