//! Report sink: the verdicts flattened into per-criterion rows, written as
//! CSV and HTML.

pub mod csv;
pub mod html;

pub use csv::generate_csv;
pub use html::generate_html;

use crate::comparison::types::{ComparisonVerdict, CriterionStatus, OverallStatus};

/// One report row. Every verdict expands to a launch row, one row per
/// applicable criterion, and a closing overall row.
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub timestamp: String,
    pub tool: String,
    pub old_version: String,
    pub new_version: String,
    pub phase: String,
    pub status: String,
    pub note: String,
    pub item: String,
    pub metric: String,
    pub link: String,
}

pub const ROW_HEADERS: [&str; 10] = [
    "Timestamp",
    "ツール名",
    "旧バージョン",
    "新バージョン",
    "観点",
    "判定",
    "判定メモ",
    "項目",
    "評価指標",
    "リンク",
];

impl ReportRow {
    pub fn columns(&self) -> [&str; 10] {
        [
            &self.timestamp,
            &self.tool,
            &self.old_version,
            &self.new_version,
            &self.phase,
            &self.status,
            &self.note,
            &self.item,
            &self.metric,
            &self.link,
        ]
    }
}

fn phase_for(item: &str) -> &'static str {
    if item == "起動・実行確認" {
        "動作"
    } else if item == "バージョン互換性評価" {
        "総括"
    } else if item.starts_with("ログ") || item == "エラー数の変化" || item == "エラー解消" {
        "ログ"
    } else {
        "成果物"
    }
}

fn note_for(status: CriterionStatus) -> &'static str {
    match status {
        CriterionStatus::Success => "問題なし",
        CriterionStatus::Failed => "要確認",
        CriterionStatus::Error => "実行エラー",
        CriterionStatus::NotApplicable => "対象外",
    }
}

/// Flatten one verdict into report rows. N/A criteria are dropped; they
/// carry no judgment worth a row.
pub fn rows_for(verdict: &ComparisonVerdict) -> Vec<ReportRow> {
    let base = |item: &str, status: &str, note: &str, metric: &str, link: &str| ReportRow {
        timestamp: verdict.timestamp.clone(),
        tool: verdict.tool_name.clone(),
        old_version: verdict.old_version.clone(),
        new_version: verdict.new_version.clone(),
        phase: phase_for(item).to_string(),
        status: status.to_string(),
        note: note.to_string(),
        item: item.to_string(),
        metric: metric.to_string(),
        link: link.to_string(),
    };

    let mut rows = Vec::new();

    let launch_failed = verdict.overall == OverallStatus::Error;
    rows.push(base(
        "起動・実行確認",
        if launch_failed { "Error" } else { "Success" },
        if launch_failed { "実行エラー" } else { "問題なし" },
        if launch_failed {
            verdict.detail.as_str()
        } else {
            "両バージョンが正常に実行されました"
        },
        "",
    ));

    for criterion in &verdict.criteria {
        if criterion.status == CriterionStatus::NotApplicable {
            continue;
        }
        let link = match phase_for(&criterion.name) {
            "ログ" => path_string(&verdict.log_file),
            "成果物" => path_string(&verdict.new_artifact),
            _ => String::new(),
        };
        rows.push(base(
            &criterion.name,
            criterion.status.as_str(),
            note_for(criterion.status),
            &criterion.description,
            &link,
        ));
    }

    rows.push(base(
        "バージョン互換性評価",
        verdict.overall.as_str(),
        match verdict.overall {
            OverallStatus::Success => "新バージョンへの移行に問題なし",
            OverallStatus::Failed => "差分の確認が必要",
            OverallStatus::Error => "比較を実施できず",
        },
        &verdict.detail,
        &path_string(&verdict.log_file),
    ));

    rows
}

fn path_string(path: &Option<std::path::PathBuf>) -> String {
    path.as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}
