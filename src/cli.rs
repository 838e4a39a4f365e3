use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "verup")]
#[command(about = "バージョンアップ検証ハーネス: 新旧バージョンを実行して成果物とログを比較する")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run both versions of one tool (or every known tool) and compare
    Run {
        /// Tool to verify; omit to run every tool the registry knows
        #[arg(short = 't', long)]
        tool_name: Option<String>,

        /// Version treated as the baseline
        #[arg(short = 'o', long, default_value = "1.0.0")]
        old_version: String,

        /// Version under verification
        #[arg(short = 'n', long, default_value = "2.0.0")]
        new_version: String,

        /// Directory of input files handed to the tools
        #[arg(short = 'i', long, default_value = "inputs")]
        input_dir: PathBuf,

        /// Directory the tools write artifacts into
        #[arg(short = 'a', long, default_value = "artifacts")]
        artifacts_dir: PathBuf,

        /// Directory for per-run journals and tool logs
        #[arg(long, default_value = "logs")]
        log_dir: PathBuf,

        /// Directory holding `<tool>/<version>/` installations
        #[arg(long, default_value = ".")]
        tools_dir: PathBuf,

        /// Comparator name override; defaults to the tool name
        #[arg(short = 'c', long)]
        comparator: Option<String>,

        /// CSV report path
        #[arg(long, default_value = "report.csv")]
        csv_report: PathBuf,

        /// HTML report path
        #[arg(long, default_value = "report.html")]
        html_report: PathBuf,

        /// Compare only, write no report files
        #[arg(long)]
        no_report: bool,
    },

    /// List the tools and comparators the registry can resolve
    List {
        /// Directory searched for comparator configs
        #[arg(long, default_value = ".")]
        tools_dir: PathBuf,
    },
}
