//! Per-tool execution pipeline: run both versions, locate their artifacts
//! and logs, and hand the pair to the resolved comparator.

use crate::comparison::registry::Resolution;
use crate::comparison::types::{ComparisonVerdict, ToolInvocationResult};
use crate::errors::HarnessError;
use chrono::Local;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Everything one tool's comparison needs, threaded explicitly through the
/// pipeline. One context is built per tool per run.
pub struct RunContext {
    pub tool_name: String,
    pub old_version: String,
    pub new_version: String,
    pub input_dir: PathBuf,
    pub artifacts_dir: PathBuf,
    pub log_dir: PathBuf,
    pub tools_dir: PathBuf,
    pub timestamp: String,
}

impl RunContext {
    pub fn new(
        tool_name: impl Into<String>,
        old_version: impl Into<String>,
        new_version: impl Into<String>,
        input_dir: impl Into<PathBuf>,
        artifacts_dir: impl Into<PathBuf>,
        log_dir: impl Into<PathBuf>,
        tools_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            old_version: old_version.into(),
            new_version: new_version.into(),
            input_dir: input_dir.into(),
            artifacts_dir: artifacts_dir.into(),
            log_dir: log_dir.into(),
            tools_dir: tools_dir.into(),
            timestamp: Local::now().format("%Y%m%d_%H%M%S").to_string(),
        }
    }

    /// Artifact produced by one version, by pattern
    /// `<artifacts_dir>/<Tool>_<version>*`. The first sorted match wins.
    pub fn artifact_for(&self, version: &str) -> Result<PathBuf, HarnessError> {
        let pattern = format!(
            "{}/{}_{version}*",
            self.artifacts_dir.display(),
            self.tool_name
        );
        glob_first(&pattern).ok_or_else(|| HarnessError::MissingArtifact {
            tool: self.tool_name.clone(),
            version: version.to_string(),
            dir: self.artifacts_dir.clone(),
        })
    }

    /// Newest run log for one version. Timestamped names sort
    /// lexicographically, so the last glob match is the newest; the
    /// un-timestamped name is the pre-0.3 layout and still accepted.
    pub fn log_for(&self, version: &str) -> Result<PathBuf, HarnessError> {
        let pattern = format!(
            "{}/{}_{version}_*.log",
            self.log_dir.display(),
            self.tool_name
        );
        if let Some(path) = glob_last(&pattern) {
            return Ok(path);
        }
        let legacy = self.log_dir.join(format!("{}_{version}.log", self.tool_name));
        if legacy.exists() {
            return Ok(legacy);
        }
        Err(HarnessError::MissingLog {
            tool: self.tool_name.clone(),
            version: version.to_string(),
            dir: self.log_dir.clone(),
        })
    }

    fn version_dir(&self, version: &str) -> PathBuf {
        self.tools_dir.join(&self.tool_name).join(version)
    }
}

fn glob_sorted(pattern: &str) -> Vec<PathBuf> {
    let Ok(paths) = glob::glob(pattern) else {
        return Vec::new();
    };
    let mut matches: Vec<PathBuf> = paths.flatten().filter(|p| p.is_file()).collect();
    matches.sort();
    matches
}

fn glob_first(pattern: &str) -> Option<PathBuf> {
    glob_sorted(pattern).into_iter().next()
}

fn glob_last(pattern: &str) -> Option<PathBuf> {
    glob_sorted(pattern).pop()
}

/// Scoped run-journal writer: one file per old→new comparison, mirrored to
/// the process log. A journal that cannot be created degrades to
/// process-log-only output rather than aborting the run.
pub struct RunLog {
    file: Option<File>,
    path: PathBuf,
}

impl RunLog {
    pub fn create(ctx: &RunContext) -> Self {
        // The compare_ prefix keeps the journal out of the per-version log
        // glob `<Tool>_<version>_*.log`.
        let path = ctx.log_dir.join(format!(
            "compare_{}_{}_{}_{}.log",
            ctx.tool_name, ctx.old_version, ctx.new_version, ctx.timestamp
        ));
        let file = match File::create(&path) {
            Ok(file) => Some(file),
            Err(e) => {
                log::warn!("could not create run journal {}: {e}", path.display());
                None
            }
        };
        Self { file, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn line(&mut self, message: &str) {
        log::info!("{message}");
        if let Some(file) = &mut self.file {
            if let Err(e) = writeln!(file, "{message}") {
                log::warn!("run journal write failed: {e}");
            }
        }
    }
}

impl Drop for RunLog {
    fn drop(&mut self) {
        if let Some(file) = &mut self.file {
            let _ = file.flush();
        }
    }
}

/// Run one version of the tool and capture its output. The command comes
/// from the comparator config when it names one, otherwise from the entry
/// script found under `<tools_dir>/<tool>/<version>/`.
pub fn execute_version(
    ctx: &RunContext,
    resolution: &Resolution,
    version: &str,
) -> Result<ToolInvocationResult, HarnessError> {
    let execution_error = |message: String| HarnessError::Execution {
        tool: ctx.tool_name.clone(),
        version: version.to_string(),
        message,
    };

    let config = resolution.config.as_ref();
    let argv = match config.and_then(|c| c.execute_command.as_deref()) {
        Some(template) => {
            let command = template
                .replace("{version}", version)
                .replace("{tool}", &ctx.tool_name)
                .replace("{input_dir}", &ctx.input_dir.to_string_lossy())
                .replace("{output_dir}", &ctx.artifacts_dir.to_string_lossy());
            let mut argv: Vec<String> = command.split_whitespace().map(String::from).collect();
            if argv.is_empty() {
                return Err(execution_error("execute_command is empty".to_string()));
            }
            if let Some(config) = config {
                for file in &config.input_files {
                    argv.push(ctx.input_dir.join(file).to_string_lossy().into_owned());
                }
                argv.extend(config.parameters.iter().cloned());
            }
            argv
        }
        None => {
            let entry = find_entry_script(&ctx.version_dir(version))
                .ok_or_else(|| {
                    execution_error(format!(
                        "no entry script under {}",
                        ctx.version_dir(version).display()
                    ))
                })?;
            entry_argv(&entry, ctx)
        }
    };

    log::debug!("{} {version}: running {argv:?}", ctx.tool_name);
    let output = Command::new(&argv[0])
        .args(&argv[1..])
        .output()
        .map_err(|e| execution_error(format!("{}: {e}", argv[0])))?;

    let mut captured = String::from_utf8_lossy(&output.stdout).into_owned();
    captured.push_str(&String::from_utf8_lossy(&output.stderr));

    Ok(ToolInvocationResult {
        exit_succeeded: output.status.success(),
        captured_output: captured,
        artifact_path: artifact_override(ctx, resolution, version)
            .or_else(|| ctx.artifact_for(version).ok()),
        log_path: ctx.log_for(version).ok(),
    })
}

/// Config-declared artifact pattern for one side, relative to the artifacts
/// directory unless absolute.
fn artifact_override(ctx: &RunContext, resolution: &Resolution, version: &str) -> Option<PathBuf> {
    let config = resolution.config.as_ref()?;
    let pattern = if version == ctx.old_version {
        config.old_artifact_pattern.as_deref()
    } else {
        config.new_artifact_pattern.as_deref()
    }?;
    let pattern = pattern
        .replace("{version}", version)
        .replace("{tool}", &ctx.tool_name);
    let full = if Path::new(&pattern).is_absolute() {
        pattern
    } else {
        format!("{}/{pattern}", ctx.artifacts_dir.display())
    };
    glob_first(&full)
}

const ENTRY_EXTENSIONS: &[&str] = &["py", "sh", "exe", "bat", "cmd"];

fn find_entry_script(dir: &Path) -> Option<PathBuf> {
    for ext in ENTRY_EXTENSIONS {
        let pattern = format!("{}/*.{ext}", dir.display());
        let mut matches: Vec<PathBuf> = glob::glob(&pattern).ok()?.flatten().collect();
        matches.sort();
        if let Some(path) = matches.into_iter().next() {
            return Some(path);
        }
    }
    None
}

fn entry_argv(entry: &Path, ctx: &RunContext) -> Vec<String> {
    let entry_str = entry.to_string_lossy().into_owned();
    let input = ctx.input_dir.to_string_lossy().into_owned();
    let output = ctx.artifacts_dir.to_string_lossy().into_owned();
    match entry.extension().and_then(|e| e.to_str()) {
        Some("py") => {
            let python = which::which("python3")
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "python".to_string());
            vec![python, entry_str, input, output]
        }
        Some("sh") => vec!["sh".to_string(), entry_str, input, output],
        _ => vec![entry_str, input, output],
    }
}

/// The whole pipeline for one tool: run old, run new, compare. Execution
/// failures become an `Error` verdict; missing artifacts or logs degrade to
/// N/A criteria inside the comparator.
pub fn run_tool(ctx: &RunContext, resolution: &Resolution, journal: &mut RunLog) -> ComparisonVerdict {
    journal.line(&format!(
        "=== {} : {} → {} ===",
        ctx.tool_name, ctx.old_version, ctx.new_version
    ));

    let old_run = match run_version(ctx, resolution, journal, &ctx.old_version) {
        Ok(result) => result,
        Err(e) => {
            journal.line(&format!("実行エラー: {e}"));
            return ComparisonVerdict::error(
                &ctx.tool_name,
                &ctx.old_version,
                &ctx.new_version,
                e.to_string(),
            );
        }
    };
    let new_run = match run_version(ctx, resolution, journal, &ctx.new_version) {
        Ok(result) => result,
        Err(e) => {
            journal.line(&format!("実行エラー: {e}"));
            return ComparisonVerdict::error(
                &ctx.tool_name,
                &ctx.old_version,
                &ctx.new_version,
                e.to_string(),
            );
        }
    };

    let outcome = resolution.strategy.compare(
        old_run.artifact_path.as_deref(),
        new_run.artifact_path.as_deref(),
        old_run.log_path.as_deref(),
        new_run.log_path.as_deref(),
    );
    journal.line(&format!("比較結果: {}", outcome.detail));
    for criterion in &outcome.criteria {
        journal.line(&format!(
            "  [{}] {}: {}",
            criterion.status, criterion.name, criterion.description
        ));
    }

    let mut verdict = ComparisonVerdict::from_criteria(
        &ctx.tool_name,
        &ctx.old_version,
        &ctx.new_version,
        outcome.criteria,
        outcome.detail,
    );
    verdict.old_artifact = old_run.artifact_path;
    verdict.new_artifact = new_run.artifact_path;
    verdict.log_file = Some(journal.path().to_path_buf());
    verdict
}

fn run_version(
    ctx: &RunContext,
    resolution: &Resolution,
    journal: &mut RunLog,
    version: &str,
) -> Result<ToolInvocationResult, HarnessError> {
    let result = execute_version(ctx, resolution, version)?;
    journal.line(&format!(
        "{} {version}: exit {}",
        ctx.tool_name,
        if result.exit_succeeded { "ok" } else { "nonzero" }
    ));
    if !result.captured_output.is_empty() {
        journal.line(result.captured_output.trim_end());
    }
    if !result.exit_succeeded {
        return Err(HarnessError::Execution {
            tool: ctx.tool_name.clone(),
            version: version.to_string(),
            message: "nonzero exit status".to_string(),
        });
    }
    Ok(result)
}
