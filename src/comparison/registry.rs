//! Comparator resolution: declarative config first, then shipped code
//! comparators, then the byte-equality fallback. Resolution never fails; an
//! unknown tool degrades to the fallback with a warning.

use crate::comparison::builtin::{DemoToolComparator, Icc2SmokeComparator, SampleToolComparator};
use crate::comparison::strategy::{ComparatorStrategy, DefaultComparator};
use crate::config::{self, ComparatorConfig};
use std::path::{Path, PathBuf};

/// Where a resolution came from, for logging and the `list` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionKind {
    Config(PathBuf),
    Code,
    Default,
}

pub struct Resolution {
    pub strategy: Box<dyn ComparatorStrategy>,
    pub kind: ResolutionKind,
    pub config: Option<ComparatorConfig>,
}

pub struct ComparatorRegistry {
    base_dir: PathBuf,
}

impl ComparatorRegistry {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Resolve the comparator for one tool. `override_name` comes from the
    /// command line and replaces the tool name for lookup purposes; a
    /// trailing `_comparator` suffix on it is accepted and stripped.
    pub fn resolve(&self, tool_name: &str, override_name: Option<&str>) -> Resolution {
        let lookup = override_name
            .map(|name| name.strip_suffix("_comparator").unwrap_or(name))
            .unwrap_or(tool_name);

        if let Some((path, config)) = self.find_config(lookup) {
            log::info!("{tool_name}: using comparator config {}", path.display());
            return Resolution {
                strategy: Box::new(
                    crate::comparison::config_strategy::ConfigComparator::new(
                        tool_name,
                        config.clone(),
                    ),
                ),
                kind: ResolutionKind::Config(path),
                config: Some(config),
            };
        }

        if let Some(strategy) = builtin_for(lookup) {
            log::info!("{tool_name}: using the {} code comparator", strategy.name());
            return Resolution {
                strategy,
                kind: ResolutionKind::Code,
                config: None,
            };
        }

        log::warn!(
            "{tool_name}: no comparator config or code comparator found, \
             falling back to plain content comparison. Add \
             configs/{lookup}.yaml or comparators/configs/{lookup}.yaml to customize."
        );
        Resolution {
            strategy: Box::new(DefaultComparator),
            kind: ResolutionKind::Default,
            config: None,
        }
    }

    fn find_config(&self, tool_name: &str) -> Option<(PathBuf, ComparatorConfig)> {
        for path in config::candidate_config_paths(&self.base_dir, tool_name) {
            if !path.exists() {
                continue;
            }
            match config::load_comparator_config(&path) {
                Ok(config) => return Some((path, config)),
                Err(e) => {
                    log::warn!("skipping unusable comparator config: {e}");
                }
            }
        }
        None
    }

    /// Tool names that have a config file or a code comparator, for batch
    /// runs and the `list` command. Sorted and de-duplicated.
    pub fn list_available(&self) -> Vec<String> {
        let mut names: Vec<String> =
            vec!["sampletool".into(), "demotool".into(), "icc2_smoke".into()];
        for dir in ["comparators/configs", "configs"] {
            let dir = self.base_dir.join(dir);
            let Ok(entries) = std::fs::read_dir(&dir) else { continue };
            for entry in entries.flatten() {
                let path = entry.path();
                if !has_config_extension(&path) {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.strip_suffix("_comparator").unwrap_or(stem).to_string());
                }
            }
        }
        names.sort();
        names.dedup();
        names
    }
}

fn has_config_extension(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml" | "json")
    )
}

fn builtin_for(name: &str) -> Option<Box<dyn ComparatorStrategy>> {
    match name.to_lowercase().as_str() {
        "sampletool" => Some(Box::new(SampleToolComparator)),
        "demotool" => Some(Box::new(DemoToolComparator)),
        "icc2_smoke" => Some(Box::new(Icc2SmokeComparator)),
        _ => None,
    }
}
