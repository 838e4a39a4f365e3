//! The `list` subcommand: show what the registry can resolve.

use crate::comparison::registry::{ComparatorRegistry, ResolutionKind};
use anyhow::Result;
use std::path::Path;

pub fn execute(tools_dir: &Path) -> Result<i32> {
    let registry = ComparatorRegistry::new(tools_dir);
    let names = registry.list_available();
    if names.is_empty() {
        println!("検証可能なツールはありません");
        return Ok(0);
    }

    println!("検証可能なツール:");
    for name in names {
        let resolution = registry.resolve(&name, None);
        let source = match resolution.kind {
            ResolutionKind::Config(path) => format!("設定ファイル {}", path.display()),
            ResolutionKind::Code => "組み込みコンパレータ".to_string(),
            ResolutionKind::Default => "デフォルト比較".to_string(),
        };
        println!("  {name} ({source})");
    }
    Ok(0)
}
