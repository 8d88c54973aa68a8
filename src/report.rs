use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::aggregate::ResultAggregate;

/// Writes the aggregate as pretty JSON to `<output_dir>/<name>.json`.
pub fn write_report(aggregate: &ResultAggregate, output_dir: &Path, name: &str) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Cannot create output dir {}", output_dir.display()))?;

    let path = output_dir.join(format!("{name}.json"));
    let json = serde_json::to_string_pretty(aggregate).context("Cannot serialize report")?;
    fs::write(&path, json).with_context(|| format!("Cannot write {}", path.display()))?;

    Ok(path)
}
