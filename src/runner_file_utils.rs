use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Collects all files from a directory recursively, sorted by path
pub fn collect_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if !dir.is_dir() {
        return Err(anyhow::anyhow!(
            "Path is not a directory: {}",
            dir.display()
        ));
    }

    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
    {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();

        if path.is_file() {
            files.push(path);
        } else if path.is_dir() {
            files.extend(collect_files(&path)?);
        }
    }

    files.sort();
    Ok(files)
}

/// Immediate sub-directories of the dataset directory, sorted by name.
/// Each one holds a single student's submission.
pub fn list_student_dirs(dataset: &Path) -> Result<Vec<PathBuf>> {
    if !dataset.is_dir() {
        log::warn!("Dataset folder does not exist: {}", dataset.display());
        return Ok(Vec::new());
    }

    let mut dirs = Vec::new();
    for entry in fs::read_dir(dataset)
        .with_context(|| format!("Failed to read dataset {}", dataset.display()))?
    {
        let path = entry.context("Failed to read directory entry")?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }

    dirs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(dirs)
}

pub fn student_id(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.to_string_lossy().into_owned())
}

/// Reads every file under `dir` into a map keyed by file name.
///
/// Returns `None` when the directory does not exist. Files that are not valid
/// UTF-8 are skipped with a warning.
pub fn read_corpus(dir: &Path) -> Result<Option<BTreeMap<String, String>>> {
    if !dir.exists() {
        return Ok(None);
    }

    let mut corpus = BTreeMap::new();
    for path in collect_files(dir)? {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };

        match fs::read_to_string(&path) {
            Ok(text) => {
                if corpus.insert(name.clone(), text).is_some() {
                    log::warn!("Duplicate file name {name} in {}", dir.display());
                }
            }
            Err(e) => log::warn!("Cannot read {}: {e}", path.display()),
        }
    }

    Ok(Some(corpus))
}
