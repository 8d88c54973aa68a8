use std::fs;
use std::path::{Path, PathBuf};

use crate::config::LanguageTable;

/// The file picked as a submission's runnable program and how to launch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub file: PathBuf,
    pub command: Vec<String>,
}

impl EntryPoint {
    /// `file:///` URI of the selected file, for the report.
    pub fn location(&self) -> String {
        let path = fs::canonicalize(&self.file).unwrap_or_else(|_| self.file.clone());
        let path = path.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/");
        format!("file:///{}", path.trim_start_matches('/'))
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

/// Picks the first file, in file-name order, whose extension is in `languages`
/// and whose contents carry that language's entry marker.
///
/// Later qualifying files are ignored. `None` means the submission has no
/// runnable program, which the caller records as a failure.
pub fn resolve(files: &[PathBuf], languages: &LanguageTable) -> Option<EntryPoint> {
    let mut candidates: Vec<&PathBuf> = files.iter().collect();
    candidates.sort_by(|a, b| a.file_name().cmp(&b.file_name()).then_with(|| a.cmp(b)));

    for path in candidates {
        let Some(kind) = extension(path).and_then(|ext| languages.get(ext)) else {
            continue;
        };

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                log::debug!("Skipping unreadable candidate {}: {e}", path.display());
                continue;
            }
        };

        if !contents.contains(&kind.entry_marker) {
            log::debug!(
                "{} has no {:?}, not an entry point",
                path.display(),
                kind.entry_marker
            );
            continue;
        }

        let mut command = kind.launcher.clone();
        command.push(path.to_string_lossy().into_owned());

        return Some(EntryPoint {
            file: path.clone(),
            command,
        });
    }

    None
}
