use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::Deserialize;

use crate::grader::GradeError;
use crate::runner_file_utils::read_corpus;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Terminal coloring
    #[arg(short = 'c', long, value_parser = ["on", "off"])]
    pub color: Option<String>,

    /// Quiet (use -q through -qq)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Debug information
    #[arg(long)]
    pub debug: bool,

    /// Directory holding the reference inputs, one file per problem
    #[arg(long, default_value = "input")]
    pub input_dir: PathBuf,

    /// Directory holding the reference answers, one file per problem
    #[arg(long, default_value = "answers")]
    pub answers_dir: PathBuf,

    /// Directory holding one sub-directory of source files per student
    #[arg(long, default_value = "dataset")]
    pub dataset_dir: PathBuf,

    /// Directory the report is written to
    #[arg(long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Report file name, without the .json extension
    #[arg(long, default_value = "grading_result")]
    pub report_name: String,

    /// Execution time limit (1000 ms)
    #[arg(long, value_parser = clap::value_parser!(u64), default_value = "1000")]
    pub limit_run: u64,

    /// Grading mode; auto picks self-check when there is no input corpus
    #[arg(long, value_enum, default_value_t = ModeArg::Auto)]
    pub mode: ModeArg,

    /// TOML file replacing the built-in launcher table
    #[arg(long)]
    pub languages: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Auto,
    Verify,
    SelfCheck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradingMode {
    /// Feed each problem's reference input, compare against its answer.
    Verify,
    /// No input corpus: the answer is both the stimulus and the target.
    SelfCheck,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LanguageKind {
    /// Program and leading arguments; the source path is appended.
    pub launcher: Vec<String>,
    /// Substring a source file must contain to count as the entry point.
    pub entry_marker: String,
}

/// Maps a source extension (without the dot) to how it is launched.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct LanguageTable {
    kinds: BTreeMap<String, LanguageKind>,
}

impl LanguageTable {
    pub fn new() -> Self {
        Self {
            kinds: BTreeMap::new(),
        }
    }

    pub fn with(mut self, ext: &str, launcher: &[&str], entry_marker: &str) -> Self {
        self.kinds.insert(
            ext.to_string(),
            LanguageKind {
                launcher: launcher.iter().map(|s| s.to_string()).collect(),
                entry_marker: entry_marker.to_string(),
            },
        );
        self
    }

    pub fn get(&self, ext: &str) -> Option<&LanguageKind> {
        self.kinds.get(ext)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, GradeError> {
        let text = fs::read_to_string(path)
            .map_err(|e| GradeError::ReadLanguageTable(path.to_owned(), e))?;
        toml::from_str(&text).map_err(|e| GradeError::InvalidLanguageTable(path.to_owned(), e))
    }
}

impl Default for LanguageTable {
    fn default() -> Self {
        Self::new()
            .with("py", &["python"], "__main__")
            .with("java", &["java"], "public static void main")
            .with("cpp", &["g++"], "int main")
            .with("c", &["gcc"], "int main")
    }
}

/// Everything the grader needs for one run. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct GraderConfig {
    pub input_dir: PathBuf,
    pub answers_dir: PathBuf,
    pub dataset_dir: PathBuf,
    pub output_dir: PathBuf,
    pub report_name: String,
    pub timeout: Duration,
    pub mode: GradingMode,
    pub languages: LanguageTable,
    pub quiet: bool,
}

impl GraderConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self, GradeError> {
        let languages = match &cli.languages {
            Some(path) => LanguageTable::from_toml_file(path)?,
            None => LanguageTable::default(),
        };

        Ok(Self {
            input_dir: cli.input_dir.clone(),
            answers_dir: cli.answers_dir.clone(),
            dataset_dir: cli.dataset_dir.clone(),
            output_dir: cli.output_dir.clone(),
            report_name: cli.report_name.clone(),
            timeout: Duration::from_millis(cli.limit_run),
            mode: resolve_mode(cli.mode, &cli.input_dir),
            languages,
            quiet: cli.quiet > 0,
        })
    }
}

fn resolve_mode(mode: ModeArg, input_dir: &Path) -> GradingMode {
    match mode {
        ModeArg::Verify => GradingMode::Verify,
        ModeArg::SelfCheck => GradingMode::SelfCheck,
        ModeArg::Auto => {
            let has_inputs = matches!(
                read_corpus(input_dir),
                Ok(Some(corpus)) if !corpus.is_empty()
            );
            if has_inputs {
                GradingMode::Verify
            } else {
                log::warn!(
                    "No input data found in {}, checking answers against themselves",
                    input_dir.display()
                );
                GradingMode::SelfCheck
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn default_table_knows_the_usual_languages() {
        let table = LanguageTable::default();
        assert_eq!(table.get("py").unwrap().launcher, vec!["python"]);
        assert_eq!(
            table.get("java").unwrap().entry_marker,
            "public static void main"
        );
        assert_eq!(table.get("c").unwrap().entry_marker, "int main");
        assert!(table.get("rs").is_none());
    }

    #[test]
    fn language_table_loads_from_toml() {
        let dir = TempDir::new("langs").unwrap();
        let path = dir.path().join("languages.toml");
        fs::write(
            &path,
            "[py]\nlauncher = [\"python3\", \"-u\"]\nentry_marker = \"__main__\"\n",
        )
        .unwrap();

        let table = LanguageTable::from_toml_file(&path).unwrap();
        assert_eq!(table.get("py").unwrap().launcher, vec!["python3", "-u"]);
        assert!(table.get("java").is_none());
    }

    #[test]
    fn malformed_language_table_is_rejected() {
        let dir = TempDir::new("langs").unwrap();
        let path = dir.path().join("languages.toml");
        fs::write(&path, "[py]\nlauncher = 3\n").unwrap();

        assert!(matches!(
            LanguageTable::from_toml_file(&path),
            Err(GradeError::InvalidLanguageTable(..))
        ));
    }

    #[test]
    fn cli_defaults_match_the_fixed_layout() {
        let cli = Cli::parse_from(["auto_grader", "--mode", "verify"]);
        let config = GraderConfig::from_cli(&cli).unwrap();
        assert_eq!(config.input_dir, PathBuf::from("input"));
        assert_eq!(config.dataset_dir, PathBuf::from("dataset"));
        assert_eq!(config.timeout, Duration::from_secs(1));
        assert_eq!(config.mode, GradingMode::Verify);
    }

    #[test]
    fn auto_mode_follows_the_input_corpus() {
        let dir = TempDir::new("mode").unwrap();
        let input = dir.path().join("input");
        assert_eq!(resolve_mode(ModeArg::Auto, &input), GradingMode::SelfCheck);

        fs::create_dir(&input).unwrap();
        assert_eq!(resolve_mode(ModeArg::Auto, &input), GradingMode::SelfCheck);

        fs::create_dir(input.join("empty")).unwrap();
        fs::write(input.join("binary"), [0xff, 0xfe]).unwrap();
        assert_eq!(resolve_mode(ModeArg::Auto, &input), GradingMode::SelfCheck);

        fs::write(input.join("p1"), "1\n").unwrap();
        assert_eq!(resolve_mode(ModeArg::Auto, &input), GradingMode::Verify);
        assert_eq!(
            resolve_mode(ModeArg::SelfCheck, &input),
            GradingMode::SelfCheck
        );
    }
}
