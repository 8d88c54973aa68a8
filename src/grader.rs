use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use colored::Colorize;
use thiserror::Error;

use crate::aggregate::{ResultAggregate, StudentRecord, Verdict};
use crate::config::{GraderConfig, GradingMode};
use crate::digest::{self, Fingerprint};
use crate::resolver;
use crate::runner::{self, ExecutionStatus};
use crate::runner_file_utils::{collect_files, student_id};

/// Output recorded for a submission with no runnable entry point.
pub const NOT_FOUND_MARKER: &str = "Not Found File";

#[derive(Error, Debug)]
pub enum GradeError {
    #[error("No dataset data found in {0}")]
    EmptyDataset(PathBuf),
    #[error("Cannot read language table {0}: {1}")]
    ReadLanguageTable(PathBuf, #[source] io::Error),
    #[error("Invalid language table {0}: {1}")]
    InvalidLanguageTable(PathBuf, #[source] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub name: String,
    /// Fed to the program on stdin.
    pub input: String,
    pub answer: String,
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub student_id: String,
    pub files: Vec<PathBuf>,
}

impl Submission {
    pub fn load(dir: &Path) -> Self {
        let files = collect_files(dir).unwrap_or_else(|e| {
            log::warn!("Cannot list submission {}: {e:#}", dir.display());
            Vec::new()
        });

        Self {
            student_id: student_id(dir),
            files,
        }
    }
}

/// Pairs reference inputs with answers according to `mode`.
///
/// In [`GradingMode::Verify`] only problems present in both corpora are kept;
/// every mismatch is logged and skipped. In [`GradingMode::SelfCheck`] each
/// answer doubles as its own input.
pub fn build_problems(
    mode: GradingMode,
    inputs: Option<&BTreeMap<String, String>>,
    answers: &BTreeMap<String, String>,
) -> Vec<Problem> {
    if answers.is_empty() {
        log::warn!("No answers data found.");
    }

    match mode {
        GradingMode::SelfCheck => answers
            .iter()
            .map(|(name, answer)| Problem {
                name: name.clone(),
                input: answer.clone(),
                answer: answer.clone(),
            })
            .collect(),
        GradingMode::Verify => {
            let Some(inputs) = inputs else {
                log::warn!("No input data found.");
                return Vec::new();
            };

            if inputs.len() != answers.len() {
                log::warn!(
                    "Input and answers data do not match ({} inputs, {} answers)",
                    inputs.len(),
                    answers.len()
                );
            }

            for name in answers.keys().filter(|name| !inputs.contains_key(*name)) {
                log::warn!("{name} not found in input data, skipping");
            }

            inputs
                .iter()
                .filter_map(|(name, input)| match answers.get(name) {
                    Some(answer) => Some(Problem {
                        name: name.clone(),
                        input: input.clone(),
                        answer: answer.clone(),
                    }),
                    None => {
                        log::warn!("{name} not found in answers data, skipping");
                        None
                    }
                })
                .collect()
        }
    }
}

pub struct Grader<'a> {
    config: &'a GraderConfig,
}

impl<'a> Grader<'a> {
    pub fn new(config: &'a GraderConfig) -> Self {
        Self { config }
    }

    /// Grades every submission against every problem, one pair at a time.
    /// Only an empty set of submissions is an error.
    pub fn grade(
        &self,
        problems: &[Problem],
        submissions: &[Submission],
    ) -> Result<ResultAggregate, GradeError> {
        if submissions.is_empty() {
            return Err(GradeError::EmptyDataset(self.config.dataset_dir.clone()));
        }

        let mut aggregate = ResultAggregate::new();

        for problem in problems {
            log::info!("Processing {}...", problem.name);
            aggregate.begin_problem(&problem.name, &problem.answer);
            let expected = digest::digest(&problem.answer);
            log::debug!("{} answer digest {expected}", problem.name);

            for submission in submissions {
                let record = self.grade_pair(problem, &expected, submission);
                aggregate.record(&problem.name, &submission.student_id, record);
            }
        }

        Ok(aggregate)
    }

    fn grade_pair(
        &self,
        problem: &Problem,
        expected: &Fingerprint,
        submission: &Submission,
    ) -> StudentRecord {
        let id = &submission.student_id;

        let Some(entry) = resolver::resolve(&submission.files, &self.config.languages) else {
            self.report(format!("{id} : no runnable file").red());
            return StudentRecord {
                verdict: Verdict::Fail,
                output: NOT_FOUND_MARKER.to_string(),
                entry_point_location: None,
            };
        };

        log::debug!("{id}: running {:?}", entry.command);
        let result = runner::run_command(&entry.command, &problem.input, self.config.timeout);

        let verdict = if digest::equal(&digest::digest(&result.output), expected) {
            self.report(format!("{id} : OK").green());
            Verdict::Pass
        } else {
            match result.status {
                ExecutionStatus::TimedOut => self.report(format!("{id} : timed out").yellow()),
                _ => self.report(format!("{id} : Error").red()),
            }
            Verdict::Fail
        };

        StudentRecord {
            verdict,
            output: result.output,
            entry_point_location: Some(entry.location()),
        }
    }

    fn report(&self, line: colored::ColoredString) {
        if !self.config.quiet {
            println!("{line}");
        }
    }
}
