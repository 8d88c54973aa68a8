use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    #[serde(rename = "OK")]
    Pass,
    #[serde(rename = "Error")]
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverallRecord {
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub verdict: Verdict,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_point_location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    pub reference_answer: String,
    #[serde(flatten)]
    pub students: BTreeMap<String, StudentRecord>,
}

/// Verdicts accumulated over one grading run.
///
/// A student's overall verdict starts at [`Verdict::Pass`] and only ever
/// moves to [`Verdict::Fail`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultAggregate {
    overall: BTreeMap<String, OverallRecord>,
    details: BTreeMap<String, ProblemDetails>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
}

impl ResultAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_problem(&mut self, problem: &str, reference_answer: &str) {
        self.details
            .entry(problem.to_string())
            .or_insert_with(|| ProblemDetails {
                reference_answer: reference_answer.to_string(),
                students: BTreeMap::new(),
            });
    }

    /// Stores the per-problem record and folds its verdict into the
    /// student's overall verdict.
    pub fn record(&mut self, problem: &str, student: &str, record: StudentRecord) {
        let failed = record.verdict == Verdict::Fail;

        self.overall
            .entry(student.to_string())
            .or_insert(OverallRecord {
                verdict: Verdict::Pass,
            });

        self.details
            .entry(problem.to_string())
            .or_insert_with(|| ProblemDetails {
                reference_answer: String::new(),
                students: BTreeMap::new(),
            })
            .students
            .insert(student.to_string(), record);

        if failed {
            self.mark_failed(student);
        }
    }

    /// Idempotent.
    pub fn mark_failed(&mut self, student: &str) {
        self.overall
            .entry(student.to_string())
            .or_insert(OverallRecord {
                verdict: Verdict::Fail,
            })
            .verdict = Verdict::Fail;
    }

    pub fn overall_verdict(&self, student: &str) -> Option<Verdict> {
        self.overall.get(student).map(|r| r.verdict)
    }

    pub fn detail(&self, problem: &str, student: &str) -> Option<&StudentRecord> {
        self.details.get(problem)?.students.get(student)
    }

    pub fn problem(&self, problem: &str) -> Option<&ProblemDetails> {
        self.details.get(problem)
    }

    pub fn problems(&self) -> impl Iterator<Item = &str> {
        self.details.keys().map(String::as_str)
    }

    pub fn summary(&self) -> Summary {
        self.overall
            .values()
            .fold(Summary::default(), |mut acc, r| {
                match r.verdict {
                    Verdict::Pass => acc.passed += 1,
                    Verdict::Fail => acc.failed += 1,
                }
                acc
            })
    }
}
