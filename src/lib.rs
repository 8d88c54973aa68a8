use anyhow::Result;
use colored::Colorize;

use config::GraderConfig;
use grader::{build_problems, Grader, Submission};
use runner_file_utils::{list_student_dirs, read_corpus};

pub mod aggregate;
pub mod config;
pub mod digest;
pub mod grader;
pub mod report;
pub mod resolver;
pub mod runner;
pub mod runner_file_utils;

pub fn run(cli: config::Cli) -> Result<()> {
    match cli.color.as_deref() {
        Some("off") => colored::control::set_override(false),
        Some("on") => colored::control::set_override(true),
        _ => {}
    }

    let config = GraderConfig::from_cli(&cli)?;

    let inputs = read_corpus(&config.input_dir)?;
    if inputs.is_none() {
        log::warn!("Input folder {} does not exist.", config.input_dir.display());
    }
    let answers = read_corpus(&config.answers_dir)?.unwrap_or_else(|| {
        log::warn!("Answers folder does not exist: {}", config.answers_dir.display());
        Default::default()
    });

    let submissions: Vec<Submission> = list_student_dirs(&config.dataset_dir)?
        .iter()
        .map(|dir| Submission::load(dir))
        .collect();

    let problems = build_problems(config.mode, inputs.as_ref(), &answers);
    let aggregate = Grader::new(&config).grade(&problems, &submissions)?;

    let path = report::write_report(&aggregate, &config.output_dir, &config.report_name)?;
    let summary = aggregate.summary();

    println!(
        "Students: {} passed, {} failed",
        summary.passed.to_string().green(),
        summary.failed.to_string().red()
    );
    println!("Output saved to {}", path.display());

    Ok(())
}
