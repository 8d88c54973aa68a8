use auto_grader::{config::Cli, run};
use clap::Parser;

fn main() {
    let cli = Cli::parse();

    let level = match (cli.debug, cli.quiet) {
        (true, _) => "debug",
        (false, 0) => "info",
        (false, 1) => "warn",
        (false, _) => "error",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
