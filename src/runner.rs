use std::io::{self, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use wait_timeout::ChildExt;

/// Text recorded in place of output when a program exceeds its time limit.
pub const TIMEOUT_MARKER: &str = "Error: Command timed out.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Completed,
    TimedOut,
    ProcessError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    /// Standard output on success, otherwise the diagnostic text.
    pub output: String,
}

impl ExecutionResult {
    fn completed(output: String) -> Self {
        Self {
            status: ExecutionStatus::Completed,
            output,
        }
    }

    fn timed_out() -> Self {
        Self {
            status: ExecutionStatus::TimedOut,
            output: TIMEOUT_MARKER.to_string(),
        }
    }

    fn process_error(diagnostic: impl AsRef<str>) -> Self {
        Self {
            status: ExecutionStatus::ProcessError,
            output: format!("Error: {}", diagnostic.as_ref()),
        }
    }
}

fn drain<R>(mut pipe: R) -> Receiver<Vec<u8>>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send(buf);
    });
    rx
}

/// Waits for a pipe to reach EOF, but no later than `deadline`. `None` means
/// something (usually a background grandchild) still holds the pipe open.
fn collect(pipe: Option<Receiver<Vec<u8>>>, deadline: Instant) -> Option<String> {
    let Some(rx) = pipe else {
        return Some(String::new());
    };

    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(RecvTimeoutError::Timeout) => None,
        Err(RecvTimeoutError::Disconnected) => Some(String::new()),
    }
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        use std::os::unix::process::ExitStatusExt;

        fn describe_signal(status: ExitStatus) -> String {
            match status.signal() {
                Some(libc::SIGABRT) => "terminated by SIGABRT".to_string(),
                Some(libc::SIGSEGV) => "terminated by SIGSEGV".to_string(),
                Some(libc::SIGFPE) => "terminated by SIGFPE".to_string(),
                Some(libc::SIGKILL) => "terminated by SIGKILL".to_string(),
                Some(other) => format!("terminated by signal {other}"),
                None => "terminated abnormally".to_string(),
            }
        }
    } else {
        fn describe_signal(_status: ExitStatus) -> String {
            "terminated abnormally".to_string()
        }
    }
}

fn describe_abnormal_exit(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exited with status {code}"),
        None => describe_signal(status),
    }
}

fn spawn(argv: &[String]) -> io::Result<Child> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command line"))?;

    Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
}

/// Runs `argv` directly (no shell), feeding `input` on stdin, and waits at
/// most `timeout` for it to exit and close its output. Never fails: spawn errors, non-zero exits and
/// timeouts are all reported through [`ExecutionStatus`].
pub fn run_command(argv: &[String], input: &str, timeout: Duration) -> ExecutionResult {
    let deadline = Instant::now() + timeout;
    let mut child = match spawn(argv) {
        Ok(child) => child,
        Err(e) => {
            log::debug!("Failed to spawn {argv:?}: {e}");
            return ExecutionResult::process_error(e.to_string());
        }
    };

    // Feed stdin and drain both pipes concurrently, otherwise a chatty program
    // could block on a full pipe while we block on it.
    if let Some(mut stdin) = child.stdin.take() {
        let input = input.as_bytes().to_vec();
        thread::spawn(move || {
            // The program may exit without reading; a broken pipe is fine.
            let _ = stdin.write_all(&input);
        });
    }
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let status = match child.wait_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            // Reader threads are left detached: a grandchild may still hold the pipes.
            return ExecutionResult::timed_out();
        }
        Err(e) => {
            let _ = child.kill();
            let _ = child.wait();
            return ExecutionResult::process_error(e.to_string());
        }
    };

    // The time limit covers reading the pipes too; reader threads of a run
    // that overstays are left detached.
    if status.success() {
        match collect(stdout, deadline) {
            Some(output) => ExecutionResult::completed(output),
            None => ExecutionResult::timed_out(),
        }
    } else {
        match collect(stderr, deadline) {
            Some(diagnostic) if diagnostic.is_empty() => {
                ExecutionResult::process_error(describe_abnormal_exit(status))
            }
            Some(diagnostic) => ExecutionResult::process_error(diagnostic),
            None => ExecutionResult::timed_out(),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Instant;

    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn captures_stdout_and_feeds_stdin() {
        let r = run_command(&argv(&["cat"]), "1 2\n3\n", Duration::from_secs(5));
        assert_eq!(r.status, ExecutionStatus::Completed);
        assert_eq!(r.output, "1 2\n3\n");
    }

    #[test]
    fn nonzero_exit_reports_stderr() {
        let r = run_command(
            &argv(&["sh", "-c", "echo partial; echo boom >&2; exit 3"]),
            "",
            Duration::from_secs(5),
        );
        assert_eq!(r.status, ExecutionStatus::ProcessError);
        assert_eq!(r.output, "Error: boom\n");
    }

    #[test]
    fn silent_failure_reports_exit_status() {
        let r = run_command(&argv(&["sh", "-c", "exit 7"]), "", Duration::from_secs(5));
        assert_eq!(r.status, ExecutionStatus::ProcessError);
        assert_eq!(r.output, "Error: exited with status 7");
    }

    #[test]
    fn signal_death_is_named() {
        let r = run_command(&argv(&["sh", "-c", "kill -ABRT $$"]), "", Duration::from_secs(5));
        assert_eq!(r.status, ExecutionStatus::ProcessError);
        assert_eq!(r.output, "Error: terminated by SIGABRT");
    }

    #[test]
    fn timeout_kills_the_child_promptly() {
        let start = Instant::now();
        let r = run_command(&argv(&["sleep", "10"]), "", Duration::from_millis(200));
        assert_eq!(r.status, ExecutionStatus::TimedOut);
        assert_eq!(r.output, TIMEOUT_MARKER);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn background_process_holding_stdout_times_out() {
        let start = Instant::now();
        let r = run_command(
            &argv(&["sh", "-c", "echo 42; sleep 4 &"]),
            "",
            Duration::from_millis(300),
        );
        assert_eq!(r.status, ExecutionStatus::TimedOut);
        assert_eq!(r.output, TIMEOUT_MARKER);
        assert!(
            start.elapsed() < Duration::from_secs(2),
            "run took {:?} with a 300ms limit",
            start.elapsed()
        );
    }

    #[test]
    fn missing_program_is_a_process_error() {
        let r = run_command(
            &argv(&["definitely-not-a-real-launcher-xyz"]),
            "",
            Duration::from_secs(1),
        );
        assert_eq!(r.status, ExecutionStatus::ProcessError);
        assert!(r.output.starts_with("Error: "));
    }

    #[test]
    fn empty_command_line_is_a_process_error() {
        let r = run_command(&[], "", Duration::from_secs(1));
        assert_eq!(r.status, ExecutionStatus::ProcessError);
    }

    #[test]
    fn program_ignoring_large_input_does_not_hang() {
        let input = "x".repeat(1 << 20);
        let r = run_command(&argv(&["true"]), &input, Duration::from_secs(5));
        assert_eq!(r.status, ExecutionStatus::Completed);
        assert_eq!(r.output, "");
    }
}
