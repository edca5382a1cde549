//! Command Executor: run an external program and capture what it did.
//!
//! The program is spawned directly with an argument vector, never through a
//! shell. A non-zero exit is not an error here; it is reported through
//! [`CommandOutput::exit_status`]. Only infrastructure failures (program not
//! found, spawn, wait, pipe read) are returned as [`ExecError`].

use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

use crate::core::result::CommandOutput;

/// Infrastructure failure while running a command.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("executable not found: {program}")]
    NotFound { program: String },

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read output of {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} timed out after {timeout:?}")]
    TimedOut { program: String, timeout: Duration },
}

/// Abstraction over process execution so actions can run against fakes.
///
/// Executors are shared by reference across worker threads.
pub trait CommandExecutor: Send + Sync {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecError>;
}

/// Blocks until the child exits. No timeout is imposed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl CommandExecutor for SystemExecutor {
    #[instrument(skip_all, fields(program = %program))]
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecError> {
        let mut running = spawn_captured(program, args)?;
        let status = running.child.wait().map_err(|source| ExecError::Wait {
            program: program.to_string(),
            source,
        })?;
        running.finish(program, status)
    }
}

/// Caller-side deadline around process execution.
///
/// On expiry the child is killed and reaped, and [`ExecError::TimedOut`] is
/// returned; no partial output is reported. Descendants that inherited the
/// output pipes are not waited for: their reader threads are detached and
/// finish on their own once the pipes close.
#[derive(Debug, Clone, Copy)]
pub struct DeadlineExecutor {
    timeout: Duration,
}

impl DeadlineExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl CommandExecutor for DeadlineExecutor {
    #[instrument(skip_all, fields(program = %program, timeout_ms = self.timeout.as_millis() as u64))]
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecError> {
        let mut running = spawn_captured(program, args)?;
        let waited = running
            .child
            .wait_timeout(self.timeout)
            .map_err(|source| ExecError::Wait {
                program: program.to_string(),
                source,
            })?;

        match waited {
            Some(status) => running.finish(program, status),
            None => {
                warn!(timeout = ?self.timeout, "command timed out, killing");
                let reap = running.child.kill().and_then(|()| running.child.wait());
                if let Err(source) = reap {
                    return Err(ExecError::Wait {
                        program: program.to_string(),
                        source,
                    });
                }
                running.detach();
                Err(ExecError::TimedOut {
                    program: program.to_string(),
                    timeout: self.timeout,
                })
            }
        }
    }
}

type Reader = thread::JoinHandle<io::Result<Vec<u8>>>;

/// A spawned child whose stdout/stderr are being drained on reader threads.
struct Running {
    child: Child,
    stdout: Reader,
    stderr: Reader,
}

impl Running {
    /// Give up on the output without waiting for the pipes to close.
    fn detach(self) {
        debug!("detaching output readers");
        drop(self.stdout);
        drop(self.stderr);
    }

    fn collect(self, program: &str) -> Result<(Vec<u8>, Vec<u8>), ExecError> {
        let stdout = join_reader(self.stdout, program)?;
        let stderr = join_reader(self.stderr, program)?;
        Ok((stdout, stderr))
    }

    fn finish(self, program: &str, status: ExitStatus) -> Result<CommandOutput, ExecError> {
        let (stdout, stderr) = self.collect(program)?;
        let exit_status = status.code().unwrap_or(-1);
        debug!(exit_status, "command finished");
        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_status,
        })
    }
}

/// Spawn `program` with piped output, reading both pipes concurrently so a
/// chatty child cannot deadlock on a full pipe.
fn spawn_captured(program: &str, args: &[String]) -> Result<Running, ExecError> {
    debug!(?args, "spawning child process");
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| {
            error!(err = %source, "failed to spawn command");
            if source.kind() == io::ErrorKind::NotFound {
                ExecError::NotFound {
                    program: program.to_string(),
                }
            } else {
                ExecError::Spawn {
                    program: program.to_string(),
                    source,
                }
            }
        })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let (Some(stdout), Some(stderr)) = (stdout, stderr) else {
        let _ = child.kill();
        let _ = child.wait();
        return Err(ExecError::Spawn {
            program: program.to_string(),
            source: io::Error::other("output pipes were not captured"),
        });
    };

    Ok(Running {
        child,
        stdout: thread::spawn(move || read_all(stdout)),
        stderr: thread::spawn(move || read_all(stderr)),
    })
}

fn read_all<R: Read>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}

fn join_reader(handle: Reader, program: &str) -> Result<Vec<u8>, ExecError> {
    let result = match handle.join() {
        Ok(result) => result,
        Err(_) => Err(io::Error::other("output reader thread panicked")),
    };
    result.map_err(|source| ExecError::Io {
        program: program.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    /// Verifies stdout, stderr and a non-zero status are captured without an error.
    #[test]
    fn captures_output_and_nonzero_status() {
        let output = SystemExecutor
            .run("sh", &args(&["-c", "echo out; echo err >&2; exit 3"]))
            .expect("run");
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
        assert_eq!(output.exit_status, 3);
        assert!(!output.success());
    }

    #[test]
    fn arguments_are_not_shell_interpreted() {
        let output = SystemExecutor
            .run("echo", &args(&["$HOME", "a;b"]))
            .expect("run");
        assert_eq!(output.stdout, "$HOME a;b\n");
        assert!(output.success());
    }

    #[test]
    fn missing_executable_is_not_found() {
        let err = SystemExecutor
            .run("converge-definitely-missing-binary", &[])
            .unwrap_err();
        assert!(matches!(err, ExecError::NotFound { .. }));
        assert!(err.to_string().contains("converge-definitely-missing-binary"));
    }

    /// Verifies large output on both pipes does not deadlock the child.
    #[test]
    fn drains_large_output() {
        let output = SystemExecutor
            .run(
                "sh",
                &args(&["-c", "head -c 200000 /dev/zero; head -c 200000 /dev/zero >&2"]),
            )
            .expect("run");
        assert_eq!(output.stdout.len(), 200_000);
        assert_eq!(output.stderr.len(), 200_000);
    }

    #[test]
    fn deadline_passes_through_fast_commands() {
        let output = DeadlineExecutor::new(Duration::from_secs(10))
            .run("sh", &args(&["-c", "echo done"]))
            .expect("run");
        assert_eq!(output.stdout, "done\n");
        assert_eq!(output.exit_status, 0);
    }

    #[test]
    fn deadline_kills_slow_commands() {
        let err = DeadlineExecutor::new(Duration::from_millis(200))
            .run("sleep", &args(&["5"]))
            .unwrap_err();
        assert!(matches!(err, ExecError::TimedOut { .. }));
    }

    /// Verifies a grandchild still holding the output pipes does not stretch the deadline.
    #[test]
    fn deadline_does_not_wait_for_pipe_holding_descendants() {
        let started = std::time::Instant::now();
        let err = DeadlineExecutor::new(Duration::from_millis(200))
            .run("sh", &args(&["-c", "sleep 4; true"]))
            .unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(err, ExecError::TimedOut { .. }));
        assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
    }
}
