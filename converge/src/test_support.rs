//! Test-only helpers: scripted and recording executors, playbook fixtures.

use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::core::result::CommandOutput;
use crate::io::process::{CommandExecutor, ExecError};

type Call = (String, Vec<String>);

/// Build a deterministic [`CommandOutput`].
pub fn command_output(stdout: &str, stderr: &str, exit_status: i32) -> CommandOutput {
    CommandOutput {
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
        exit_status,
    }
}

/// Executor that replays predetermined responses in order and records every
/// invocation. Running out of responses is reported as a spawn failure.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    responses: Mutex<VecDeque<Result<CommandOutput, ExecError>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedExecutor {
    pub fn new(responses: Vec<Result<CommandOutput, ExecError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl CommandExecutor for ScriptedExecutor {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((program.to_string(), args.to_vec()));
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| {
                Err(ExecError::Spawn {
                    program: program.to_string(),
                    source: io::Error::other("no scripted response left"),
                })
            })
    }
}

/// Wraps a real executor and records every invocation passed through it.
#[derive(Debug, Default)]
pub struct RecordingExecutor<E> {
    inner: E,
    calls: Mutex<Vec<Call>>,
}

impl<E: CommandExecutor> RecordingExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl<E: CommandExecutor> CommandExecutor for RecordingExecutor<E> {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((program.to_string(), args.to_vec()));
        self.inner.run(program, args)
    }
}

/// Temporary working directory for playbook and config fixtures.
pub struct TestDir {
    temp: TempDir,
}

impl TestDir {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        Ok(Self { temp })
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.temp.path().join(name)
    }

    /// Write `contents` to `name` inside the directory and return its path.
    pub fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.join(name);
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }
}
