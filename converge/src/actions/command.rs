//! `command` action: run an external program unless its hints say the work is
//! already done.
//!
//! `execute` is split on whitespace into program and arguments. There is no
//! quoting support, so arguments cannot contain spaces.

use std::path::PathBuf;

use serde::{Deserialize, Deserializer};
use tracing::{info, warn};

use crate::core::predicate::{NoHintPolicy, Predicate, satisfied_or_policy};
use crate::core::result::{ActionResult, ModuleOutput};
use crate::io::fs::{StatError, path_absent, path_exists};
use crate::io::process::CommandExecutor;

pub const MODULE: &str = "command";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandAction {
    /// Command line to run, e.g. `touch /tmp/marker`.
    pub execute: String,
    /// Satisfied once this path exists.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub creates: Option<PathBuf>,
    /// Satisfied once this path is gone.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub removes: Option<PathBuf>,
}

impl CommandAction {
    pub fn new(execute: impl Into<String>) -> Self {
        Self {
            execute: execute.into(),
            creates: None,
            removes: None,
        }
    }

    pub fn with_creates(mut self, path: impl Into<PathBuf>) -> Self {
        self.creates = Some(path.into());
        self
    }

    pub fn with_removes(mut self, path: impl Into<PathBuf>) -> Self {
        self.removes = Some(path.into());
        self
    }

    /// Program and argument vector, or `None` for a blank command line.
    pub fn argv(&self) -> Option<(&str, Vec<String>)> {
        let mut parts = self.execute.split_whitespace();
        let program = parts.next()?;
        Some((program, parts.map(str::to_string).collect()))
    }

    /// Satisfied when every configured hint holds: `creates` exists and
    /// `removes` is absent. With no hints, `policy` decides.
    pub fn is_satisfied(&self, policy: NoHintPolicy) -> Result<bool, StatError> {
        let mut predicates: Vec<Predicate<'_, StatError>> = Vec::new();
        if let Some(path) = self.creates.as_deref() {
            predicates.push(Box::new(move || path_exists(path)));
        }
        if let Some(path) = self.removes.as_deref() {
            predicates.push(Box::new(move || path_absent(path)));
        }
        satisfied_or_policy(predicates, policy)
    }

    pub fn execute(&self, executor: &dyn CommandExecutor) -> ActionResult {
        let Some((program, args)) = self.argv() else {
            return ActionResult::failed(MODULE, "empty command line");
        };

        let output = match executor.run(program, &args) {
            Ok(output) => output,
            Err(err) => {
                warn!(program, error = %err, "command could not be run");
                return ActionResult::failed(MODULE, err.to_string());
            }
        };

        info!(program, exit_status = output.exit_status, "command ran");
        if output.success() {
            ActionResult::changed(MODULE, Some(ModuleOutput::Command(output)))
        } else {
            let stderr = output.stderr.clone();
            ActionResult::failed_after_change(MODULE, stderr, Some(ModuleOutput::Command(output)))
        }
    }
}

/// An empty string means "not configured".
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|path| !path.is_empty()).map(PathBuf::from))
}
