//! Uniform outcome record emitted by every action invocation.
//!
//! Reporting, aggregation and exit-code decisions only ever look at
//! [`ActionResult`]; no action kind reports anything else to its caller.

use serde::{Deserialize, Serialize};

/// Captured output of one external process invocation.
///
/// `exit_status == 0` is the caller's definition of success; this type does not
/// classify anything itself. A child terminated by a signal reports `-1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_status: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

/// Action-specific payload attached to results produced on the execution path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModuleOutput {
    Command(CommandOutput),
}

/// Outcome of one action invocation.
///
/// Invariants upheld by the constructors:
/// - `succeeded == false` implies `error.is_some()`
/// - the skip path is `succeeded=true, changed=false, error=None, output=None`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Name of the action kind that produced this result. Never empty.
    pub module: String,
    pub succeeded: bool,
    /// True iff system state was mutated (or may have been).
    pub changed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<ModuleOutput>,
}

impl ActionResult {
    /// State already converged; nothing was done.
    pub fn unchanged(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            succeeded: true,
            changed: false,
            error: None,
            output: None,
        }
    }

    /// Mutation performed successfully.
    pub fn changed(module: impl Into<String>, output: Option<ModuleOutput>) -> Self {
        Self {
            module: module.into(),
            succeeded: true,
            changed: true,
            error: None,
            output,
        }
    }

    /// Failure before anything could have touched system state.
    pub fn failed(module: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            succeeded: false,
            changed: false,
            error: Some(error.into()),
            output: None,
        }
    }

    /// Failure after the mutation ran; it may have been partially effective.
    pub fn failed_after_change(
        module: impl Into<String>,
        error: impl Into<String>,
        output: Option<ModuleOutput>,
    ) -> Self {
        Self {
            module: module.into(),
            succeeded: false,
            changed: true,
            error: Some(error.into()),
            output,
        }
    }

    /// Captured command output, if this result carries one.
    pub fn command_output(&self) -> Option<&CommandOutput> {
        match &self.output {
            Some(ModuleOutput::Command(output)) => Some(output),
            None => None,
        }
    }
}

/// Counts over a batch of results, in playbook order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResultSummary {
    pub ok: usize,
    pub changed: usize,
    pub failed: usize,
}

impl ResultSummary {
    pub fn from_results(results: &[ActionResult]) -> Self {
        results.iter().fold(Self::default(), |mut acc, result| {
            if result.succeeded {
                acc.ok += 1;
            } else {
                acc.failed += 1;
            }
            if result.changed {
                acc.changed += 1;
            }
            acc
        })
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}
