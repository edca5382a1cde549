//! The closed set of action kinds the engine can converge.
//!
//! Every kind exposes a name, a satisfaction check and an execution thunk;
//! [`Action::run`] puts the two behind the convergence gate. Adding a kind means
//! adding a variant here and a decoder arm in [`Action::decode`].

pub mod command;

use serde_json::Value;
use thiserror::Error;

use crate::core::gate::do_if;
use crate::core::predicate::NoHintPolicy;
use crate::core::result::ActionResult;
use crate::io::fs::StatError;
use crate::io::process::CommandExecutor;

pub use command::CommandAction;

/// Module name reported for entries whose module could not be determined.
pub const UNKNOWN_MODULE: &str = "unknown";

/// Failure to turn loosely-typed parameters into a typed [`Action`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("action is missing a string `module` field")]
    MissingModule,

    #[error("unknown module '{0}'")]
    UnknownModule(String),

    #[error("invalid parameters for module '{module}': {message}")]
    InvalidParams { module: String, message: String },
}

/// Failure while checking whether an action is already satisfied.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Stat(#[from] StatError),
}

/// Collaborators shared by every action during one invocation.
pub struct RunContext<'a> {
    pub executor: &'a dyn CommandExecutor,
    pub no_hint_policy: NoHintPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Command(CommandAction),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Command(_) => command::MODULE,
        }
    }

    pub fn is_satisfied(&self, ctx: &RunContext<'_>) -> Result<bool, CheckError> {
        match self {
            Action::Command(action) => Ok(action.is_satisfied(ctx.no_hint_policy)?),
        }
    }

    pub fn execute(&self, ctx: &RunContext<'_>) -> ActionResult {
        match self {
            Action::Command(action) => action.execute(ctx.executor),
        }
    }

    /// Check, and act only if not yet converged. Always yields one result.
    pub fn run(&self, ctx: &RunContext<'_>) -> ActionResult {
        do_if(self.name(), || self.is_satisfied(ctx), || self.execute(ctx))
    }

    /// Decode `params` for the named module. The `module` key itself, if
    /// present in `params`, is ignored along with any other unknown key.
    pub fn decode(module: &str, params: Value) -> Result<Action, DecodeError> {
        match module {
            command::MODULE => {
                let action: CommandAction =
                    serde_json::from_value(params).map_err(|err| invalid(module, err))?;
                if action.execute.trim().is_empty() {
                    return Err(invalid(module, "`execute` must not be blank"));
                }
                Ok(Action::Command(action))
            }
            other => Err(DecodeError::UnknownModule(other.to_string())),
        }
    }

    /// Decode a full entry that names its own module under `module`.
    pub fn decode_entry(entry: &Value) -> Result<Action, DecodeError> {
        let module = entry
            .get("module")
            .and_then(Value::as_str)
            .ok_or(DecodeError::MissingModule)?;
        Action::decode(module, entry.clone())
    }
}

fn invalid(module: &str, message: impl ToString) -> DecodeError {
    DecodeError::InvalidParams {
        module: module.to_string(),
        message: message.to_string(),
    }
}
