//! Orchestration for `converge apply`: run every playbook entry in order and
//! collect one result per entry.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use crate::actions::RunContext;
use crate::core::result::{ActionResult, ResultSummary};
use crate::io::config::{EngineConfig, load_config};
use crate::io::playbook::{Playbook, load_playbook};
use crate::io::process::{CommandExecutor, DeadlineExecutor, SystemExecutor};

/// Results of one playbook application, in playbook order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    pub results: Vec<ActionResult>,
    pub summary: ResultSummary,
    /// Entries not evaluated because `stop_on_failure` cut the run short.
    pub skipped_after_failure: usize,
}

impl ApplyReport {
    pub fn exit_code(&self) -> i32 {
        if self.summary.all_succeeded() {
            crate::exit_codes::OK
        } else {
            crate::exit_codes::FAILED
        }
    }
}

/// Executor matching the configured deadline, if any.
pub fn executor_for(config: &EngineConfig) -> Box<dyn CommandExecutor> {
    match config.command_timeout() {
        Some(timeout) => Box::new(DeadlineExecutor::new(timeout)),
        None => Box::new(SystemExecutor),
    }
}

/// Apply every entry of `playbook`.
///
/// Entries that failed to decode yield a failed result without touching the
/// system. With `stop_on_failure`, the first failed result ends the run.
#[instrument(skip_all, fields(entries = playbook.entries.len()))]
pub fn apply_playbook(
    playbook: &Playbook,
    config: &EngineConfig,
    executor: &dyn CommandExecutor,
) -> ApplyReport {
    let ctx = RunContext {
        executor,
        no_hint_policy: config.no_hint_policy,
    };

    let mut results = Vec::with_capacity(playbook.entries.len());
    for entry in &playbook.entries {
        let result = match &entry.action {
            Ok(action) => action.run(&ctx),
            Err(err) => ActionResult::failed(entry.module_name(), err.to_string()),
        };
        info!(
            index = entry.index,
            module = %result.module,
            changed = result.changed,
            succeeded = result.succeeded,
            "action finished"
        );
        let failed = !result.succeeded;
        results.push(result);
        if failed && config.stop_on_failure {
            warn!(index = entry.index, "stopping after failed action");
            break;
        }
    }

    let summary = ResultSummary::from_results(&results);
    let skipped_after_failure = playbook.entries.len() - results.len();
    info!(
        ok = summary.ok,
        changed = summary.changed,
        failed = summary.failed,
        skipped_after_failure,
        "playbook applied"
    );
    ApplyReport {
        results,
        summary,
        skipped_after_failure,
    }
}

/// Load config and playbook from disk, then apply with the real executor.
pub fn run_apply(playbook_path: &Path, config_path: &Path) -> Result<ApplyReport> {
    let config = load_config(config_path).context("load engine config")?;
    let playbook = load_playbook(playbook_path)?;
    let executor = executor_for(&config);
    Ok(apply_playbook(&playbook, &config, executor.as_ref()))
}
