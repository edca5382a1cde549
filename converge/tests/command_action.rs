//! End-to-end convergence tests for the `command` action against real
//! processes and a real (temporary) filesystem.

use converge::actions::{Action, CommandAction, RunContext};
use converge::core::predicate::NoHintPolicy;
use converge::core::result::ActionResult;
use converge::io::process::SystemExecutor;
use converge::test_support::{RecordingExecutor, TestDir};

fn run_with(executor: &RecordingExecutor<SystemExecutor>, action: &Action) -> ActionResult {
    let ctx = RunContext {
        executor,
        no_hint_policy: NoHintPolicy::AlwaysRun,
    };
    action.run(&ctx)
}

/// With no hints the command runs on every invocation.
#[test]
fn unhinted_command_runs_every_time() {
    let executor = RecordingExecutor::new(SystemExecutor);
    let action = Action::decode_entry(&serde_json::json!({
        "module": "command",
        "execute": "true",
        "creates": "",
        "removes": "",
    }))
    .expect("decode");

    for _ in 0..2 {
        let result = run_with(&executor, &action);
        assert!(result.succeeded);
        assert!(result.changed);
        assert!(result.error.is_none());
    }
    assert_eq!(executor.calls().len(), 2);
}

/// First run creates the marker; the second sees it and does nothing.
#[test]
fn creates_hint_converges_after_first_run() {
    let dir = TestDir::new().expect("dir");
    let marker = dir.join("marker");
    let action = Action::Command(
        CommandAction::new(format!("touch {}", marker.display())).with_creates(&marker),
    );
    let executor = RecordingExecutor::new(SystemExecutor);

    let first = run_with(&executor, &action);
    assert!(first.succeeded);
    assert!(first.changed);
    assert!(marker.exists());

    let second = run_with(&executor, &action);
    assert!(second.succeeded);
    assert!(!second.changed);
    assert!(second.error.is_none());
    assert!(second.output.is_none());

    assert_eq!(executor.calls().len(), 1);
}

/// The removes hint is satisfied once the target is gone.
#[test]
fn removes_hint_converges_after_first_run() {
    let dir = TestDir::new().expect("dir");
    let stale = dir.write("stale.lock", "").expect("write");
    let action = Action::Command(
        CommandAction::new(format!("rm {}", stale.display())).with_removes(&stale),
    );
    let executor = RecordingExecutor::new(SystemExecutor);

    assert!(run_with(&executor, &action).changed);
    assert!(!stale.exists());
    assert!(!run_with(&executor, &action).changed);
    assert_eq!(executor.calls().len(), 1);
}

#[test]
fn failing_command_reports_stderr_and_changed() {
    let executor = RecordingExecutor::new(SystemExecutor);
    let action = Action::Command(CommandAction::new("false"));

    let result = run_with(&executor, &action);

    assert!(!result.succeeded);
    assert!(result.changed);
    let output = result.command_output().expect("output");
    assert_ne!(output.exit_status, 0);
    assert_eq!(result.error.as_deref(), Some(output.stderr.as_str()));
}

#[test]
fn stderr_becomes_the_error_text() {
    let dir = TestDir::new().expect("dir");
    let missing = dir.join("does-not-exist");
    let executor = RecordingExecutor::new(SystemExecutor);
    let action = Action::Command(CommandAction::new(format!("ls {}", missing.display())));

    let result = run_with(&executor, &action);

    assert!(!result.succeeded);
    assert!(result.changed);
    assert!(result.error.is_some_and(|err| !err.is_empty()));
}

#[test]
fn missing_executable_is_an_infrastructure_failure() {
    let executor = RecordingExecutor::new(SystemExecutor);
    let action = Action::Command(CommandAction::new("converge-no-such-program --help"));

    let result = run_with(&executor, &action);

    assert_eq!(result.module, "command");
    assert!(!result.succeeded);
    assert!(!result.changed);
    assert!(result.output.is_none());
    assert!(
        result
            .error
            .is_some_and(|err| err.contains("converge-no-such-program"))
    );
}
