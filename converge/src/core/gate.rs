//! Check-then-act convergence gate.

use std::fmt::Display;

use tracing::debug;

use crate::core::result::ActionResult;

/// Run `act` only if `is_satisfied` reports the state has not converged yet.
///
/// - predicate error: failed result tagged `module`, `act` never runs
/// - predicate `true`: unchanged result, `act` never runs
/// - predicate `false`: the result of `act`, verbatim
///
/// Holds no state; independent actions may be gated concurrently.
pub fn do_if<E, S, A>(module: &str, is_satisfied: S, act: A) -> ActionResult
where
    E: Display,
    S: FnOnce() -> Result<bool, E>,
    A: FnOnce() -> ActionResult,
{
    match is_satisfied() {
        Err(err) => {
            debug!(module, error = %err, "satisfaction check failed");
            ActionResult::failed(module, err.to_string())
        }
        Ok(true) => {
            debug!(module, "already satisfied, skipping");
            ActionResult::unchanged(module)
        }
        Ok(false) => {
            debug!(module, "not satisfied, executing");
            act()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Verifies repeated calls on a converged state never invoke the action.
    #[test]
    fn satisfied_never_acts() {
        let acted = Cell::new(0);
        for _ in 0..3 {
            let result = do_if(
                "command",
                || Ok::<_, String>(true),
                || {
                    acted.set(acted.get() + 1);
                    ActionResult::changed("command", None)
                },
            );
            assert_eq!(result, ActionResult::unchanged("command"));
        }
        assert_eq!(acted.get(), 0);
    }

    #[test]
    fn unsatisfied_returns_action_result_verbatim() {
        let expected = ActionResult::failed_after_change("other", "exit 3", None);
        let result = do_if("command", || Ok::<_, String>(false), || expected.clone());
        assert_eq!(result, expected);
    }

    #[test]
    fn predicate_error_fails_without_acting() {
        let acted = Cell::new(false);
        let result = do_if(
            "command",
            || Err::<bool, _>("permission denied"),
            || {
                acted.set(true);
                ActionResult::changed("command", None)
            },
        );
        assert!(!acted.get());
        assert_eq!(result.module, "command");
        assert!(!result.succeeded);
        assert!(!result.changed);
        assert_eq!(result.error.as_deref(), Some("permission denied"));
    }
}
