//! Satisfaction predicates and their AND-combination.
//!
//! A predicate is a side-effect-free check of live system state. Predicates
//! never mutate anything; they only answer whether a desired condition already
//! holds, or fail with an infrastructure error.

use serde::{Deserialize, Serialize};

/// Boxed zero-argument check, so heterogeneous closures fit one list.
pub type Predicate<'a, E> = Box<dyn FnOnce() -> Result<bool, E> + 'a>;

/// Evaluate `predicates` in order and AND their results.
///
/// Every predicate is evaluated until one errors; that error is returned
/// immediately and later predicates are not run. A `false` does not stop
/// evaluation, so an error further down the list still surfaces. Zero
/// predicates yield `true`.
pub fn all_satisfied<E, I, P>(predicates: I) -> Result<bool, E>
where
    I: IntoIterator<Item = P>,
    P: FnOnce() -> Result<bool, E>,
{
    let mut all = true;
    for predicate in predicates {
        all &= predicate()?;
    }
    Ok(all)
}

/// What an action with no idempotency hints configured should do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoHintPolicy {
    /// Never satisfied: the action runs on every invocation.
    #[default]
    AlwaysRun,
    /// Always satisfied: the action never runs.
    AlwaysSkip,
}

impl NoHintPolicy {
    pub fn satisfied(self) -> bool {
        matches!(self, NoHintPolicy::AlwaysSkip)
    }
}

/// Combine hint predicates, deferring to `policy` when none are configured.
pub fn satisfied_or_policy<E>(
    predicates: Vec<Predicate<'_, E>>,
    policy: NoHintPolicy,
) -> Result<bool, E> {
    if predicates.is_empty() {
        return Ok(policy.satisfied());
    }
    all_satisfied(predicates)
}
