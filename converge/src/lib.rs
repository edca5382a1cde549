//! Idempotent convergence engine for declarative configuration management.
//!
//! Each declared action is checked against live system state and only run when
//! it has not converged yet. Every invocation yields exactly one
//! [`core::result::ActionResult`], whether it skipped, changed or failed.
//!
//! - **[`core`]**: Pure logic (result model, predicate combinator, convergence gate).
//! - **[`io`]**: Side effects (process execution, filesystem checks, config, playbooks).
//! - **[`actions`]**: The closed set of action kinds built from the two.
//!
//! [`apply`] runs a decoded playbook and is what the `converge` binary drives.

pub mod actions;
pub mod apply;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
