//! Stable exit codes for converge CLI commands.

/// Every action succeeded (or the playbook validated).
pub const OK: i32 = 0;
/// The playbook or config could not be loaded, or failed validation.
pub const INVALID: i32 = 1;
/// At least one action reported `succeeded=false`.
pub const FAILED: i32 = 2;
