//! Side-effecting collaborators: processes, filesystem, config and playbooks.

pub mod config;
pub mod fs;
pub mod playbook;
pub mod process;
