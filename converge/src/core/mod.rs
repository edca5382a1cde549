//! Deterministic, pure logic shared by every action kind.
//!
//! Core modules are free of I/O. They decide and report; the side effects
//! they gate live in [`crate::io`] and [`crate::actions`].

pub mod gate;
pub mod predicate;
pub mod result;
