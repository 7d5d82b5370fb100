//! prepost-report — renderers for assignment run artifacts.
//!
//! Takes the [`prepost_core::report::AssignmentReport`] a run produces and
//! renders it for people and downstream tooling: an append-friendly CSV log
//! and a standalone markdown summary.

pub mod csv;
pub mod markdown;
