//! prepost-core — partition engine, constraint scoring, and data model.
//!
//! This crate defines the question catalog model, the constraint system,
//! and the local-search engine that splits a catalog into two balanced,
//! disjoint assessment forms.

pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod report;
pub mod score;
