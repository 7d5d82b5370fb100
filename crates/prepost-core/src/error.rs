//! Validation error types.
//!
//! These errors cover everything rejected before the search begins:
//! malformed catalog rows, broken item invariants, and nonsensical
//! constraint configuration. Defined as a concrete enum so the CLI can
//! downcast out of an `anyhow` chain and map validation failures to a
//! distinct exit code without string matching.

use thiserror::Error;

/// Errors detected while validating a catalog or constraints.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The catalog contains no items.
    #[error("catalog is empty")]
    EmptyCatalog,

    /// Two catalog rows share the same item id.
    #[error("duplicate item id: {0}")]
    DuplicateId(String),

    /// An item's true/false tallies do not add up to its subpart count.
    #[error(
        "item {id}: answer key mismatch ({true_count} true + {false_count} false != {subparts} subparts)"
    )]
    SubpartMismatch {
        id: String,
        subparts: u32,
        true_count: u32,
        false_count: u32,
    },

    /// An item declares zero subparts.
    #[error("item {id}: subpart count must be at least 1")]
    ZeroSubparts { id: String },

    /// An item has an empty concept tag.
    #[error("item {id}: concept is empty")]
    MissingConcept { id: String },

    /// An item's concept is outside the configured concept universe.
    #[error("item {id}: unknown concept '{concept}'")]
    UnknownConcept { id: String, concept: String },

    /// A catalog column named in the header is absent.
    #[error("catalog header is missing column '{0}'")]
    MissingColumn(&'static str),

    /// A catalog row has fewer fields than the header.
    #[error("line {line}: row has {found} fields, expected {expected}")]
    ShortRow {
        line: usize,
        found: usize,
        expected: usize,
    },

    /// A numeric catalog field failed to parse.
    #[error("line {line}: column '{field}' is not a number: '{value}'")]
    NonNumericField {
        line: usize,
        field: &'static str,
        value: String,
    },

    /// A constraint field holds an out-of-range or inconsistent value.
    #[error("constraint '{field}' is invalid: {reason}")]
    BadConstraint {
        field: &'static str,
        reason: String,
    },
}
