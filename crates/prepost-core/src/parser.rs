//! Catalog and constraint loading.
//!
//! Catalogs arrive as comma-separated text with a header row; constraint
//! files are TOML. Both loaders validate what they read, so anything that
//! reaches the engine already holds the catalog invariants.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::error::ValidationError;
use crate::model::{Catalog, Constraints, QuestionItem, SearchBudget};

const COL_ID: &str = "id";
const COL_CONCEPT: &str = "concept";
const COL_SUBPARTS: &str = "subparts";
const COL_TRUE: &str = "true";
const COL_FALSE: &str = "false";

/// Read and parse a catalog file.
pub fn load_catalog(path: &Path) -> anyhow::Result<Catalog> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file {}", path.display()))?;
    let catalog = parse_catalog_str(&text)
        .with_context(|| format!("invalid catalog in {}", path.display()))?;
    tracing::debug!(items = catalog.len(), path = %path.display(), "catalog loaded");
    Ok(catalog)
}

/// Parse catalog text: a header naming the five columns in any order and
/// any casing, then one item per line. Blank lines and `#` comments are
/// skipped, and columns beyond the known five are ignored.
///
/// Fields are split naively on commas. Quoted fields are not supported,
/// so item ids and concept tags must not contain commas.
pub fn parse_catalog_str(text: &str) -> Result<Catalog, ValidationError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'));

    let Some((_, header)) = lines.next() else {
        return Err(ValidationError::EmptyCatalog);
    };
    let columns: Vec<String> = header
        .split(',')
        .map(|c| c.trim().to_ascii_lowercase())
        .collect();
    let position = |name: &'static str| -> Result<usize, ValidationError> {
        columns
            .iter()
            .position(|c| c == name)
            .ok_or(ValidationError::MissingColumn(name))
    };
    let id_col = position(COL_ID)?;
    let concept_col = position(COL_CONCEPT)?;
    let subparts_col = position(COL_SUBPARTS)?;
    let true_col = position(COL_TRUE)?;
    let false_col = position(COL_FALSE)?;

    let mut items = Vec::new();
    for (line_no, line) in lines {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < columns.len() {
            return Err(ValidationError::ShortRow {
                line: line_no,
                found: fields.len(),
                expected: columns.len(),
            });
        }
        let number = |col: usize, field: &'static str| -> Result<u32, ValidationError> {
            fields[col]
                .parse()
                .map_err(|_| ValidationError::NonNumericField {
                    line: line_no,
                    field,
                    value: fields[col].to_string(),
                })
        };
        items.push(QuestionItem {
            id: fields[id_col].to_string(),
            concept: fields[concept_col].to_string(),
            subparts: number(subparts_col, COL_SUBPARTS)?,
            true_count: number(true_col, COL_TRUE)?,
            false_count: number(false_col, COL_FALSE)?,
        });
    }

    let catalog = Catalog::new(items);
    validate_catalog(&catalog, &[])?;
    Ok(catalog)
}

/// Check catalog invariants: non-empty, unique ids, consistent answer
/// keys, and concepts inside the expected universe when one is given.
pub fn validate_catalog(
    catalog: &Catalog,
    expected_concepts: &[String],
) -> Result<(), ValidationError> {
    if catalog.is_empty() {
        return Err(ValidationError::EmptyCatalog);
    }
    let mut seen = HashSet::new();
    for item in catalog.iter() {
        if !seen.insert(item.id.as_str()) {
            return Err(ValidationError::DuplicateId(item.id.clone()));
        }
        if item.subparts == 0 {
            return Err(ValidationError::ZeroSubparts {
                id: item.id.clone(),
            });
        }
        // Sum in u64 so absurd counts report a mismatch instead of
        // overflowing in debug builds.
        if u64::from(item.true_count) + u64::from(item.false_count) != u64::from(item.subparts) {
            return Err(ValidationError::SubpartMismatch {
                id: item.id.clone(),
                subparts: item.subparts,
                true_count: item.true_count,
                false_count: item.false_count,
            });
        }
        if item.concept.trim().is_empty() {
            return Err(ValidationError::MissingConcept {
                id: item.id.clone(),
            });
        }
        if !expected_concepts.is_empty() && !expected_concepts.contains(&item.concept) {
            return Err(ValidationError::UnknownConcept {
                id: item.id.clone(),
                concept: item.concept.clone(),
            });
        }
    }
    Ok(())
}

/// Read and parse a TOML constraint file.
pub fn load_constraints(path: &Path) -> anyhow::Result<Constraints> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read constraint file {}", path.display()))?;
    parse_constraints_str(&text)
        .with_context(|| format!("invalid constraints in {}", path.display()))
}

/// Parse constraint TOML. Every section and field is optional; anything
/// absent falls back to the built-in defaults.
pub fn parse_constraints_str(text: &str) -> anyhow::Result<Constraints> {
    let file: ConstraintFile =
        toml::from_str(text).context("failed to parse constraint TOML")?;
    let constraints = file.into_constraints();
    validate_constraints(&constraints)?;
    Ok(constraints)
}

/// Check constraint values for internal consistency.
pub fn validate_constraints(constraints: &Constraints) -> Result<(), ValidationError> {
    let bad = |field: &'static str, reason: String| ValidationError::BadConstraint {
        field,
        reason,
    };

    if constraints.questions_per_set == Some(0) {
        return Err(bad("questions_per_set", "must be at least 1".into()));
    }
    if let (Some(min), Some(max)) = (constraints.subparts_min, constraints.subparts_max) {
        if min > max {
            return Err(bad(
                "subparts_min",
                format!("minimum {min} exceeds maximum {max}"),
            ));
        }
    }
    for (field, value) in [
        ("true_ratio_min", constraints.true_ratio_min),
        ("true_ratio_max", constraints.true_ratio_max),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(bad(field, format!("{value} is outside [0, 1]")));
        }
    }
    if constraints.true_ratio_min > constraints.true_ratio_max {
        return Err(bad(
            "true_ratio_min",
            format!(
                "minimum {} exceeds maximum {}",
                constraints.true_ratio_min, constraints.true_ratio_max
            ),
        ));
    }
    if !(0.0..=1.0).contains(&constraints.search.effort) {
        return Err(bad(
            "search.effort",
            format!("{} is outside [0, 1]", constraints.search.effort),
        ));
    }
    if constraints.search.runs == 0 {
        return Err(bad("search.runs", "must be at least 1".into()));
    }
    Ok(())
}

/// On-disk constraint layout: `[sets]`, `[balance]`, and `[search]`
/// sections, each fully optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConstraintFile {
    #[serde(default)]
    sets: SetsSection,
    #[serde(default)]
    balance: BalanceSection,
    #[serde(default)]
    search: SearchSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SetsSection {
    questions_per_set: Option<usize>,
    subparts_min: Option<u32>,
    subparts_max: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, default)]
struct BalanceSection {
    subpart_diff_max: u32,
    true_ratio_min: f64,
    true_ratio_max: f64,
    concept_balance_max: u32,
    concept_min_subparts: u32,
    expected_concepts: Vec<String>,
}

impl Default for BalanceSection {
    fn default() -> Self {
        let c = Constraints::default();
        Self {
            subpart_diff_max: c.subpart_diff_max,
            true_ratio_min: c.true_ratio_min,
            true_ratio_max: c.true_ratio_max,
            concept_balance_max: c.concept_balance_max,
            concept_min_subparts: c.concept_min_subparts,
            expected_concepts: c.expected_concepts,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, default)]
struct SearchSection {
    max_steps: u32,
    max_bad_steps: u32,
    max_bad_streak: u32,
    effort: f64,
    runs: u32,
    seed: Option<u64>,
}

impl Default for SearchSection {
    fn default() -> Self {
        let b = SearchBudget::default();
        Self {
            max_steps: b.max_steps,
            max_bad_steps: b.max_bad_steps,
            max_bad_streak: b.max_bad_streak,
            effort: b.effort,
            runs: b.runs,
            seed: b.seed,
        }
    }
}

impl ConstraintFile {
    fn into_constraints(self) -> Constraints {
        Constraints {
            questions_per_set: self.sets.questions_per_set,
            subparts_min: self.sets.subparts_min,
            subparts_max: self.sets.subparts_max,
            subpart_diff_max: self.balance.subpart_diff_max,
            true_ratio_min: self.balance.true_ratio_min,
            true_ratio_max: self.balance.true_ratio_max,
            concept_balance_max: self.balance.concept_balance_max,
            concept_min_subparts: self.balance.concept_min_subparts,
            expected_concepts: self.balance.expected_concepts,
            search: SearchBudget {
                max_steps: self.search.max_steps,
                max_bad_steps: self.search.max_bad_steps,
                max_bad_streak: self.search.max_bad_streak,
                effort: self.search.effort,
                runs: self.search.runs,
                seed: self.search.seed,
            },
        }
    }
}
