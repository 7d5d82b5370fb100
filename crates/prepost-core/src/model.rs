//! Core data model types for prepost.
//!
//! These are the fundamental types the entire system uses to represent
//! question items, the catalog they live in, the constraint configuration,
//! and the two-sided partition the engine produces.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// A single multi-part question item with a known true/false answer key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionItem {
    /// Unique identifier, stable across runs.
    pub id: String,
    /// Concept category this item assesses.
    pub concept: String,
    /// Number of scorable subparts (always >= 1 in a valid catalog).
    pub subparts: u32,
    /// Subparts whose keyed answer is "true".
    pub true_count: u32,
    /// Subparts whose keyed answer is "false".
    pub false_count: u32,
}

/// The full bank of question items available for assignment.
///
/// Immutable once built; the engine only ever reads from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    items: Vec<QuestionItem>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from a list of items.
    ///
    /// Later duplicates shadow earlier ones in the index; duplicate
    /// detection is the validator's job, not the constructor's.
    pub fn new(items: Vec<QuestionItem>) -> Self {
        let index = items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.id.clone(), i))
            .collect();
        Self { items, index }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuestionItem> {
        self.items.iter()
    }

    /// Look up an item by id.
    pub fn get(&self, id: &str) -> Option<&QuestionItem> {
        self.index.get(id).map(|&i| &self.items[i])
    }

    /// The sorted set of concept categories present in the catalog.
    pub fn concepts(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.items.iter().map(|i| i.concept.as_str()).collect();
        set.into_iter().map(String::from).collect()
    }

    /// Total subparts across the whole catalog.
    pub fn total_subparts(&self) -> u32 {
        self.items.iter().map(|i| i.subparts).sum()
    }

    /// Total true-answer subparts across the whole catalog.
    pub fn total_trues(&self) -> u32 {
        self.items.iter().map(|i| i.true_count).sum()
    }
}

/// Constraint configuration for the partition engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    /// Items per output set. `None` means half the catalog, rounded down.
    pub questions_per_set: Option<usize>,
    /// Minimum total subparts per set.
    pub subparts_min: Option<u32>,
    /// Maximum total subparts per set.
    pub subparts_max: Option<u32>,
    /// Maximum difference in total subparts between the two sets.
    pub subpart_diff_max: u32,
    /// Lower bound on each set's true-answer ratio.
    pub true_ratio_min: f64,
    /// Upper bound on each set's true-answer ratio.
    pub true_ratio_max: f64,
    /// Maximum per-concept subpart difference between the two sets.
    pub concept_balance_max: u32,
    /// Minimum subparts each set must carry in every concept.
    pub concept_min_subparts: u32,
    /// Closed concept universe. Empty means "whatever the catalog has".
    pub expected_concepts: Vec<String>,
    /// Search budgets and randomness.
    pub search: SearchBudget,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            questions_per_set: None,
            subparts_min: None,
            subparts_max: None,
            subpart_diff_max: 2,
            true_ratio_min: 0.4,
            true_ratio_max: 0.6,
            concept_balance_max: 2,
            concept_min_subparts: 0,
            expected_concepts: Vec::new(),
            search: SearchBudget::default(),
        }
    }
}

impl Constraints {
    /// Resolve the per-set item count against a concrete catalog size.
    pub fn target_set_size(&self, catalog_len: usize) -> usize {
        self.questions_per_set.unwrap_or(catalog_len / 2)
    }
}

/// Budgets for one invocation of the local search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchBudget {
    /// Maximum steps per run.
    pub max_steps: u32,
    /// Maximum non-improving steps per run.
    pub max_bad_steps: u32,
    /// Maximum consecutive non-improving steps per run.
    pub max_bad_streak: u32,
    /// Fraction of neighbors examined per step, in [0, 1].
    pub effort: f64,
    /// Independent restarts.
    pub runs: u32,
    /// RNG seed. `None` seeds from entropy; runs are then non-reproducible
    /// but still constraint-valid or explicitly failed.
    pub seed: Option<u64>,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            max_steps: 100,
            max_bad_steps: 50,
            max_bad_streak: 10,
            effort: 0.5,
            runs: 3,
            seed: None,
        }
    }
}

/// The terminal artifact: two disjoint id sets plus whatever was left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    /// Item ids in the first ("pre") set, sorted.
    pub set_a: Vec<String>,
    /// Item ids in the second ("post") set, sorted.
    pub set_b: Vec<String>,
    /// Catalog ids assigned to neither set, sorted.
    pub unassigned: Vec<String>,
}

impl Partition {
    /// Build a partition from unordered id collections.
    pub fn new(
        mut set_a: Vec<String>,
        mut set_b: Vec<String>,
        mut unassigned: Vec<String>,
    ) -> Self {
        set_a.sort();
        set_b.sort();
        unassigned.sort();
        Self {
            set_a,
            set_b,
            unassigned,
        }
    }

    /// True when no id appears in both sets.
    pub fn is_disjoint(&self) -> bool {
        let a: BTreeSet<&str> = self.set_a.iter().map(String::as_str).collect();
        self.set_b.iter().all(|id| !a.contains(id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, concept: &str, subparts: u32, trues: u32) -> QuestionItem {
        QuestionItem {
            id: id.into(),
            concept: concept.into(),
            subparts,
            true_count: trues,
            false_count: subparts - trues,
        }
    }

    #[test]
    fn catalog_lookup_and_concepts() {
        let catalog = Catalog::new(vec![
            item("q1", "genetics", 3, 2),
            item("q2", "ecology", 2, 1),
            item("q3", "genetics", 4, 2),
        ]);
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get("q2").unwrap().subparts, 2);
        assert!(catalog.get("q9").is_none());
        assert_eq!(catalog.concepts(), vec!["ecology", "genetics"]);
        assert_eq!(catalog.total_subparts(), 9);
        assert_eq!(catalog.total_trues(), 5);
    }

    #[test]
    fn catalogs_with_identical_items_compare_equal() {
        let items = vec![item("q1", "genetics", 3, 2), item("q2", "ecology", 2, 1)];
        assert_eq!(Catalog::new(items.clone()), Catalog::new(items));
        assert_ne!(
            Catalog::new(vec![item("q1", "genetics", 3, 2)]),
            Catalog::new(vec![item("q1", "genetics", 3, 1)])
        );
    }

    #[test]
    fn constraints_defaults() {
        let c = Constraints::default();
        assert_eq!(c.subpart_diff_max, 2);
        assert!((c.true_ratio_min - 0.4).abs() < f64::EPSILON);
        assert_eq!(c.search.max_steps, 100);
        assert_eq!(c.search.runs, 3);
        assert!(c.search.seed.is_none());
    }

    #[test]
    fn target_set_size_defaults_to_half() {
        let c = Constraints::default();
        assert_eq!(c.target_set_size(30), 15);
        assert_eq!(c.target_set_size(7), 3);
        let explicit = Constraints {
            questions_per_set: Some(10),
            ..Constraints::default()
        };
        assert_eq!(explicit.target_set_size(7), 10);
    }

    #[test]
    fn partition_sorts_and_checks_disjointness() {
        let p = Partition::new(
            vec!["q3".into(), "q1".into()],
            vec!["q2".into()],
            vec![],
        );
        assert_eq!(p.set_a, vec!["q1", "q3"]);
        assert!(p.is_disjoint());

        let bad = Partition::new(vec!["q1".into()], vec!["q1".into()], vec![]);
        assert!(!bad.is_disjoint());
    }
}
