//! Constraint measurement and violation scoring.
//!
//! A candidate partition is summarized into two [`SideTally`] values, the
//! [`Checker`] turns those into a structured list of [`Violation`]s, and a
//! [`ScoreStrategy`] collapses the list into the scalar the local search
//! minimizes. Score 0.0 means every constraint is within tolerance.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Catalog, Constraints, QuestionItem};

/// Which of the two output sets a measurement refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    A,
    B,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => write!(f, "pre"),
            Side::B => write!(f, "post"),
        }
    }
}

/// Running totals for one side of a candidate partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideTally {
    /// Number of items.
    pub items: usize,
    /// Total subparts.
    pub subparts: u32,
    /// Subparts keyed "true".
    pub trues: u32,
    /// Subparts keyed "false".
    pub falses: u32,
    /// Subparts per concept category.
    pub per_concept: BTreeMap<String, u32>,
}

impl SideTally {
    /// Tally a set of item ids against the catalog.
    ///
    /// Ids absent from the catalog are ignored; the validator guarantees
    /// the engine never produces any.
    pub fn from_ids<'a, I>(ids: I, catalog: &Catalog) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut tally = Self::default();
        for id in ids {
            if let Some(item) = catalog.get(id) {
                tally.add(item);
            }
        }
        tally
    }

    /// Account for an item joining this side.
    pub fn add(&mut self, item: &QuestionItem) {
        self.items += 1;
        self.subparts += item.subparts;
        self.trues += item.true_count;
        self.falses += item.false_count;
        *self.per_concept.entry(item.concept.clone()).or_insert(0) += item.subparts;
    }

    /// Account for an item leaving this side.
    pub fn remove(&mut self, item: &QuestionItem) {
        self.items -= 1;
        self.subparts -= item.subparts;
        self.trues -= item.true_count;
        self.falses -= item.false_count;
        if let Some(count) = self.per_concept.get_mut(&item.concept) {
            *count -= item.subparts;
            if *count == 0 {
                self.per_concept.remove(&item.concept);
            }
        }
    }

    /// Ratio of true-answer subparts, or 0.0 for an empty side.
    pub fn true_ratio(&self) -> f64 {
        if self.subparts == 0 {
            0.0
        } else {
            f64::from(self.trues) / f64::from(self.subparts)
        }
    }

    fn concept_subparts(&self, concept: &str) -> u32 {
        self.per_concept.get(concept).copied().unwrap_or(0)
    }
}

/// One constraint currently out of tolerance, with how it was measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// A side holds the wrong number of items.
    SetSize {
        side: Side,
        count: usize,
        required: usize,
    },
    /// The catalog cannot supply two sets of the requested size.
    InsufficientItems { available: usize, required: usize },
    /// The two sides differ in total subparts by more than allowed.
    SubpartDiff { diff: u32, allowed: u32 },
    /// A side's total subparts fall outside the configured range.
    SubpartsOutOfRange {
        side: Side,
        total: u32,
        min: Option<u32>,
        max: Option<u32>,
    },
    /// A side's true-answer ratio is outside the configured band.
    TrueRatio {
        side: Side,
        ratio: f64,
        min: f64,
        max: f64,
    },
    /// One concept's subparts differ between sides by more than allowed.
    ConceptBalance {
        concept: String,
        diff: u32,
        allowed: u32,
    },
    /// A side carries fewer subparts in a concept than required.
    ConceptDeficit {
        side: Side,
        concept: String,
        subparts: u32,
        required: u32,
    },
}

impl Violation {
    /// Distance past tolerance; strictly positive for any emitted violation.
    pub fn magnitude(&self) -> f64 {
        match self {
            Violation::SetSize { count, required, .. } => {
                (*count as f64 - *required as f64).abs()
            }
            Violation::InsufficientItems {
                available,
                required,
            } => (*required - *available) as f64,
            Violation::SubpartDiff { diff, allowed } => f64::from(diff - allowed),
            Violation::SubpartsOutOfRange {
                total, min, max, ..
            } => {
                if let Some(min) = min.filter(|m| total < m) {
                    f64::from(min - total)
                } else if let Some(max) = max.filter(|m| total > m) {
                    f64::from(total - max)
                } else {
                    0.0
                }
            }
            // Funnel shape: zero inside the band, linear outside it.
            Violation::TrueRatio {
                ratio, min, max, ..
            } => (min - ratio).max(ratio - max).max(0.0),
            Violation::ConceptBalance { diff, allowed, .. } => f64::from(diff - allowed),
            Violation::ConceptDeficit {
                subparts, required, ..
            } => f64::from(required - subparts),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::SetSize {
                side,
                count,
                required,
            } => write!(f, "{side} set has {count} items, required {required}"),
            Violation::InsufficientItems {
                available,
                required,
            } => write!(
                f,
                "catalog has {available} items, {required} needed for two full sets"
            ),
            Violation::SubpartDiff { diff, allowed } => {
                write!(f, "subpart totals differ by {diff}, allowed {allowed}")
            }
            Violation::SubpartsOutOfRange {
                side,
                total,
                min,
                max,
            } => write!(
                f,
                "{side} set has {total} subparts, outside [{}, {}]",
                min.map_or("-".into(), |v| v.to_string()),
                max.map_or("-".into(), |v| v.to_string()),
            ),
            Violation::TrueRatio {
                side,
                ratio,
                min,
                max,
            } => write!(
                f,
                "{side} set true ratio {ratio:.3} outside [{min:.2}, {max:.2}]"
            ),
            Violation::ConceptBalance {
                concept,
                diff,
                allowed,
            } => write!(
                f,
                "concept '{concept}' subparts differ by {diff} between sets, allowed {allowed}"
            ),
            Violation::ConceptDeficit {
                side,
                concept,
                subparts,
                required,
            } => write!(
                f,
                "{side} set has {subparts} subparts in concept '{concept}', required {required}"
            ),
        }
    }
}

/// Measures a pair of side tallies against a resolved constraint set.
pub struct Checker<'a> {
    pub constraints: &'a Constraints,
    /// Items each side must hold, resolved against the catalog size.
    pub target_size: usize,
    /// Total items available in the catalog.
    pub available: usize,
    /// Concept universe to balance over.
    pub concepts: &'a [String],
}

impl Checker<'_> {
    /// Measure every violated constraint. Deterministic ordering.
    pub fn measure(&self, a: &SideTally, b: &SideTally) -> Vec<Violation> {
        let c = self.constraints;
        let mut out = Vec::new();

        if self.available < 2 * self.target_size {
            out.push(Violation::InsufficientItems {
                available: self.available,
                required: 2 * self.target_size,
            });
        }

        for (side, tally) in [(Side::A, a), (Side::B, b)] {
            if tally.items != self.target_size {
                out.push(Violation::SetSize {
                    side,
                    count: tally.items,
                    required: self.target_size,
                });
            }
        }

        let diff = a.subparts.abs_diff(b.subparts);
        if diff > c.subpart_diff_max {
            out.push(Violation::SubpartDiff {
                diff,
                allowed: c.subpart_diff_max,
            });
        }

        for (side, tally) in [(Side::A, a), (Side::B, b)] {
            let below = c.subparts_min.is_some_and(|min| tally.subparts < min);
            let above = c.subparts_max.is_some_and(|max| tally.subparts > max);
            if below || above {
                out.push(Violation::SubpartsOutOfRange {
                    side,
                    total: tally.subparts,
                    min: c.subparts_min,
                    max: c.subparts_max,
                });
            }
        }

        // An empty side has no ratio; set-size constraints cover it.
        for (side, tally) in [(Side::A, a), (Side::B, b)] {
            if tally.subparts == 0 {
                continue;
            }
            let ratio = tally.true_ratio();
            if ratio < c.true_ratio_min || ratio > c.true_ratio_max {
                out.push(Violation::TrueRatio {
                    side,
                    ratio,
                    min: c.true_ratio_min,
                    max: c.true_ratio_max,
                });
            }
        }

        for concept in self.concepts {
            let in_a = a.concept_subparts(concept);
            let in_b = b.concept_subparts(concept);
            let diff = in_a.abs_diff(in_b);
            if diff > c.concept_balance_max {
                out.push(Violation::ConceptBalance {
                    concept: concept.clone(),
                    diff,
                    allowed: c.concept_balance_max,
                });
            }
            if c.concept_min_subparts > 0 {
                for (side, subparts) in [(Side::A, in_a), (Side::B, in_b)] {
                    if subparts < c.concept_min_subparts {
                        out.push(Violation::ConceptDeficit {
                            side,
                            concept: concept.clone(),
                            subparts,
                            required: c.concept_min_subparts,
                        });
                    }
                }
            }
        }

        out
    }
}

/// Collapses a violation list into the scalar the search minimizes.
///
/// Injected into the engine so the scoring function stays swappable;
/// implementations must return 0.0 exactly when the list is empty.
pub trait ScoreStrategy: Send + Sync {
    fn score(&self, violations: &[Violation]) -> f64;
}

/// Default strategy: violation magnitudes summed with per-family weights.
#[derive(Debug, Clone)]
pub struct WeightedPenalty {
    /// Weight for size and subpart-count violations.
    pub subpart_weight: f64,
    /// Weight for concept coverage violations.
    pub coverage_weight: f64,
    /// Weight for true-ratio violations.
    pub ratio_weight: f64,
}

impl Default for WeightedPenalty {
    fn default() -> Self {
        // Ratio deviations live in [0, 1] while the other magnitudes are
        // whole subpart counts; the heavier weight keeps them comparable.
        Self {
            subpart_weight: 1.0,
            coverage_weight: 1.0,
            ratio_weight: 10.0,
        }
    }
}

impl ScoreStrategy for WeightedPenalty {
    fn score(&self, violations: &[Violation]) -> f64 {
        violations
            .iter()
            .map(|v| {
                let weight = match v {
                    Violation::TrueRatio { .. } => self.ratio_weight,
                    Violation::ConceptBalance { .. } | Violation::ConceptDeficit { .. } => {
                        self.coverage_weight
                    }
                    _ => self.subpart_weight,
                };
                weight * v.magnitude()
            })
            .sum()
    }
}
