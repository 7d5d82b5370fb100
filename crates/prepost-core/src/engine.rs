//! The partition engine: bounded local search over candidate bipartitions.
//!
//! Seeds a candidate by dealing each concept group greedily across the two
//! sides, then walks the neighborhood of single-item replacements and
//! same-concept cross swaps, committing the best neighbor each step. Step,
//! bad-step, and bad-streak budgets bound the work; the best state seen
//! across all restarts is the only thing ever returned.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::{Catalog, Constraints, Partition};
use crate::parser::{validate_catalog, validate_constraints};
use crate::score::{Checker, ScoreStrategy, SideTally, Violation, WeightedPenalty};

/// Result of one engine invocation.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Every constraint is within tolerance.
    Satisfied(Assignment),
    /// Budgets ran out; carries the best partition found and what it
    /// still violates.
    Exhausted(AssignmentFailure),
}

impl Outcome {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Outcome::Satisfied(_))
    }

    pub fn partition(&self) -> &Partition {
        match self {
            Outcome::Satisfied(a) => &a.partition,
            Outcome::Exhausted(f) => &f.best,
        }
    }

    pub fn summary(&self) -> &PairSummary {
        match self {
            Outcome::Satisfied(a) => &a.summary,
            Outcome::Exhausted(f) => &f.summary,
        }
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            Outcome::Satisfied(_) => &[],
            Outcome::Exhausted(f) => &f.violations,
        }
    }
}

/// A constraint-satisfying partition.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub partition: Partition,
    pub summary: PairSummary,
    /// Search steps taken across all runs.
    pub steps: u32,
    /// Restarts actually used.
    pub runs: u32,
    /// Wall-clock duration of the whole search.
    pub elapsed_ms: u64,
}

/// The best partition found when the search budget ran out.
#[derive(Debug, Clone)]
pub struct AssignmentFailure {
    pub best: Partition,
    pub summary: PairSummary,
    /// Constraints still out of tolerance, with measured magnitudes.
    pub violations: Vec<Violation>,
    pub steps: u32,
    pub runs: u32,
    pub elapsed_ms: u64,
}

/// Side tallies for both halves of a partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSummary {
    pub set_a: SideTally,
    pub set_b: SideTally,
}

/// Run the engine with the default scoring strategy.
pub fn assign(catalog: &Catalog, constraints: &Constraints) -> Result<Outcome, ValidationError> {
    Ok(PartitionEngine::new(catalog, constraints)?.run())
}

/// The partition engine. Purely computational: borrows its inputs, owns a
/// scoring strategy, and performs no I/O.
pub struct PartitionEngine<'a> {
    catalog: &'a Catalog,
    constraints: &'a Constraints,
    strategy: Box<dyn ScoreStrategy>,
    concepts: Vec<String>,
    target_size: usize,
}

/// One neighbor move in the local search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    /// Replace a member item with an unused one on the given side.
    Replace {
        side: usize, // 0 = a, 1 = b
        out_idx: usize,
        in_idx: usize,
    },
    /// Swap two same-concept items across sides.
    CrossSwap { a_idx: usize, b_idx: usize },
}

impl Move {
    fn reverse(self) -> Self {
        match self {
            Move::Replace {
                side,
                out_idx,
                in_idx,
            } => Move::Replace {
                side,
                out_idx: in_idx,
                in_idx: out_idx,
            },
            Move::CrossSwap { a_idx, b_idx } => Move::CrossSwap {
                a_idx: b_idx,
                b_idx: a_idx,
            },
        }
    }
}

/// Mutable search state. Items are referenced by catalog position so moves
/// never need fallible id lookups.
#[derive(Debug, Clone)]
struct State {
    a: Vec<usize>,
    b: Vec<usize>,
    unused: Vec<usize>,
    tally_a: SideTally,
    tally_b: SideTally,
}

/// Best-so-far snapshot within and across runs.
#[derive(Debug, Clone)]
struct Snapshot {
    state: State,
    score: f64,
}

impl<'a> PartitionEngine<'a> {
    /// Validate inputs and build an engine with the default strategy.
    pub fn new(
        catalog: &'a Catalog,
        constraints: &'a Constraints,
    ) -> Result<Self, ValidationError> {
        validate_constraints(constraints)?;
        validate_catalog(catalog, &constraints.expected_concepts)?;

        let concepts = if constraints.expected_concepts.is_empty() {
            catalog.concepts()
        } else {
            let mut c = constraints.expected_concepts.clone();
            c.sort();
            c.dedup();
            c
        };

        Ok(Self {
            catalog,
            constraints,
            strategy: Box::new(WeightedPenalty::default()),
            concepts,
            target_size: constraints.target_set_size(catalog.len()),
        })
    }

    /// Swap in a different scoring strategy.
    pub fn with_strategy(mut self, strategy: Box<dyn ScoreStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Run the full search: up to `runs` restarts, each seeded and locally
    /// improved, returning the best state across all of them.
    pub fn run(&mut self) -> Outcome {
        let started = std::time::Instant::now();
        let budget = &self.constraints.search;
        let mut rng = match budget.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let runs = budget.runs.max(1);
        let mut best: Option<Snapshot> = None;
        let mut total_steps = 0u32;
        let mut runs_used = 0u32;

        for run_idx in 0..runs {
            runs_used = run_idx + 1;
            let (run_best, steps) = self.search_once(&mut rng);
            total_steps += steps;
            tracing::debug!(
                run = run_idx,
                steps,
                score = run_best.score,
                "run finished"
            );

            let improved = best.as_ref().map_or(true, |b| run_best.score < b.score);
            if improved {
                best = Some(run_best);
            }
            if best.as_ref().is_some_and(|b| b.score == 0.0) {
                break;
            }
        }

        // runs >= 1, so a snapshot always exists.
        let Some(best) = best else {
            unreachable!("at least one search run always produces a snapshot");
        };

        let violations = self.checker().measure(&best.state.tally_a, &best.state.tally_b);
        let partition = self.export(&best.state);
        let summary = PairSummary {
            set_a: best.state.tally_a,
            set_b: best.state.tally_b,
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;

        // Classify by measured violations, not by the strategy's scalar,
        // so a custom strategy cannot relabel an invalid partition.
        if violations.is_empty() {
            tracing::info!(steps = total_steps, runs = runs_used, "constraints satisfied");
            Outcome::Satisfied(Assignment {
                partition,
                summary,
                steps: total_steps,
                runs: runs_used,
                elapsed_ms,
            })
        } else {
            tracing::info!(
                steps = total_steps,
                runs = runs_used,
                violations = violations.len(),
                "search exhausted"
            );
            Outcome::Exhausted(AssignmentFailure {
                best: partition,
                summary,
                violations,
                steps: total_steps,
                runs: runs_used,
                elapsed_ms,
            })
        }
    }

    fn checker(&self) -> Checker<'_> {
        Checker {
            constraints: self.constraints,
            target_size: self.target_size,
            available: self.catalog.len(),
            concepts: &self.concepts,
        }
    }

    fn eval(&self, tally_a: &SideTally, tally_b: &SideTally) -> f64 {
        self.strategy.score(&self.checker().measure(tally_a, tally_b))
    }

    fn items(&self) -> Vec<&crate::model::QuestionItem> {
        self.catalog.iter().collect()
    }

    /// Seed a candidate partition: deal each concept group to the side
    /// currently lighter in that concept's subparts, largest items first,
    /// then trim and fill both sides to the target item count.
    fn seed(&self, rng: &mut StdRng) -> State {
        let items = self.items();
        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (idx, item) in items.iter().enumerate() {
            groups.entry(item.concept.as_str()).or_default().push(idx);
        }

        let mut state = State {
            a: Vec::new(),
            b: Vec::new(),
            unused: Vec::new(),
            tally_a: SideTally::default(),
            tally_b: SideTally::default(),
        };

        for group in groups.values_mut() {
            group.shuffle(rng);
            // Stable sort keeps the shuffled order among equal sizes.
            group.sort_by(|&x, &y| items[y].subparts.cmp(&items[x].subparts));

            for &idx in group.iter() {
                let item = items[idx];
                let in_a = state
                    .tally_a
                    .per_concept
                    .get(&item.concept)
                    .copied()
                    .unwrap_or(0);
                let in_b = state
                    .tally_b
                    .per_concept
                    .get(&item.concept)
                    .copied()
                    .unwrap_or(0);
                let to_a = match in_a.cmp(&in_b) {
                    std::cmp::Ordering::Less => true,
                    std::cmp::Ordering::Greater => false,
                    std::cmp::Ordering::Equal => rng.gen_bool(0.5),
                };
                if to_a {
                    state.a.push(idx);
                    state.tally_a.add(item);
                } else {
                    state.b.push(idx);
                    state.tally_b.add(item);
                }
            }
        }

        // Trim overfull sides to the target, then refill short ones.
        while state.a.len() > self.target_size {
            let pos = rng.gen_range(0..state.a.len());
            let idx = state.a.swap_remove(pos);
            state.tally_a.remove(items[idx]);
            state.unused.push(idx);
        }
        while state.b.len() > self.target_size {
            let pos = rng.gen_range(0..state.b.len());
            let idx = state.b.swap_remove(pos);
            state.tally_b.remove(items[idx]);
            state.unused.push(idx);
        }
        while state.a.len() < self.target_size && !state.unused.is_empty() {
            let pos = rng.gen_range(0..state.unused.len());
            let idx = state.unused.swap_remove(pos);
            state.a.push(idx);
            state.tally_a.add(items[idx]);
        }
        while state.b.len() < self.target_size && !state.unused.is_empty() {
            let pos = rng.gen_range(0..state.unused.len());
            let idx = state.unused.swap_remove(pos);
            state.b.push(idx);
            state.tally_b.add(items[idx]);
        }

        state
    }

    /// One seeded run of bounded local search. Returns the best snapshot
    /// of the run and the number of steps taken.
    fn search_once(&self, rng: &mut StdRng) -> (Snapshot, u32) {
        let budget = &self.constraints.search;
        let items = self.items();

        let mut state = self.seed(rng);
        let mut score = self.eval(&state.tally_a, &state.tally_b);
        let mut best = Snapshot {
            state: state.clone(),
            score,
        };

        let mut steps = 0u32;
        let mut bad = 0u32;
        let mut bad_streak = 0u32;
        let mut backtrack: Option<Move> = None;

        while score > 0.0
            && steps < budget.max_steps
            && bad < budget.max_bad_steps
            && bad_streak < budget.max_bad_streak
        {
            let Some((mv, mv_score)) = self.best_neighbor(&state, &items, backtrack, rng) else {
                // Isolated state with no legal moves.
                break;
            };

            self.apply(&mut state, &items, mv);
            steps += 1;
            if mv_score < score {
                bad_streak = 0;
            } else {
                bad += 1;
                bad_streak += 1;
            }
            score = mv_score;
            backtrack = Some(mv.reverse());

            if score < best.score {
                best = Snapshot {
                    state: state.clone(),
                    score,
                };
            }
        }

        (best, steps)
    }

    /// Scan an effort-limited, shuffled selection of neighbor moves and
    /// return the best-scoring one. The immediate reversal of the previous
    /// step is skipped to avoid two-cycle oscillation.
    fn best_neighbor(
        &self,
        state: &State,
        items: &[&crate::model::QuestionItem],
        backtrack: Option<Move>,
        rng: &mut StdRng,
    ) -> Option<(Move, f64)> {
        let effort = self.constraints.search.effort.clamp(0.0, 1.0);

        // Interleave the two sides so effort truncation samples both.
        let mut a_members = state.a.clone();
        a_members.shuffle(rng);
        let mut b_members = state.b.clone();
        b_members.shuffle(rng);
        let a_first = rng.gen_bool(0.5);

        let member_quota =
            (((state.a.len() + state.b.len()) as f64) * effort).ceil() as usize;
        let mut members: Vec<(usize, usize)> = Vec::with_capacity(member_quota);
        let (first, second): (Vec<_>, Vec<_>) = if a_first {
            (a_members.clone(), b_members.clone())
        } else {
            (b_members.clone(), a_members.clone())
        };
        let first_side = usize::from(!a_first);
        let second_side = usize::from(a_first);
        let longest = first.len().max(second.len());
        for i in 0..longest {
            if let Some(&idx) = first.get(i) {
                members.push((first_side, idx));
            }
            if let Some(&idx) = second.get(i) {
                members.push((second_side, idx));
            }
        }
        members.truncate(member_quota);

        let mut unused = state.unused.clone();
        unused.shuffle(rng);
        let unused_quota = ((unused.len() as f64) * effort).ceil() as usize;
        unused.truncate(unused_quota);

        let mut best: Option<(Move, f64)> = None;
        let mut consider = |mv: Move, score: f64| {
            if best.as_ref().map_or(true, |(_, s)| score < *s) {
                best = Some((mv, score));
            }
        };

        for &(side, out_idx) in &members {
            for &in_idx in &unused {
                let mv = Move::Replace {
                    side,
                    out_idx,
                    in_idx,
                };
                if Some(mv) == backtrack {
                    continue;
                }
                let score = self.score_replace(state, items, side, out_idx, in_idx);
                consider(mv, score);
            }
        }

        // Same-concept cross swaps shift subparts and answer keys between
        // sides without disturbing concept coverage counts.
        let selected_a: Vec<usize> = members
            .iter()
            .filter(|(s, _)| *s == 0)
            .map(|&(_, i)| i)
            .collect();
        let selected_b: Vec<usize> = members
            .iter()
            .filter(|(s, _)| *s == 1)
            .map(|&(_, i)| i)
            .collect();
        for &a_idx in &selected_a {
            for &b_idx in &selected_b {
                if items[a_idx].concept != items[b_idx].concept {
                    continue;
                }
                let mv = Move::CrossSwap { a_idx, b_idx };
                if Some(mv) == backtrack {
                    continue;
                }
                let score = self.score_cross_swap(state, items, a_idx, b_idx);
                consider(mv, score);
            }
        }

        best
    }

    fn score_replace(
        &self,
        state: &State,
        items: &[&crate::model::QuestionItem],
        side: usize,
        out_idx: usize,
        in_idx: usize,
    ) -> f64 {
        let mut tally_a = state.tally_a.clone();
        let mut tally_b = state.tally_b.clone();
        let tally = if side == 0 { &mut tally_a } else { &mut tally_b };
        tally.remove(items[out_idx]);
        tally.add(items[in_idx]);
        self.eval(&tally_a, &tally_b)
    }

    fn score_cross_swap(
        &self,
        state: &State,
        items: &[&crate::model::QuestionItem],
        a_idx: usize,
        b_idx: usize,
    ) -> f64 {
        let mut tally_a = state.tally_a.clone();
        let mut tally_b = state.tally_b.clone();
        tally_a.remove(items[a_idx]);
        tally_a.add(items[b_idx]);
        tally_b.remove(items[b_idx]);
        tally_b.add(items[a_idx]);
        self.eval(&tally_a, &tally_b)
    }

    fn apply(&self, state: &mut State, items: &[&crate::model::QuestionItem], mv: Move) {
        match mv {
            Move::Replace {
                side,
                out_idx,
                in_idx,
            } => {
                let (members, tally) = if side == 0 {
                    (&mut state.a, &mut state.tally_a)
                } else {
                    (&mut state.b, &mut state.tally_b)
                };
                if let Some(pos) = members.iter().position(|&i| i == out_idx) {
                    members.swap_remove(pos);
                }
                members.push(in_idx);
                tally.remove(items[out_idx]);
                tally.add(items[in_idx]);

                if let Some(pos) = state.unused.iter().position(|&i| i == in_idx) {
                    state.unused.swap_remove(pos);
                }
                state.unused.push(out_idx);
            }
            Move::CrossSwap { a_idx, b_idx } => {
                if let Some(pos) = state.a.iter().position(|&i| i == a_idx) {
                    state.a[pos] = b_idx;
                }
                if let Some(pos) = state.b.iter().position(|&i| i == b_idx) {
                    state.b[pos] = a_idx;
                }
                state.tally_a.remove(items[a_idx]);
                state.tally_a.add(items[b_idx]);
                state.tally_b.remove(items[b_idx]);
                state.tally_b.add(items[a_idx]);
            }
        }
    }

    fn export(&self, state: &State) -> Partition {
        let items = self.items();
        let to_ids = |indices: &[usize]| -> Vec<String> {
            indices.iter().map(|&i| items[i].id.clone()).collect()
        };
        Partition::new(to_ids(&state.a), to_ids(&state.b), to_ids(&state.unused))
    }
}
