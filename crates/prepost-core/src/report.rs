//! Persistent run artifacts.
//!
//! Every engine invocation can be captured as an [`AssignmentReport`] and
//! written to JSON, so a run is reproducible and auditable after the fact:
//! the report carries the constraints that were in force, the partition,
//! the side tallies, and any residual violations.

use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::{Outcome, PairSummary};
use crate::model::{Catalog, Constraints, Partition};
use crate::score::Violation;

/// Terminal status of an engine run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Satisfied,
    Exhausted,
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Satisfied => write!(f, "satisfied"),
            ReportStatus::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// A complete record of one assignment run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentReport {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub status: ReportStatus,
    /// Catalog size the run drew from.
    pub catalog_items: usize,
    /// Constraints in force, including the search budget and seed.
    pub constraints: Constraints,
    pub partition: Partition,
    pub summary: PairSummary,
    /// Residual violations; empty when the status is `Satisfied`.
    pub violations: Vec<Violation>,
    pub steps: u32,
    pub runs: u32,
    pub elapsed_ms: u64,
}

impl AssignmentReport {
    /// Capture an engine outcome together with the inputs that shaped it.
    pub fn from_outcome(
        outcome: &Outcome,
        catalog: &Catalog,
        constraints: &Constraints,
    ) -> Self {
        let (status, steps, runs, elapsed_ms) = match outcome {
            Outcome::Satisfied(a) => (ReportStatus::Satisfied, a.steps, a.runs, a.elapsed_ms),
            Outcome::Exhausted(f) => (ReportStatus::Exhausted, f.steps, f.runs, f.elapsed_ms),
        };
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            status,
            catalog_items: catalog.len(),
            constraints: constraints.clone(),
            partition: outcome.partition().clone(),
            summary: outcome.summary().clone(),
            violations: outcome.violations().to_vec(),
            steps,
            runs,
            elapsed_ms,
        }
    }

    /// Write the report as pretty-printed JSON.
    pub fn save_json(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        tracing::debug!(path = %path.display(), status = %self.status, "report saved");
        Ok(())
    }

    /// Read a previously saved report.
    pub fn load_json(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid report JSON in {}", path.display()))
    }
}
