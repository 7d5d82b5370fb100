//! Markdown summary of an assignment run.
//!
//! Rendered for humans: the instructor checking what went where and why
//! a run came back exhausted.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::Context;
use prepost_core::report::{AssignmentReport, ReportStatus};
use prepost_core::score::SideTally;

/// Render a report as a standalone markdown document.
pub fn render(report: &AssignmentReport) -> String {
    let mut out = String::new();

    let headline = match report.status {
        ReportStatus::Satisfied => "Assignment satisfied",
        ReportStatus::Exhausted => "Assignment exhausted",
    };
    let _ = writeln!(out, "# {headline}\n");
    let _ = writeln!(out, "- Run: `{}`", report.id);
    let _ = writeln!(out, "- Created: {}", report.created_at.to_rfc3339());
    let _ = writeln!(out, "- Catalog items: {}", report.catalog_items);
    let _ = writeln!(
        out,
        "- Search: {} steps over {} run(s) in {} ms\n",
        report.steps, report.runs, report.elapsed_ms
    );

    let _ = writeln!(out, "| Set | Items | Subparts | True ratio |");
    let _ = writeln!(out, "|-----|-------|----------|------------|");
    for (label, tally) in [
        ("pre", &report.summary.set_a),
        ("post", &report.summary.set_b),
    ] {
        let _ = writeln!(
            out,
            "| {label} | {} | {} | {:.3} |",
            tally.items,
            tally.subparts,
            tally.true_ratio()
        );
    }
    out.push('\n');

    write_concepts(&mut out, &report.summary.set_a, &report.summary.set_b);

    for (label, ids) in [
        ("Pre set", &report.partition.set_a),
        ("Post set", &report.partition.set_b),
        ("Unassigned", &report.partition.unassigned),
    ] {
        if ids.is_empty() {
            continue;
        }
        let _ = writeln!(out, "## {label}\n");
        let _ = writeln!(out, "{}\n", ids.join(", "));
    }

    if !report.violations.is_empty() {
        let _ = writeln!(out, "## Outstanding violations\n");
        for v in &report.violations {
            let _ = writeln!(out, "- {v}");
        }
        out.push('\n');
    }

    out
}

/// Per-concept subpart table; skipped when both tallies are empty.
fn write_concepts(out: &mut String, a: &SideTally, b: &SideTally) {
    let concepts: std::collections::BTreeSet<&String> =
        a.per_concept.keys().chain(b.per_concept.keys()).collect();
    if concepts.is_empty() {
        return;
    }
    let _ = writeln!(out, "| Concept | Pre subparts | Post subparts |");
    let _ = writeln!(out, "|---------|--------------|---------------|");
    for concept in concepts {
        let in_a = a.per_concept.get(concept).copied().unwrap_or(0);
        let in_b = b.per_concept.get(concept).copied().unwrap_or(0);
        let _ = writeln!(out, "| {concept} | {in_a} | {in_b} |");
    }
    out.push('\n');
}

/// Render and write the markdown document.
pub fn save(path: &Path, report: &AssignmentReport) -> anyhow::Result<()> {
    fs::write(path, render(report))
        .with_context(|| format!("failed to write markdown report to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use prepost_core::engine::assign;
    use prepost_core::model::{Catalog, Constraints, QuestionItem, SearchBudget};

    fn report_for(items: Vec<QuestionItem>, constraints: Constraints) -> AssignmentReport {
        let catalog = Catalog::new(items);
        let outcome = assign(&catalog, &constraints).unwrap();
        AssignmentReport::from_outcome(&outcome, &catalog, &constraints)
    }

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
    fn satisfied_report_renders_tables_and_sets() {
        let constraints = Constraints {
            search: SearchBudget {
                seed: Some(9),
                ..SearchBudget::default()
            },
            ..Constraints::default()
        };
        let report = report_for(
            vec![
                item("q1", "genetics", 2, 1),
                item("q2", "genetics", 2, 1),
                item("q3", "ecology", 2, 1),
                item("q4", "ecology", 2, 1),
            ],
            constraints,
        );
        let md = render(&report);
        assert!(md.starts_with("# Assignment satisfied"));
        assert!(md.contains("| pre | 2 | 4 | 0.500 |"));
        assert!(md.contains("| genetics | 2 | 2 |"));
        assert!(md.contains("## Pre set"));
        assert!(md.contains("## Post set"));
        assert!(!md.contains("Outstanding violations"));
    }

    #[test]
    fn exhausted_report_lists_violations() {
        // All-true answer keys cannot fit the default ratio band.
        let constraints = Constraints {
            search: SearchBudget {
                seed: Some(9),
                runs: 1,
                ..SearchBudget::default()
            },
            ..Constraints::default()
        };
        let report = report_for(
            vec![
                item("q1", "genetics", 2, 2),
                item("q2", "genetics", 2, 2),
                item("q3", "genetics", 2, 2),
                item("q4", "genetics", 2, 2),
            ],
            constraints,
        );
        let md = render(&report);
        assert!(md.starts_with("# Assignment exhausted"));
        assert!(md.contains("## Outstanding violations"));
        assert!(md.contains("true ratio"));
    }

    #[test]
    fn save_writes_to_disk() {
        let constraints = Constraints {
            search: SearchBudget {
                seed: Some(2),
                ..SearchBudget::default()
            },
            ..Constraints::default()
        };
        let report = report_for(
            vec![item("q1", "genetics", 2, 1), item("q2", "genetics", 2, 1)],
            constraints,
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.md");
        save(&path, &report).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("# Assignment"));
    }
}
