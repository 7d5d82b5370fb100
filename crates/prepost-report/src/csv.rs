//! CSV assignment log.
//!
//! Each run appends a small block of rows to a shared log file: a header
//! row with the timestamp and status, one row per output set listing its
//! item ids, and a summary row per set. Appending keeps a season's worth
//! of runs reviewable in one place.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use prepost_core::report::AssignmentReport;
use prepost_core::score::SideTally;

/// Quote a field when it contains a comma, quote, or newline.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn write_row<W: Write>(out: &mut W, fields: &[&str]) -> anyhow::Result<()> {
    let row: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
    writeln!(out, "{}", row.join(",")).context("failed to write CSV row")
}

fn summary_row<W: Write>(out: &mut W, label: &str, tally: &SideTally) -> anyhow::Result<()> {
    write_row(
        out,
        &[
            "summary",
            label,
            &format!("items={}", tally.items),
            &format!("subparts={}", tally.subparts),
            &format!("true_ratio={:.3}", tally.true_ratio()),
        ],
    )
}

/// Write one run's block of rows.
pub fn write_assignment<W: Write>(out: &mut W, report: &AssignmentReport) -> anyhow::Result<()> {
    write_row(
        out,
        &[
            "run",
            &report.created_at.to_rfc3339(),
            &report.status.to_string(),
            &report.id.to_string(),
        ],
    )?;

    let id_row = |label: &str, ids: &[String]| -> Vec<String> {
        std::iter::once(label.to_string())
            .chain(ids.iter().cloned())
            .collect()
    };
    for (label, ids) in [
        ("pre", &report.partition.set_a),
        ("post", &report.partition.set_b),
        ("unassigned", &report.partition.unassigned),
    ] {
        let row = id_row(label, ids);
        let refs: Vec<&str> = row.iter().map(String::as_str).collect();
        write_row(out, &refs)?;
    }

    summary_row(out, "pre", &report.summary.set_a)?;
    summary_row(out, "post", &report.summary.set_b)?;
    Ok(())
}

/// Append a run's block to the log file, creating it if needed.
pub fn append_to_log(path: &Path, report: &AssignmentReport) -> anyhow::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open assignment log {}", path.display()))?;
    write_assignment(&mut file, report)?;
    Ok(())
}
