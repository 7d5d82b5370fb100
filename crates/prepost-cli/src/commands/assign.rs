//! `prepost assign` — run the partition engine and emit its artifacts.

use std::path::PathBuf;

use clap::Args;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use prepost_core::engine;
use prepost_core::model::Constraints;
use prepost_core::parser;
use prepost_core::report::{AssignmentReport, ReportStatus};

#[derive(Args)]
pub struct AssignArgs {
    /// Catalog CSV file.
    #[arg(long)]
    pub catalog: PathBuf,

    /// Constraint TOML file; built-in defaults apply when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the RNG seed for a reproducible run.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the number of independent search restarts.
    #[arg(long)]
    pub runs: Option<u32>,

    /// Override the number of items per output set.
    #[arg(long)]
    pub questions_per_set: Option<usize>,

    /// Write the full JSON run report here.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Append this run to a CSV assignment log.
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// Write a markdown summary here.
    #[arg(long)]
    pub markdown: Option<PathBuf>,
}

pub fn run(args: AssignArgs) -> anyhow::Result<i32> {
    let catalog = parser::load_catalog(&args.catalog)?;
    let mut constraints = match &args.config {
        Some(path) => parser::load_constraints(path)?,
        None => Constraints::default(),
    };
    if let Some(seed) = args.seed {
        constraints.search.seed = Some(seed);
    }
    if let Some(runs) = args.runs {
        constraints.search.runs = runs;
    }
    if let Some(n) = args.questions_per_set {
        constraints.questions_per_set = Some(n);
    }
    // Flag overrides bypass the file loader, so re-check.
    parser::validate_constraints(&constraints)?;

    let outcome = engine::assign(&catalog, &constraints)?;
    let report = AssignmentReport::from_outcome(&outcome, &catalog, &constraints);
    tracing::debug!(
        status = %report.status,
        steps = report.steps,
        runs = report.runs,
        "engine finished"
    );

    print_summary(&report);

    if let Some(path) = &args.output {
        report.save_json(path)?;
    }
    if let Some(path) = &args.log {
        prepost_report::csv::append_to_log(path, &report)?;
    }
    if let Some(path) = &args.markdown {
        prepost_report::markdown::save(path, &report)?;
    }

    match report.status {
        ReportStatus::Satisfied => Ok(0),
        ReportStatus::Exhausted => {
            eprintln!("constraints not satisfied within the search budget:");
            for v in &report.violations {
                eprintln!("  - {v}");
            }
            Ok(3)
        }
    }
}

fn print_summary(report: &AssignmentReport) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Set", "Items", "Subparts", "True ratio", "Item ids"]);
    for (label, tally, ids) in [
        ("pre", &report.summary.set_a, &report.partition.set_a),
        ("post", &report.summary.set_b, &report.partition.set_b),
    ] {
        table.add_row(vec![
            label.to_string(),
            tally.items.to_string(),
            tally.subparts.to_string(),
            format!("{:.3}", tally.true_ratio()),
            ids.join(", "),
        ]);
    }
    println!("{table}");
    println!(
        "status: {} ({} steps, {} run(s))",
        report.status, report.steps, report.runs
    );
    if !report.partition.unassigned.is_empty() {
        println!("unassigned: {}", report.partition.unassigned.join(", "));
    }
}
