//! `prepost validate` — check inputs without running the engine.

use std::path::PathBuf;

use clap::Args;
use prepost_core::model::Constraints;
use prepost_core::parser;

#[derive(Args)]
pub struct ValidateArgs {
    /// Catalog CSV file.
    #[arg(long)]
    pub catalog: PathBuf,

    /// Constraint TOML file to check alongside the catalog.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: ValidateArgs) -> anyhow::Result<i32> {
    let catalog = parser::load_catalog(&args.catalog)?;
    let constraints = match &args.config {
        Some(path) => parser::load_constraints(path)?,
        None => Constraints::default(),
    };
    parser::validate_catalog(&catalog, &constraints.expected_concepts)?;

    println!(
        "ok: {} items across {} concepts, {} subparts total",
        catalog.len(),
        catalog.concepts().len(),
        catalog.total_subparts()
    );

    // Feasibility hints: not errors, but an assignment run will fail.
    let target = constraints.target_set_size(catalog.len());
    if catalog.len() < 2 * target {
        println!(
            "warning: catalog has {} items but two sets of {} need {}",
            catalog.len(),
            target,
            2 * target
        );
    }
    let overall_ratio =
        f64::from(catalog.total_trues()) / f64::from(catalog.total_subparts());
    if overall_ratio < constraints.true_ratio_min || overall_ratio > constraints.true_ratio_max {
        println!(
            "warning: overall true ratio {:.3} is outside [{:.2}, {:.2}]; \
             no split can bring both sets inside the band",
            overall_ratio, constraints.true_ratio_min, constraints.true_ratio_max
        );
    }
    Ok(0)
}
