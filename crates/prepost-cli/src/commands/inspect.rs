//! `prepost inspect` — catalog statistics at a glance.

use std::path::PathBuf;

use clap::Args;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use prepost_core::parser;

#[derive(Args)]
pub struct InspectArgs {
    /// Catalog CSV file.
    #[arg(long)]
    pub catalog: PathBuf,
}

pub fn run(args: InspectArgs) -> anyhow::Result<i32> {
    let catalog = parser::load_catalog(&args.catalog)?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Concept", "Items", "Subparts", "True ratio"]);

    for concept in catalog.concepts() {
        let mut items = 0usize;
        let mut subparts = 0u32;
        let mut trues = 0u32;
        for item in catalog.iter().filter(|i| i.concept == concept) {
            items += 1;
            subparts += item.subparts;
            trues += item.true_count;
        }
        table.add_row(vec![
            concept,
            items.to_string(),
            subparts.to_string(),
            format!("{:.3}", f64::from(trues) / f64::from(subparts)),
        ]);
    }

    let total_subparts = catalog.total_subparts();
    table.add_row(vec![
        "(all)".to_string(),
        catalog.len().to_string(),
        total_subparts.to_string(),
        format!(
            "{:.3}",
            f64::from(catalog.total_trues()) / f64::from(total_subparts)
        ),
    ]);

    println!("{table}");
    Ok(0)
}
