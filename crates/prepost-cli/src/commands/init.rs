//! `prepost init` — write a starter constraint file.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Args;

#[derive(Args)]
pub struct InitArgs {
    /// Destination for the constraint file.
    #[arg(long, default_value = "constraints.toml")]
    pub path: PathBuf,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

const TEMPLATE: &str = r#"# prepost constraint file. Every field is optional; anything removed
# falls back to the built-in default shown here.

[sets]
# questions_per_set = 15
# subparts_min = 20
# subparts_max = 40

[balance]
subpart_diff_max = 2
true_ratio_min = 0.4
true_ratio_max = 0.6
concept_balance_max = 2
concept_min_subparts = 0
# expected_concepts = ["genetics", "ecology"]

[search]
max_steps = 100
max_bad_steps = 50
max_bad_streak = 10
effort = 0.5
runs = 3
# seed = 42
"#;

pub fn run(args: InitArgs) -> anyhow::Result<i32> {
    if args.path.exists() && !args.force {
        bail!(
            "{} already exists; pass --force to overwrite",
            args.path.display()
        );
    }
    fs::write(&args.path, TEMPLATE)
        .with_context(|| format!("failed to write {}", args.path.display()))?;
    println!("wrote {}", args.path.display());
    Ok(0)
}
