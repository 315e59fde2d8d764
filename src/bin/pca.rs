use anyhow::Context;
use clap::Parser;

use phonolab::analysis::{analyse, write_results, FeatureTable};
use phonolab::cli::PcaCli;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = PcaCli::parse();
    let table = FeatureTable::load_dir(&cli.root)
        .with_context(|| format!("loading feature tables from {}", cli.root.display()))?;
    println!(
        "Loaded {} rows of {} coefficients",
        table.len(),
        table.features.ncols()
    );

    let analysis = analyse(&table, cli.clusters)?;
    for (i, ratio) in analysis.explained_variance_ratio.iter().enumerate() {
        println!("PC{}: {:.2}% of variance", i + 1, ratio * 100.0);
    }

    for path in write_results(&analysis, &cli.output)? {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
