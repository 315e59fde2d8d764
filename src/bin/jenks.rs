use anyhow::Context;
use clap::Parser;

use phonolab::cli::JenksCli;
use phonolab::pipeline;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = JenksCli::parse();
    let config = cli.to_config();

    println!("Processing Jenks with {} breaks", config.class_count);
    let summary = pipeline::run(&config)
        .with_context(|| format!("jenks run over {} failed", config.root.display()))?;
    println!("{summary}");
    Ok(())
}
