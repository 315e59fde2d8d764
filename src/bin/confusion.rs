use clap::Parser;

use phonolab::cli::ConfusionCli;
use phonolab::render::render_confusion_file;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = ConfusionCli::parse();
    let output = cli.output_path();
    let matrix = render_confusion_file(&cli.matrix, &output)?;

    println!(
        "Wrote {}x{} heatmap to {}",
        matrix.size(),
        matrix.size(),
        output.display()
    );
    if let Some(overall) = matrix.overall_accuracy() {
        println!("Overall accuracy: {:.2}%", overall * 100.0);
    }
    Ok(())
}
