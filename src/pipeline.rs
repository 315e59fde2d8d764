//! Jenks batch pipeline: scan → classify → write `.jen` → render figure.
//!
//! Datasets are independent. Anything that goes wrong with one dataset is
//! logged and the dataset skipped; only configuration errors and a streak of
//! I/O failures abort the run.

use std::fmt;
use std::path::PathBuf;

use log::{debug, info, warn};

use crate::classify::{BreakComputer, Classified, NaturalBreaks, classify};
use crate::config::PipelineConfig;
use crate::data::loader::scan;
use crate::data::model::{BreakSet, Dataset};
use crate::data::writer::write_breaks;
use crate::error::{PipelineError, SkipReason, chain};
use crate::render::render_density;

// ---------------------------------------------------------------------------
// Run results
// ---------------------------------------------------------------------------

/// Artifacts produced for one dataset.
#[derive(Debug, Clone)]
pub struct Processed {
    pub source: PathBuf,
    pub breaks: BreakSet,
    pub breaks_file: PathBuf,
    pub figure: Option<PathBuf>,
}

/// A dataset that was left out, and why.
#[derive(Debug)]
pub struct Skipped {
    pub source: PathBuf,
    pub reason: SkipReason,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub processed: Vec<Processed>,
    pub skipped: Vec<Skipped>,
}

impl RunSummary {
    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed {} dataset(s), skipped {}",
            self.processed_count(),
            self.skipped_count()
        )?;
        for skipped in &self.skipped {
            write!(
                f,
                "\n  skipped {}: {}",
                skipped.source.display(),
                chain(&skipped.reason)
            )?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Run the pipeline with the default [`NaturalBreaks`] classifier.
pub fn run(config: &PipelineConfig) -> Result<RunSummary, PipelineError> {
    run_with(&NaturalBreaks, config)
}

/// Run the pipeline over `config.root` using `computer` for the breaks.
pub fn run_with<C>(computer: &C, config: &PipelineConfig) -> Result<RunSummary, PipelineError>
where
    C: BreakComputer + ?Sized,
{
    config.validate()?;
    info!(
        "processing {} with {} classes",
        config.root.display(),
        config.class_count
    );

    let mut summary = RunSummary::default();
    let mut io_streak = 0usize;
    let mut current_dir: Option<PathBuf> = None;

    for item in scan(&config.root, &config.extension) {
        let (source, outcome) = match item {
            Ok(dataset) => {
                if current_dir.as_deref() != Some(dataset.dir.as_path()) {
                    info!("Processing :: {}", dataset.dir.display());
                    current_dir = Some(dataset.dir.clone());
                }
                (dataset.source.clone(), process(computer, &dataset, config))
            }
            Err(e) => (e.path().to_path_buf(), Err(SkipReason::from(e))),
        };

        match outcome {
            Ok(done) => {
                debug!(
                    "{} -> {} ({} breaks)",
                    done.source.display(),
                    done.breaks_file.display(),
                    done.breaks.len()
                );
                io_streak = 0;
                summary.processed.push(done);
            }
            Err(reason) => {
                warn!("skipping {}: {}", source.display(), chain(&reason));
                if reason.is_io() {
                    io_streak += 1;
                    if io_streak >= config.max_consecutive_io_failures {
                        return Err(PipelineError::IoEscalation {
                            count: io_streak,
                            last: chain(&reason),
                        });
                    }
                }
                summary.skipped.push(Skipped { source, reason });
            }
        }
    }

    info!("{summary}");
    Ok(summary)
}

/// Classify one dataset and persist its artifacts.
fn process<C>(computer: &C, dataset: &Dataset, config: &PipelineConfig) -> Result<Processed, SkipReason>
where
    C: BreakComputer + ?Sized,
{
    let Classified { breaks, sorted } = classify(computer, &dataset.values, config.class_count)?;
    let group = dataset.output_group();

    let breaks_file = write_breaks(&group, &dataset.name, &breaks).map_err(|source| {
        SkipReason::Write {
            path: group.breaks_path(&dataset.name),
            source,
        }
    })?;

    let figure = if config.figures {
        Some(render_density(
            &group,
            &dataset.name,
            &sorted,
            &breaks,
            config.figure_size,
        )?)
    } else {
        None
    };

    Ok(Processed {
        source: dataset.source.clone(),
        breaks,
        breaks_file,
        figure,
    })
}
