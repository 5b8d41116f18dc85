//! PDF export (`bingo export`).

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Args;
use tombola::{
    CancelToken, ExportConfig, GenerationBatch, Progress, ProgressReporter, ProgressStage,
    export_cards_to_pdf,
};
use tracing::info;

use crate::cli::common::CardStyleArg;
use crate::cli::utils::{load_batch, rng_from_seed};

/// Args for `bingo export`.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Number of cards to generate.
    #[arg(short = 'n', long, required_unless_present = "cards")]
    pub count: Option<usize>,
    /// Game name printed on every card.
    #[arg(short = 'l', long, required_unless_present = "cards")]
    pub label: Option<String>,
    /// Export an existing batch written by `bingo generate` instead of generating one.
    #[arg(long, conflicts_with_all = ["count", "label", "seed"])]
    pub cards: Option<PathBuf>,
    /// Directory the PDF is written to.
    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,
    /// JSON file with export tunables.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Cards processed between pauses.
    #[arg(long = "batch-size")]
    pub batch_size: Option<usize>,
    /// Resolution multiplier for rasterised cards.
    #[arg(long = "raster-scale")]
    pub raster_scale: Option<f32>,
    /// JPEG quality in (0, 1].
    #[arg(long)]
    pub quality: Option<f32>,
    /// Skip the pauses between batches.
    #[arg(long = "no-delay")]
    pub no_delay: bool,
    /// Visual style of the card face.
    #[arg(long, default_value_t = CardStyleArg::Classic, value_enum)]
    pub style: CardStyleArg,
    /// Seed for reproducible cards.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Prints progress on stderr so stdout stays clean.
struct ConsoleProgress;

impl ProgressReporter for ConsoleProgress {
    fn report(&mut self, progress: &Progress) {
        let marker = match progress.stage {
            ProgressStage::Failed => "!",
            _ => " ",
        };
        let mut stderr = io::stderr();
        writeln!(stderr, "[{:>3}%]{} {}", progress.percent, marker, progress.message).ok();
    }
}

pub fn handle(args: ExportArgs) -> Result<()> {
    let config = build_config(&args)?;
    let batch = match &args.cards {
        Some(path) => load_batch(path)?,
        None => {
            let count = args
                .count
                .ok_or_else(|| anyhow!("--count is required unless --cards is given"))?;
            let label = args
                .label
                .as_deref()
                .ok_or_else(|| anyhow!("--label is required unless --cards is given"))?;
            let mut rng = rng_from_seed(args.seed);
            GenerationBatch::generate(&mut rng, count, label)?
        }
    };
    info!(cards = batch.len(), label = %batch.label, "exporting");

    let report = export_cards_to_pdf(
        &batch.cards,
        &config,
        args.style.into(),
        &args.output_dir,
        &mut ConsoleProgress,
        CancelToken::new(),
    )
    .with_context(|| format!("failed to export {} cards", batch.len()))?;

    let location = report
        .artifact
        .path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| report.artifact.name.clone());
    println!(
        "Exported {} of {} cards on {} page(s) to {}",
        report.placed, report.total, report.pages, location
    );
    if report.failed > 0 {
        println!("{} card(s) could not be rendered and were skipped", report.failed);
    }
    Ok(())
}

fn build_config(args: &ExportArgs) -> Result<ExportConfig> {
    let mut config = match &args.config {
        Some(path) => ExportConfig::load(path)?,
        None => ExportConfig::default(),
    };
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(scale) = args.raster_scale {
        config.raster_scale = scale;
    }
    if let Some(quality) = args.quality {
        config.image_quality = quality;
    }
    if args.no_delay {
        config = config.without_delays();
    }
    config.validate()?;
    Ok(config)
}
