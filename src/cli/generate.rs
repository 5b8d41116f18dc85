//! Card generation (`bingo generate`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tombola::GenerationBatch;

use crate::cli::utils::{rng_from_seed, write_output};

/// Args for `bingo generate`.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Number of cards to generate.
    #[arg(short = 'n', long)]
    pub count: usize,
    /// Game name printed on every card.
    #[arg(short = 'l', long)]
    pub label: String,
    /// Output JSON file (`-` for stdout, the default).
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Seed for reproducible cards.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Print a text grid for each card instead of JSON.
    #[arg(long)]
    pub text: bool,
}

pub fn handle(args: GenerateArgs) -> Result<()> {
    let mut rng = rng_from_seed(args.seed);
    let batch = GenerationBatch::generate(&mut rng, args.count, &args.label)?;

    let rendered = if args.text {
        let grids: Vec<String> = batch.cards.iter().map(|c| c.render_text()).collect();
        grids.join("\n")
    } else {
        let mut json =
            serde_json::to_string_pretty(&batch).context("failed to serialize card batch")?;
        json.push('\n');
        json
    };

    match args.output {
        Some(path) if path.as_os_str() != "-" => {
            write_output(&path, &rendered)?;
            eprintln!(
                "Generated {} '{}' cards into {}",
                batch.len(),
                batch.label,
                path.display()
            );
        }
        _ => print!("{}", rendered),
    }
    Ok(())
}
