//! Single card rendering (`bingo preview`).

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Args;
use tombola::CardPainter;

use crate::cli::common::CardStyleArg;
use crate::cli::utils::load_batch;

/// Args for `bingo preview`.
#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Card batch written by `bingo generate`.
    #[arg(long)]
    pub cards: PathBuf,
    /// 1-based serial of the card to render.
    #[arg(short = 's', long, default_value_t = 1)]
    pub serial: u32,
    /// Output PNG file.
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Visual style of the card face.
    #[arg(long, default_value_t = CardStyleArg::Classic, value_enum)]
    pub style: CardStyleArg,
}

pub fn handle(args: PreviewArgs) -> Result<()> {
    let batch = load_batch(&args.cards)?;
    let card = batch
        .cards
        .iter()
        .find(|c| c.serial == args.serial)
        .ok_or_else(|| {
            anyhow!(
                "card #{} not found; batch holds 1..{}",
                args.serial,
                batch.len()
            )
        })?;

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create output directory {}", parent.display())
            })?;
        }
    }
    let image = CardPainter::new(args.style.into()).paint(card);
    image
        .save(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    println!("Rendered card #{:04} to {}", card.serial, args.output.display());
    Ok(())
}
