//! Command-line interface wiring for the `bingo` binary.
//!
//! This module owns the clap definitions and delegates execution to
//! one submodule per command.

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod check;
pub mod common;
pub mod draw;
pub mod export;
pub mod generate;
pub mod preview;
pub mod utils;

/// Parsed CLI entrypoint for the `bingo` binary.
#[derive(Parser, Debug)]
#[command(name = "bingo", version, about = "Bingo card generator and printable PDF exporter")]
pub struct Cli {
    /// Top-level command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Commands made available to end users.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a batch of cards as JSON.
    Generate(generate::GenerateArgs),
    /// Generate (or load) cards and export them as a printable PDF.
    Export(export::ExportArgs),
    /// Draw numbers from the tombola, optionally playing a card batch.
    Draw(draw::DrawArgs),
    /// List cards that complete a pattern for a set of drawn numbers.
    Check(check::CheckArgs),
    /// Render one card face to a PNG file.
    Preview(preview::PreviewArgs),
}

/// Execute the requested command.
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Generate(args) => generate::handle(args),
        Command::Export(args) => export::handle(args),
        Command::Draw(args) => draw::handle(args),
        Command::Check(args) => check::handle(args),
        Command::Preview(args) => preview::handle(args),
    }
}
