//! Tombola draws (`bingo draw`).

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tombola::{BingoSession, ColumnLabel, Pattern};

use crate::cli::common::PatternArg;
use crate::cli::utils::{load_batch, rng_from_seed};

/// Args for `bingo draw`.
#[derive(Args, Debug)]
pub struct DrawArgs {
    /// How many numbers to draw (at most 75).
    #[arg(short = 'n', long, default_value_t = 75)]
    pub count: usize,
    /// Card batch to play; draws stop once a card completes the pattern.
    #[arg(long)]
    pub cards: Option<PathBuf>,
    /// Pattern a card must complete to win.
    #[arg(long, default_value_t = PatternArg::Line, value_enum)]
    pub pattern: PatternArg,
    /// Seed for a reproducible draw order.
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn handle(args: DrawArgs) -> Result<()> {
    let mut rng = rng_from_seed(args.seed);
    let mut session = BingoSession::new();
    if let Some(path) = &args.cards {
        session.replace_batch(load_batch(path)?);
    }
    let pattern: Pattern = args.pattern.into();

    let mut winners = Vec::new();
    for turn in 1..=args.count {
        let Some(number) = session.tombola_mut().draw(&mut rng) else {
            break;
        };
        let column = ColumnLabel::for_number(number)
            .map(|c| c.to_string())
            .unwrap_or_default();
        println!("{:>2}. {}-{}", turn, column, number);
        if session.batch().is_some() {
            winners = session.winners(pattern);
            if !winners.is_empty() {
                break;
            }
        }
    }

    println!();
    for (column, numbers) in session.tombola().table() {
        let list: Vec<String> = numbers.iter().map(|n| n.to_string()).collect();
        println!("{} | {}", column, list.join(" "));
    }
    if session.batch().is_some() {
        if winners.is_empty() {
            println!("No card completed {:?} yet", pattern);
        } else {
            let serials: Vec<String> = winners.iter().map(|s| format!("#{:04}", s)).collect();
            println!("Winner(s) for {:?}: {}", pattern, serials.join(", "));
        }
    }
    Ok(())
}
