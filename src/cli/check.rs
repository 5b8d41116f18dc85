//! Pattern checks (`bingo check`).

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tombola::{BingoSession, Pattern};

use crate::cli::common::PatternArg;
use crate::cli::utils::{load_batch, parse_number_list};

/// Args for `bingo check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Card batch written by `bingo generate`.
    #[arg(long)]
    pub cards: PathBuf,
    /// Drawn numbers, comma or space separated.
    #[arg(long)]
    pub drawn: String,
    /// Pattern to check; every pattern when omitted.
    #[arg(long, value_enum)]
    pub pattern: Option<PatternArg>,
}

pub fn handle(args: CheckArgs) -> Result<()> {
    let mut session = BingoSession::new();
    session.replace_batch(load_batch(&args.cards)?);
    for number in parse_number_list(&args.drawn)? {
        session.tombola_mut().mark(number);
    }

    let patterns: Vec<Pattern> = match args.pattern {
        Some(p) => vec![p.into()],
        None => Pattern::ALL.to_vec(),
    };
    for pattern in patterns {
        let winners = session.winners(pattern);
        if winners.is_empty() {
            println!("{:<12} -", format!("{:?}", pattern));
        } else {
            let serials: Vec<String> = winners.iter().map(|s| format!("#{:04}", s)).collect();
            println!("{:<12} {}", format!("{:?}", pattern), serials.join(", "));
        }
    }
    Ok(())
}
