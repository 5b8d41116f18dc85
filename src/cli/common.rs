//! Shared clap helper types for CLI commands.

use clap::ValueEnum;
use tombola::{CardStyle, Pattern};

/// Colour schemes accepted by `--style`.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum CardStyleArg {
    Classic,
    Night,
    Mono,
}

impl From<CardStyleArg> for CardStyle {
    fn from(value: CardStyleArg) -> CardStyle {
        match value {
            CardStyleArg::Classic => CardStyle::Classic,
            CardStyleArg::Night => CardStyle::Night,
            CardStyleArg::Mono => CardStyle::Mono,
        }
    }
}

/// Winning patterns accepted by `--pattern`.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum PatternArg {
    Line,
    Column,
    Diagonal,
    #[value(name = "four-corners")]
    FourCorners,
    #[value(name = "full-card")]
    FullCard,
}

impl From<PatternArg> for Pattern {
    fn from(value: PatternArg) -> Pattern {
        match value {
            PatternArg::Line => Pattern::Line,
            PatternArg::Column => Pattern::Column,
            PatternArg::Diagonal => Pattern::Diagonal,
            PatternArg::FourCorners => Pattern::FourCorners,
            PatternArg::FullCard => Pattern::FullCard,
        }
    }
}
