//! Core domain primitives: cards, generation, the draw drum and win patterns.

pub mod card;
pub mod generator;
pub mod pattern;
pub mod session;
pub mod tombola;

pub use card::{
    BingoColumn, CELLS_PER_COLUMN, COLUMN_SPAN, Cell, CardError, CardRecord, ColumnEntry,
    ColumnLabel, FREE_ENTRY, FREE_ROW, MAX_NUMBER,
};
pub use generator::{GenerateError, MAX_DRAW_ATTEMPTS, generate, generate_with};
pub use pattern::{Marks, Pattern};
pub use session::{BingoSession, GenerationBatch};
pub use tombola::Tombola;
