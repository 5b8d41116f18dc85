use serde::{Deserialize, Serialize};

use crate::core::card::{CELLS_PER_COLUMN, CardRecord, Cell};

/// Mark grid indexed `[row][column]`.
pub type Marks = [[bool; CELLS_PER_COLUMN]; CELLS_PER_COLUMN];

/// Winning shapes a card can be checked against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    /// Any complete row.
    Line,
    /// Any complete column.
    Column,
    /// Either diagonal.
    Diagonal,
    FourCorners,
    /// Every cell marked.
    FullCard,
}

impl Pattern {
    pub const ALL: [Pattern; 5] = [
        Pattern::Line,
        Pattern::Column,
        Pattern::Diagonal,
        Pattern::FourCorners,
        Pattern::FullCard,
    ];

    pub fn is_complete<F>(self, card: &CardRecord, drawn: F) -> bool
    where
        F: Fn(u8) -> bool,
    {
        let marks = card.marks(drawn);
        let last = CELLS_PER_COLUMN - 1;
        match self {
            Pattern::Line => marks.iter().any(|row| row.iter().all(|m| *m)),
            Pattern::Column => (0..CELLS_PER_COLUMN).any(|c| marks.iter().all(|row| row[c])),
            Pattern::Diagonal => {
                (0..CELLS_PER_COLUMN).all(|i| marks[i][i])
                    || (0..CELLS_PER_COLUMN).all(|i| marks[i][last - i])
            }
            Pattern::FourCorners => {
                marks[0][0] && marks[0][last] && marks[last][0] && marks[last][last]
            }
            Pattern::FullCard => marks.iter().flatten().all(|m| *m),
        }
    }
}

impl CardRecord {
    /// Marked cells given a drawn-number predicate; the free cell is always marked.
    pub fn marks<F>(&self, drawn: F) -> Marks
    where
        F: Fn(u8) -> bool,
    {
        let mut marks = [[false; CELLS_PER_COLUMN]; CELLS_PER_COLUMN];
        for (c, column) in self.columns.iter().enumerate() {
            for (r, cell) in column.cells.iter().enumerate() {
                marks[r][c] = match cell {
                    Cell::Free => true,
                    Cell::Number(n) => drawn(*n),
                };
            }
        }
        marks
    }
}
