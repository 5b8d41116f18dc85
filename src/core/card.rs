use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use thiserror::Error;

/// Numbers per non-free column and rows per card.
pub const CELLS_PER_COLUMN: usize = 5;
/// Width of every column's number range.
pub const COLUMN_SPAN: u8 = 15;
/// Highest number on the drum.
pub const MAX_NUMBER: u8 = 75;
/// Row index (within `BingoColumn::cells`) of the free cell.
pub const FREE_ROW: usize = 2;
/// Position of the free cell in the header-first view returned by [`BingoColumn::entries`].
pub const FREE_ENTRY: usize = FREE_ROW + 1;

/// One of the five fixed card columns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnLabel {
    B,
    I,
    N,
    G,
    O,
}

impl ColumnLabel {
    pub const ALL: [ColumnLabel; 5] = [
        ColumnLabel::B,
        ColumnLabel::I,
        ColumnLabel::N,
        ColumnLabel::G,
        ColumnLabel::O,
    ];

    /// The column that carries the free cell.
    pub const FREE: ColumnLabel = ColumnLabel::N;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn letter(self) -> char {
        match self {
            ColumnLabel::B => 'B',
            ColumnLabel::I => 'I',
            ColumnLabel::N => 'N',
            ColumnLabel::G => 'G',
            ColumnLabel::O => 'O',
        }
    }

    /// Inclusive number range drawn for this column (B = 1..=15, ..., O = 61..=75).
    pub fn range(self) -> RangeInclusive<u8> {
        let low = self.index() as u8 * COLUMN_SPAN + 1;
        low..=low + COLUMN_SPAN - 1
    }

    /// Column a drawn number belongs to on the numbers table.
    pub fn for_number(number: u8) -> Option<ColumnLabel> {
        if number == 0 || number > MAX_NUMBER {
            return None;
        }
        Some(Self::ALL[((number - 1) / COLUMN_SPAN) as usize])
    }
}

impl fmt::Display for ColumnLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = [0u8; 4];
        f.pad(self.letter().encode_utf8(&mut buf))
    }
}

/// A single card cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    Number(u8),
    Free,
}

impl Cell {
    pub fn number(self) -> Option<u8> {
        match self {
            Cell::Number(n) => Some(n),
            Cell::Free => None,
        }
    }

    pub fn is_free(self) -> bool {
        matches!(self, Cell::Free)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(n) => f.pad(&n.to_string()),
            Cell::Free => f.pad("FREE"),
        }
    }
}

/// Entry of the header-first column view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnEntry {
    Header(ColumnLabel),
    Cell(Cell),
}

/// One labelled column of five cells, top to bottom.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BingoColumn {
    pub label: ColumnLabel,
    pub cells: [Cell; CELLS_PER_COLUMN],
}

impl BingoColumn {
    /// Six entries: the column header followed by its five cells.
    pub fn entries(&self) -> [ColumnEntry; CELLS_PER_COLUMN + 1] {
        let mut out = [ColumnEntry::Header(self.label); CELLS_PER_COLUMN + 1];
        for (slot, cell) in out[1..].iter_mut().zip(self.cells.iter()) {
            *slot = ColumnEntry::Cell(*cell);
        }
        out
    }

    pub fn numbers(&self) -> impl Iterator<Item = u8> + '_ {
        self.cells.iter().filter_map(|cell| cell.number())
    }
}

/// Invariant violations reported by [`CardRecord::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CardError {
    #[error("card serial must be 1-based")]
    ZeroSerial,
    #[error("card label is empty")]
    EmptyLabel,
    #[error("column {position} is labelled {found}, expected {expected}")]
    ColumnOrder {
        position: usize,
        expected: ColumnLabel,
        found: ColumnLabel,
    },
    #[error("number {number} is outside column {column} range")]
    OutOfRange { column: ColumnLabel, number: u8 },
    #[error("number {number} appears twice in column {column}")]
    Duplicate { column: ColumnLabel, number: u8 },
    #[error("free cell misplaced in column {column}, row {row}")]
    MisplacedFree { column: ColumnLabel, row: usize },
    #[error("free cell missing from the centre of column N")]
    MissingFree,
}

/// One generated bingo card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardRecord {
    pub label: String,
    pub serial: u32,
    pub created_at: DateTime<Utc>,
    pub columns: [BingoColumn; 5],
}

impl CardRecord {
    pub fn column(&self, label: ColumnLabel) -> &BingoColumn {
        &self.columns[label.index()]
    }

    /// Cell at `row` (0..5) of `column`.
    pub fn cell(&self, column: ColumnLabel, row: usize) -> Cell {
        self.column(column).cells[row]
    }

    pub fn contains(&self, number: u8) -> bool {
        self.columns
            .iter()
            .any(|col| col.numbers().any(|n| n == number))
    }

    /// Check every structural invariant of a card.
    pub fn validate(&self) -> Result<(), CardError> {
        if self.serial == 0 {
            return Err(CardError::ZeroSerial);
        }
        if self.label.trim().is_empty() {
            return Err(CardError::EmptyLabel);
        }
        for (position, (column, expected)) in
            self.columns.iter().zip(ColumnLabel::ALL).enumerate()
        {
            if column.label != expected {
                return Err(CardError::ColumnOrder {
                    position,
                    expected,
                    found: column.label,
                });
            }
            let range = expected.range();
            let mut seen: Vec<u8> = Vec::with_capacity(CELLS_PER_COLUMN);
            for (row, cell) in column.cells.iter().enumerate() {
                match cell {
                    Cell::Free => {
                        if expected != ColumnLabel::FREE || row != FREE_ROW {
                            return Err(CardError::MisplacedFree {
                                column: expected,
                                row,
                            });
                        }
                    }
                    Cell::Number(n) => {
                        if expected == ColumnLabel::FREE && row == FREE_ROW {
                            return Err(CardError::MissingFree);
                        }
                        if !range.contains(n) {
                            return Err(CardError::OutOfRange {
                                column: expected,
                                number: *n,
                            });
                        }
                        if seen.contains(n) {
                            return Err(CardError::Duplicate {
                                column: expected,
                                number: *n,
                            });
                        }
                        seen.push(*n);
                    }
                }
            }
        }
        Ok(())
    }

    /// Plain-text grid, one row per line, header first.
    pub fn render_text(&self) -> String {
        let mut out = format!("{} #{:04}\n", self.label, self.serial);
        for entry in 0..=CELLS_PER_COLUMN {
            let row: Vec<String> = self
                .columns
                .iter()
                .map(|col| match col.entries()[entry] {
                    ColumnEntry::Header(label) => format!("{:>4}", label),
                    ColumnEntry::Cell(cell) => format!("{:>4}", cell),
                })
                .collect();
            out.push_str(&row.join(" "));
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_card() -> CardRecord {
        let numbers = |base: u8| {
            [
                Cell::Number(base),
                Cell::Number(base + 3),
                Cell::Number(base + 6),
                Cell::Number(base + 9),
                Cell::Number(base + 12),
            ]
        };
        let mut columns = ColumnLabel::ALL.map(|label| BingoColumn {
            label,
            cells: numbers(*label.range().start()),
        });
        columns[ColumnLabel::N.index()].cells[FREE_ROW] = Cell::Free;
        CardRecord {
            label: "Friday Night".to_string(),
            serial: 1,
            created_at: Utc::now(),
            columns,
        }
    }

    #[test]
    fn column_ranges_tile_one_to_seventy_five() {
        assert_eq!(ColumnLabel::B.range(), 1..=15);
        assert_eq!(ColumnLabel::N.range(), 31..=45);
        assert_eq!(ColumnLabel::O.range(), 61..=75);
        for n in 1..=MAX_NUMBER {
            let label = ColumnLabel::for_number(n).expect("in range");
            assert!(label.range().contains(&n));
        }
        assert_eq!(ColumnLabel::for_number(0), None);
        assert_eq!(ColumnLabel::for_number(76), None);
    }

    #[test]
    fn entries_put_header_first_and_free_at_centre() {
        let card = sample_card();
        let entries = card.column(ColumnLabel::N).entries();
        assert_eq!(entries[0], ColumnEntry::Header(ColumnLabel::N));
        assert_eq!(entries[FREE_ENTRY], ColumnEntry::Cell(Cell::Free));
        assert_eq!(card.validate(), Ok(()));
    }

    #[test]
    fn validate_reports_duplicates_and_missing_free() {
        let mut card = sample_card();
        card.columns[0].cells[1] = Cell::Number(1);
        assert_eq!(
            card.validate(),
            Err(CardError::Duplicate {
                column: ColumnLabel::B,
                number: 1
            })
        );

        let mut card = sample_card();
        card.columns[ColumnLabel::N.index()].cells[FREE_ROW] = Cell::Number(40);
        assert_eq!(card.validate(), Err(CardError::MissingFree));

        let mut card = sample_card();
        card.columns[ColumnLabel::G.index()].cells[4] = Cell::Number(3);
        assert_eq!(
            card.validate(),
            Err(CardError::OutOfRange {
                column: ColumnLabel::G,
                number: 3
            })
        );
    }

    #[test]
    fn card_round_trips_through_json() {
        let card = sample_card();
        let json = serde_json::to_string(&card).expect("serialize");
        let back: CardRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, card);
    }

    #[test]
    fn render_text_lists_header_and_free() {
        let text = sample_card().render_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Friday Night #0001");
        assert_eq!(lines[1], "   B    I    N    G    O");
        assert!(lines[4].contains("FREE"));
    }
}
