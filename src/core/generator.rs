use chrono::Utc;
use rand::Rng;
use thiserror::Error;
use tracing::debug;

use crate::core::card::{
    BingoColumn, CELLS_PER_COLUMN, Cell, CardRecord, ColumnLabel, FREE_ROW,
};

/// Upper bound on draws per column before giving up. A column needs five distinct values out
/// of fifteen, so hitting this means the RNG is broken rather than unlucky.
pub const MAX_DRAW_ATTEMPTS: usize = 1_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("could not draw five distinct numbers for column {column} in {attempts} attempts")]
    DrawExhausted { column: ColumnLabel, attempts: usize },
}

/// Generate `count` cards labelled `label` using the thread-local RNG.
pub fn generate(count: usize, label: &str) -> Result<Vec<CardRecord>, GenerateError> {
    generate_with(&mut rand::rng(), count, label)
}

/// Generate `count` cards with serials `1..=count` from the supplied RNG.
pub fn generate_with<R: Rng>(
    rng: &mut R,
    count: usize,
    label: &str,
) -> Result<Vec<CardRecord>, GenerateError> {
    if count == 0 {
        return Err(GenerateError::InvalidInput(
            "card count must be greater than zero".to_string(),
        ));
    }
    if label.trim().is_empty() {
        return Err(GenerateError::InvalidInput(
            "card label cannot be empty".to_string(),
        ));
    }
    let serial_limit = u32::try_from(count)
        .map_err(|_| GenerateError::InvalidInput(format!("card count {} is too large", count)))?;

    let created_at = Utc::now();
    let mut cards = Vec::with_capacity(count);
    for serial in 1..=serial_limit {
        let mut columns = ColumnLabel::ALL.map(|label| BingoColumn {
            label,
            cells: [Cell::Free; CELLS_PER_COLUMN],
        });
        for column in columns.iter_mut() {
            column.cells = draw_column(rng, column.label)?;
        }
        columns[ColumnLabel::FREE.index()].cells[FREE_ROW] = Cell::Free;
        cards.push(CardRecord {
            label: label.to_string(),
            serial,
            created_at,
            columns,
        });
    }
    debug!(count, label, "generated bingo cards");
    Ok(cards)
}

/// Rejection-sample five distinct numbers from the column's range.
fn draw_column<R: Rng>(
    rng: &mut R,
    column: ColumnLabel,
) -> Result<[Cell; CELLS_PER_COLUMN], GenerateError> {
    let range = column.range();
    let mut picked: Vec<u8> = Vec::with_capacity(CELLS_PER_COLUMN);
    let mut attempts = 0;
    while picked.len() < CELLS_PER_COLUMN {
        if attempts == MAX_DRAW_ATTEMPTS {
            return Err(GenerateError::DrawExhausted { column, attempts });
        }
        attempts += 1;
        let n = rng.random_range(range.clone());
        if !picked.contains(&n) {
            picked.push(n);
        }
    }
    let mut cells = [Cell::Free; CELLS_PER_COLUMN];
    for (cell, n) in cells.iter_mut().zip(picked) {
        *cell = Cell::Number(n);
    }
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::card::CardError;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn generates_dense_serials_in_order() {
        let mut rng = StdRng::seed_from_u64(7);
        let cards = generate_with(&mut rng, 25, "Friday Night").expect("generate");
        let serials: Vec<u32> = cards.iter().map(|c| c.serial).collect();
        assert_eq!(serials, (1..=25).collect::<Vec<u32>>());
        assert!(cards.iter().all(|c| c.label == "Friday Night"));
    }

    #[test]
    fn every_card_satisfies_column_invariants() {
        let mut rng = StdRng::seed_from_u64(99);
        for card in generate_with(&mut rng, 200, "Bingo").expect("generate") {
            assert_eq!(card.validate(), Ok::<(), CardError>(()));
            assert!(card.cell(ColumnLabel::N, FREE_ROW).is_free());
            let free_cells = card
                .columns
                .iter()
                .flat_map(|c| c.cells.iter())
                .filter(|c| c.is_free())
                .count();
            assert_eq!(free_cells, 1);
        }
    }

    #[test]
    fn rejects_zero_count_and_blank_label() {
        assert!(matches!(
            generate(0, "Bingo"),
            Err(GenerateError::InvalidInput(_))
        ));
        assert!(matches!(
            generate(3, "   "),
            Err(GenerateError::InvalidInput(_))
        ));
    }

    #[test]
    fn separate_calls_differ() {
        let first = generate(5, "Bingo").expect("generate");
        let second = generate(5, "Bingo").expect("generate");
        let numbers = |cards: &[CardRecord]| -> Vec<u8> {
            cards
                .iter()
                .flat_map(|c| c.columns.iter().flat_map(|col| col.numbers()).collect::<Vec<_>>())
                .collect()
        };
        assert_ne!(numbers(&first), numbers(&second));
    }

    struct StuckRng;

    impl rand::RngCore for StuckRng {
        fn next_u32(&mut self) -> u32 {
            0
        }
        fn next_u64(&mut self) -> u64 {
            0
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }
    }

    #[test]
    fn stuck_rng_fails_fast_instead_of_spinning() {
        let err = generate_with(&mut StuckRng, 1, "Bingo").unwrap_err();
        assert_eq!(
            err,
            GenerateError::DrawExhausted {
                column: ColumnLabel::B,
                attempts: MAX_DRAW_ATTEMPTS
            }
        );
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let a = generate_with(&mut StdRng::seed_from_u64(3), 4, "Bingo").expect("generate");
        let b = generate_with(&mut StdRng::seed_from_u64(3), 4, "Bingo").expect("generate");
        let strip = |cards: Vec<CardRecord>| -> Vec<_> { cards.into_iter().map(|c| c.columns).collect() };
        assert_eq!(strip(a), strip(b));
    }
}
