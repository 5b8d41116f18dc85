use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::card::{ColumnLabel, MAX_NUMBER};

/// Draw drum holding the numbers 1..=75.
///
/// Numbers are drawn uniformly without replacement; the order of draws is kept so the
/// numbers table can be replayed or shown as a history.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tombola {
    history: Vec<u8>,
}

impl Tombola {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the next number, or `None` once all 75 are out.
    pub fn draw<R: Rng>(&mut self, rng: &mut R) -> Option<u8> {
        let remaining = self.remaining();
        if remaining.is_empty() {
            return None;
        }
        let number = remaining[rng.random_range(0..remaining.len())];
        self.history.push(number);
        Some(number)
    }

    /// Record a number called out by hand. Returns `false` if it was invalid or already drawn.
    pub fn mark(&mut self, number: u8) -> bool {
        if number == 0 || number > MAX_NUMBER || self.is_drawn(number) {
            return false;
        }
        self.history.push(number);
        true
    }

    pub fn is_drawn(&self, number: u8) -> bool {
        self.history.contains(&number)
    }

    pub fn history(&self) -> &[u8] {
        &self.history
    }

    pub fn last(&self) -> Option<u8> {
        self.history.last().copied()
    }

    pub fn remaining(&self) -> Vec<u8> {
        (1..=MAX_NUMBER).filter(|n| !self.is_drawn(*n)).collect()
    }

    pub fn is_exhausted(&self) -> bool {
        self.history.len() == usize::from(MAX_NUMBER)
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Drawn numbers grouped by column, each group sorted ascending.
    pub fn table(&self) -> [(ColumnLabel, Vec<u8>); 5] {
        ColumnLabel::ALL.map(|label| {
            let mut numbers: Vec<u8> = self
                .history
                .iter()
                .copied()
                .filter(|n| label.range().contains(n))
                .collect();
            numbers.sort_unstable();
            (label, numbers)
        })
    }
}
