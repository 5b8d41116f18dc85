use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::card::CardRecord;
use crate::core::generator::{GenerateError, generate_with};
use crate::core::pattern::Pattern;
use crate::core::tombola::Tombola;

/// Every card produced by one generation request.
///
/// A batch is never edited in place; a new request builds a new batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationBatch {
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub cards: Vec<CardRecord>,
}

impl GenerationBatch {
    pub fn generate<R: Rng>(
        rng: &mut R,
        count: usize,
        label: &str,
    ) -> Result<Self, GenerateError> {
        let cards = generate_with(rng, count, label)?;
        let created_at = cards.first().map(|c| c.created_at).unwrap_or_else(Utc::now);
        Ok(Self {
            label: label.to_string(),
            created_at,
            cards,
        })
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Load a batch previously written with [`GenerationBatch::save`], re-checking every card.
    pub fn load(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let batch: GenerationBatch = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse card batch {}", path.display()))?;
        for (idx, card) in batch.cards.iter().enumerate() {
            card.validate()
                .with_context(|| format!("card {} in {} is malformed", idx + 1, path.display()))?;
            if card.serial as usize != idx + 1 {
                return Err(anyhow!(
                    "card {} in {} has serial {}; serials must run 1..{}",
                    idx + 1,
                    path.display(),
                    card.serial,
                    batch.cards.len()
                ));
            }
        }
        Ok(batch)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .with_context(|| format!("failed to write {}", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("failed to flush {}", path.display()))
    }
}

/// State for one game: the current card batch plus the draw drum.
#[derive(Debug, Default)]
pub struct BingoSession {
    batch: Option<GenerationBatch>,
    tombola: Tombola,
}

impl BingoSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current batch with a freshly generated one.
    pub fn generate<R: Rng>(
        &mut self,
        rng: &mut R,
        count: usize,
        label: &str,
    ) -> Result<&GenerationBatch, GenerateError> {
        let batch = GenerationBatch::generate(rng, count, label)?;
        info!(count, label, "new card batch");
        Ok(self.batch.insert(batch))
    }

    pub fn replace_batch(&mut self, batch: GenerationBatch) {
        self.batch = Some(batch);
    }

    pub fn batch(&self) -> Option<&GenerationBatch> {
        self.batch.as_ref()
    }

    pub fn tombola(&self) -> &Tombola {
        &self.tombola
    }

    pub fn tombola_mut(&mut self) -> &mut Tombola {
        &mut self.tombola
    }

    /// Serials of every card in the batch that completes `pattern` with the numbers drawn so far.
    pub fn winners(&self, pattern: Pattern) -> Vec<u32> {
        let Some(batch) = &self.batch else {
            return Vec::new();
        };
        batch
            .cards
            .iter()
            .filter(|card| pattern.is_complete(card, |n| self.tombola.is_drawn(n)))
            .map(|card| card.serial)
            .collect()
    }

    /// Drop the batch and clear the drum.
    pub fn reset(&mut self) {
        self.batch = None;
        self.tombola.reset();
    }
}
