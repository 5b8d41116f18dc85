//! Bingo card generation, draw tracking and batched PDF export.

pub mod core;
pub mod export;
pub mod image;

pub use crate::core::{
    BingoColumn, BingoSession, CardError, CardRecord, Cell, ColumnLabel, GenerateError,
    GenerationBatch, Pattern, Tombola, generate, generate_with,
};
pub use crate::export::{
    CancelToken, ExportConfig, ExportError, ExportPipeline, ExportReport, PdfDocumentSink,
    Progress, ProgressReporter, ProgressStage, TracingProgress,
};
pub use crate::image::{CardPainter, CardStyle, JpegRasterizer};

use std::path::Path;

/// Export `cards` as a printable PDF in `output_dir` using the built-in painter and JPEG
/// rasterizer.
pub fn export_cards_to_pdf(
    cards: &[CardRecord],
    config: &ExportConfig,
    style: CardStyle,
    output_dir: &Path,
    progress: &mut dyn ProgressReporter,
    cancel: CancelToken,
) -> Result<ExportReport, ExportError> {
    let title = cards
        .first()
        .map(|card| format!("{} bingo cards", card.label))
        .unwrap_or_else(|| "bingo cards".to_string());
    let mut painter = CardPainter::new(style);
    let mut rasterizer = JpegRasterizer::new();
    let mut document = PdfDocumentSink::new(&title, config, output_dir);
    ExportPipeline::new(config, &mut painter, &mut rasterizer, &mut document)
        .with_cancel(cancel)
        .run(cards, progress)
}
