//! Batched card export.
//!
//! Cards are rendered, rasterised and placed one at a time, a fixed number per batch, with a
//! cooperative pause between batches so the per-card buffers can be reclaimed before the next
//! batch starts. Only the rendered face and its encoded image are transient; the card records
//! themselves are borrowed for the whole run.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::core::CardRecord;
use crate::export::config::ExportConfig;
use crate::export::error::{DocumentError, Exhaustion, ExportError, RasterError, RenderError};
use crate::export::progress::{MonotonicProgress, ProgressReporter, ProgressStage};

/// Share of the progress bar covered by batch processing, starting at [`BATCH_PROGRESS_START`].
const BATCH_PROGRESS_START: f32 = 10.0;
const BATCH_PROGRESS_SPAN: f32 = 70.0;
const PREPARING_PROGRESS: f32 = 5.0;
const FINALIZING_PROGRESS: f32 = 90.0;

/// Compressed image produced by a [`Rasterizer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub width: u32,
    pub height: u32,
    /// JPEG bytes.
    pub data: Vec<u8>,
}

/// Options handed to the rasterizer for every card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    pub scale: f32,
    pub quality: f32,
    pub background: [u8; 3],
    pub max_pixels: u64,
}

impl From<&ExportConfig> for RasterOptions {
    fn from(config: &ExportConfig) -> Self {
        Self {
            scale: config.raster_scale,
            quality: config.image_quality,
            background: config.background,
            max_pixels: config.max_raster_pixels,
        }
    }
}

/// Where a card image lands, in page units measured from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// 1-based page number.
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Handle to a saved export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactHandle {
    pub name: String,
    pub path: Option<PathBuf>,
    pub pages: usize,
    pub bytes: u64,
}

/// Produces a rasterisable visual for one card.
pub trait RenderAdapter {
    type Artifact;

    /// Prepare any per-export staging area. Called once before the first card.
    fn open_staging(&mut self) -> Result<(), RenderError> {
        Ok(())
    }

    fn render(&mut self, card: &CardRecord) -> Result<Self::Artifact, RenderError>;

    /// Tear down the staging area. Called exactly once per successful `open_staging`,
    /// whatever the outcome of the export.
    fn close_staging(&mut self) {}
}

/// Captures a render artifact as a compressed image.
pub trait Rasterizer<A> {
    fn rasterize(
        &mut self,
        artifact: &A,
        options: &RasterOptions,
    ) -> Result<EncodedImage, RasterError>;
}

/// Paginated document being assembled. A fresh document already holds page 1.
pub trait DocumentSink {
    fn add_page(&mut self) -> Result<(), DocumentError>;
    fn add_image(
        &mut self,
        image: &EncodedImage,
        placement: &Placement,
    ) -> Result<(), DocumentError>;
    fn save(&mut self, name: &str) -> Result<ArtifactHandle, DocumentError>;
}

/// Cooperative cancellation flag, checked at batch boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Layout and bookkeeping state of one export run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportCursor {
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub batch: usize,
    pub processed: usize,
}

impl ExportCursor {
    pub fn start(config: &ExportConfig) -> Self {
        Self {
            page: 1,
            x: config.margin,
            y: config.margin,
            batch: 0,
            processed: 0,
        }
    }

    /// Whether the next card would run past the bottom of the current page.
    pub fn overflows(&self, config: &ExportConfig) -> bool {
        self.y + config.card_height > config.page_height
    }

    pub fn new_page(&mut self, config: &ExportConfig) {
        self.page += 1;
        self.x = config.margin;
        self.y = config.margin;
    }

    pub fn placement(&self, config: &ExportConfig) -> Placement {
        Placement {
            page: self.page,
            x: self.x,
            y: self.y,
            width: config.card_width,
            height: config.card_height,
        }
    }

    /// Step to the next slot, wrapping to a new row when the row is full.
    pub fn advance(&mut self, config: &ExportConfig) {
        self.x += config.horizontal_advance;
        if self.x + config.card_width > config.page_width {
            self.x = config.margin;
            self.y += config.vertical_advance;
        }
    }
}

/// Outcome of a successful export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub artifact: ArtifactHandle,
    pub total: usize,
    pub placed: usize,
    pub failed: usize,
    pub pages: usize,
    pub batches: usize,
}

/// File name for an export of `count` cards labelled `label`.
pub fn export_file_name(label: &str, count: usize) -> String {
    let label: String = label
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            other => other,
        })
        .collect();
    format!("{}_bingo_cards_{}tarjetas.pdf", label, count)
}

/// Drives render → rasterise → place over a card set.
///
/// The pipeline borrows its collaborators mutably, so a second export cannot start on the
/// same renderer or document while one is running.
pub struct ExportPipeline<'a, R, Z, D>
where
    R: RenderAdapter,
    Z: Rasterizer<R::Artifact>,
    D: DocumentSink,
{
    config: &'a ExportConfig,
    renderer: &'a mut R,
    rasterizer: &'a mut Z,
    document: &'a mut D,
    cancel: CancelToken,
}

impl<'a, R, Z, D> ExportPipeline<'a, R, Z, D>
where
    R: RenderAdapter,
    Z: Rasterizer<R::Artifact>,
    D: DocumentSink,
{
    pub fn new(
        config: &'a ExportConfig,
        renderer: &'a mut R,
        rasterizer: &'a mut Z,
        document: &'a mut D,
    ) -> Self {
        Self {
            config,
            renderer,
            rasterizer,
            document,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Export `cards` into the document and save it.
    pub fn run(
        &mut self,
        cards: &[CardRecord],
        progress: &mut dyn ProgressReporter,
    ) -> Result<ExportReport, ExportError> {
        if cards.is_empty() {
            return Err(ExportError::EmptyInput);
        }
        self.config.validate()?;

        let mut progress = MonotonicProgress::new(progress);
        let result = self.run_batches(cards, &mut progress);
        match &result {
            Ok(report) => {
                progress.emit(
                    100.0,
                    ProgressStage::Done,
                    format!(
                        "Saved {} ({} cards, {} pages)",
                        report.artifact.name, report.placed, report.pages
                    ),
                );
                info!(
                    file = %report.artifact.name,
                    placed = report.placed,
                    failed = report.failed,
                    pages = report.pages,
                    "export finished"
                );
            }
            Err(err) => {
                let last = f32::from(progress.last());
                progress.emit(last, ProgressStage::Failed, err.to_string());
                warn!(error = %err, "export failed");
            }
        }
        result
    }

    fn run_batches(
        &mut self,
        cards: &[CardRecord],
        progress: &mut MonotonicProgress<'_>,
    ) -> Result<ExportReport, ExportError> {
        let config = self.config;
        let total = cards.len();
        let batch_count = total.div_ceil(config.batch_size);
        let options = RasterOptions::from(config);

        progress.emit(
            PREPARING_PROGRESS,
            ProgressStage::Preparing,
            format!("Preparing {} cards", total),
        );
        info!(total, batches = batch_count, "export started");

        let mut staging = Staging::open(&mut *self.renderer)
            .map_err(|err| ExportError::classify(err.to_string(), err.is_exhaustion()))?;
        let mut cursor = ExportCursor::start(config);
        let mut placed = 0usize;
        let mut failures = FailureTally::default();

        for (index, batch) in cards.chunks(config.batch_size).enumerate() {
            if self.cancel.is_cancelled() {
                return Err(ExportError::Cancelled {
                    processed: cursor.processed,
                    total,
                });
            }
            cursor.batch = index;
            let done = cursor.processed as f32 / total as f32;
            progress.emit(
                BATCH_PROGRESS_START + BATCH_PROGRESS_SPAN * done,
                ProgressStage::Batch {
                    index,
                    count: batch_count,
                },
                format!(
                    "Batch {}/{} ({} of {} cards done)",
                    index + 1,
                    batch_count,
                    cursor.processed,
                    total
                ),
            );

            for card in batch {
                match place_card(
                    card,
                    config,
                    &options,
                    staging.renderer(),
                    &mut *self.rasterizer,
                    &mut *self.document,
                    &mut cursor,
                )? {
                    Ok(()) => placed += 1,
                    Err(failure) => {
                        warn!(serial = card.serial, reason = %failure.reason, "skipping card");
                        failures.record(failure);
                        if failures.count as f32 > config.max_failure_ratio * total as f32 {
                            return Err(failures.into_error(total));
                        }
                    }
                }
                cursor.processed += 1;
            }
            debug!(
                batch = index + 1,
                of = batch_count,
                placed,
                failed = failures.count,
                "batch complete"
            );

            if index + 1 < batch_count {
                pause(config.inter_batch_delay_ms);
            }
        }

        if placed == 0 {
            return Err(failures.into_error(total));
        }
        if self.cancel.is_cancelled() {
            return Err(ExportError::Cancelled {
                processed: cursor.processed,
                total,
            });
        }

        progress.emit(
            FINALIZING_PROGRESS,
            ProgressStage::Finalizing,
            format!("Writing {} cards on {} pages", placed, cursor.page),
        );
        pause(config.finalize_delay_ms);
        drop(staging);

        let name = export_file_name(&cards[0].label, total);
        let artifact = self.document.save(&name)?;
        Ok(ExportReport {
            artifact,
            total,
            placed,
            failed: failures.count,
            pages: cursor.page,
            batches: batch_count,
        })
    }
}

/// A card that could not be rendered or placed.
struct CardFailure {
    reason: String,
    exhausted: bool,
}

impl CardFailure {
    fn from_error<E: Exhaustion + std::fmt::Display>(err: E) -> Self {
        Self {
            reason: err.to_string(),
            exhausted: err.is_exhaustion(),
        }
    }
}

#[derive(Default)]
struct FailureTally {
    count: usize,
    exhausted: bool,
    last_reason: Option<String>,
}

impl FailureTally {
    fn record(&mut self, failure: CardFailure) {
        self.count += 1;
        self.exhausted |= failure.exhausted;
        self.last_reason = Some(failure.reason);
    }

    fn into_error(self, total: usize) -> ExportError {
        let reason = match self.last_reason {
            Some(last) => format!("{} of {} cards failed, last: {}", self.count, total, last),
            None => format!("none of {} cards could be placed", total),
        };
        ExportError::classify(reason, self.exhausted)
    }
}

/// Render, rasterise and place one card.
///
/// The outer `Result` carries pipeline-level failures (a page could not be added); the inner
/// one carries failures confined to this card.
fn place_card<R, Z, D>(
    card: &CardRecord,
    config: &ExportConfig,
    options: &RasterOptions,
    renderer: &mut R,
    rasterizer: &mut Z,
    document: &mut D,
    cursor: &mut ExportCursor,
) -> Result<Result<(), CardFailure>, ExportError>
where
    R: RenderAdapter,
    Z: Rasterizer<R::Artifact>,
    D: DocumentSink,
{
    let artifact = match renderer.render(card) {
        Ok(artifact) => artifact,
        Err(err) => return Ok(Err(CardFailure::from_error(err))),
    };
    let image = match rasterizer.rasterize(&artifact, options) {
        Ok(image) => image,
        Err(err) => return Ok(Err(CardFailure::from_error(err))),
    };
    drop(artifact);

    if cursor.overflows(config) {
        document.add_page()?;
        cursor.new_page(config);
        debug!(page = cursor.page, "started new page");
    }
    let placement = cursor.placement(config);
    let placed = document.add_image(&image, &placement);
    drop(image);
    if let Err(err) = placed {
        return Ok(Err(CardFailure::from_error(err)));
    }
    debug!(
        serial = card.serial,
        page = placement.page,
        x = placement.x,
        y = placement.y,
        "placed card"
    );
    cursor.advance(config);
    Ok(Ok(()))
}

/// Keeps the renderer's staging area open for the lifetime of the guard.
struct Staging<'r, R: RenderAdapter> {
    renderer: &'r mut R,
}

impl<'r, R: RenderAdapter> Staging<'r, R> {
    fn open(renderer: &'r mut R) -> Result<Self, RenderError> {
        renderer.open_staging()?;
        Ok(Self { renderer })
    }

    fn renderer(&mut self) -> &mut R {
        self.renderer
    }
}

impl<R: RenderAdapter> Drop for Staging<'_, R> {
    fn drop(&mut self) {
        self.renderer.close_staging();
    }
}

fn pause(ms: u64) {
    if ms > 0 {
        thread::sleep(Duration::from_millis(ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cursor_wraps_rows_and_detects_overflow() {
        let config = ExportConfig::default();
        let mut cursor = ExportCursor::start(&config);
        let mut slots = Vec::new();
        for _ in 0..4 {
            assert!(!cursor.overflows(&config));
            slots.push((cursor.x, cursor.y));
            cursor.advance(&config);
        }
        assert_eq!(
            slots,
            vec![(10.0, 10.0), (110.0, 10.0), (10.0, 150.0), (110.0, 150.0)]
        );
        assert_eq!(cursor.y, 290.0);
        assert!(cursor.overflows(&config));
        cursor.new_page(&config);
        assert_eq!((cursor.page, cursor.x, cursor.y), (2, 10.0, 10.0));
    }

    #[test]
    fn file_name_uses_label_and_count() {
        assert_eq!(
            export_file_name("Friday Night", 3),
            "Friday Night_bingo_cards_3tarjetas.pdf"
        );
        assert_eq!(
            export_file_name("a/b", 12),
            "a_b_bingo_cards_12tarjetas.pdf"
        );
    }

    #[test]
    fn cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
