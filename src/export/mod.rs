//! Batched PDF export of generated cards.

pub mod config;
pub mod error;
pub mod pdf;
pub mod pipeline;
pub mod progress;

pub use config::{A4_HEIGHT_MM, A4_WIDTH_MM, ExportConfig};
pub use error::{DocumentError, Exhaustion, ExportError, RasterError, RenderError};
pub use pdf::PdfDocumentSink;
pub use pipeline::{
    ArtifactHandle, CancelToken, DocumentSink, EncodedImage, ExportCursor, ExportPipeline,
    ExportReport, Placement, RasterOptions, Rasterizer, RenderAdapter, export_file_name,
};
pub use progress::{Progress, ProgressReporter, ProgressStage, TracingProgress};
