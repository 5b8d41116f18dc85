use thiserror::Error;

/// Failure signalled by a render adapter.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render resources exhausted: {0}")]
    ResourceExhausted(String),
    #[error("render failed: {0}")]
    Other(String),
}

/// Failure signalled by a rasterizer.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("raster resources exhausted: {0}")]
    ResourceExhausted(String),
    #[error("image encoding failed: {0}")]
    Encode(String),
}

/// Failure signalled by the document assembler.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document resources exhausted: {0}")]
    ResourceExhausted(String),
    #[error("document write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("document assembly failed: {0}")]
    Assembly(String),
}

/// Error returned by an export run.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("there are no cards to export")]
    EmptyInput,
    #[error("invalid export configuration: {0}")]
    InvalidConfig(String),
    /// The rasterizer or assembler ran out of room; exporting fewer cards may succeed.
    #[error("too many cards for one document ({reason}); try exporting fewer cards")]
    TooManyCards { reason: String },
    #[error("export failed: {reason}")]
    Failed { reason: String },
    #[error("export cancelled after {processed} of {total} cards")]
    Cancelled { processed: usize, total: usize },
}

impl ExportError {
    /// Build a pipeline failure, choosing the volume hint when `exhausted` is set or the
    /// message reads like a memory or size limit.
    pub fn classify(reason: impl Into<String>, exhausted: bool) -> Self {
        let reason = reason.into();
        if exhausted || mentions_exhaustion(&reason) {
            ExportError::TooManyCards { reason }
        } else {
            ExportError::Failed { reason }
        }
    }

    pub fn is_volume_related(&self) -> bool {
        matches!(self, ExportError::TooManyCards { .. })
    }
}

/// Anything that can report whether it stems from resource exhaustion.
pub trait Exhaustion {
    fn is_exhaustion(&self) -> bool;
}

impl Exhaustion for RenderError {
    fn is_exhaustion(&self) -> bool {
        match self {
            RenderError::ResourceExhausted(_) => true,
            RenderError::Other(msg) => mentions_exhaustion(msg),
        }
    }
}

impl Exhaustion for RasterError {
    fn is_exhaustion(&self) -> bool {
        match self {
            RasterError::ResourceExhausted(_) => true,
            RasterError::Encode(msg) => mentions_exhaustion(msg),
        }
    }
}

impl Exhaustion for DocumentError {
    fn is_exhaustion(&self) -> bool {
        match self {
            DocumentError::ResourceExhausted(_) => true,
            DocumentError::Io(err) => err.kind() == std::io::ErrorKind::OutOfMemory,
            DocumentError::Assembly(msg) => mentions_exhaustion(msg),
        }
    }
}

impl From<DocumentError> for ExportError {
    fn from(err: DocumentError) -> Self {
        let exhausted = err.is_exhaustion();
        ExportError::classify(err.to_string(), exhausted)
    }
}

const EXHAUSTION_MARKERS: [&str; 5] = [
    "memory",
    "length",
    "allocation",
    "too large",
    "limit exceeded",
];

fn mentions_exhaustion(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    EXHAUSTION_MARKERS.iter().any(|m| lower.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_memory_messages_as_volume() {
        assert!(ExportError::classify("Out of memory while encoding", false).is_volume_related());
        assert!(ExportError::classify("Invalid string length", false).is_volume_related());
        assert!(!ExportError::classify("disk unplugged", false).is_volume_related());
        assert!(ExportError::classify("disk unplugged", true).is_volume_related());
    }

    #[test]
    fn typed_exhaustion_maps_to_volume_hint() {
        let err: ExportError = DocumentError::ResourceExhausted("page tree".into()).into();
        assert!(err.is_volume_related());
        let err: ExportError =
            DocumentError::Io(std::io::Error::other("permission denied")).into();
        assert!(matches!(err, ExportError::Failed { .. }));
    }
}
