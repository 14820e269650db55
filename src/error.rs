//! Error types for the attribution pipeline

use thiserror::Error;

/// Problems found while reading an OCR layout document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("invalid XML at byte {position}: {msg}")]
    Xml { position: u64, msg: String },

    #[error("document has no Layout element")]
    MissingLayout,

    #[error("TextBlock {block} is missing the {attribute} attribute")]
    MissingAttribute { block: String, attribute: &'static str },

    #[error("TextBlock {block} has non-numeric {attribute}: {value:?}")]
    InvalidAttribute {
        block: String,
        attribute: &'static str,
        value: String,
    },
}

/// Errors surfaced by the pipeline.
///
/// Per-block outcomes (degenerate regions, unmatched or disagreeing markers)
/// are not errors; they are counted in
/// [`AttributionStats`](crate::vision::AttributionStats).
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("malformed layout for {image}: {source}")]
    MalformedLayout {
        image: String,
        #[source]
        source: LayoutError,
    },

    #[error("invalid character palette: {0}")]
    InvalidPalette(String),

    #[error("invalid pipeline settings: {0}")]
    InvalidSettings(String),

    #[error("failed to load frame {image}: {source}")]
    FrameLoad {
        image: String,
        #[source]
        source: image::ImageError,
    },

    #[error("OCR failed for {image}: {reason}")]
    Ocr { image: String, reason: String },
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
