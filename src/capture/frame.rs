//! Frame data structures for decoded video stills

use image::{DynamicImage, RgbaImage};
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

/// A decoded frame, owned exclusively by one pipeline run
#[derive(Debug, Clone)]
pub struct Frame {
    /// Identifier used in diagnostics (usually the file path)
    id: String,
    /// File the frame was decoded from, if any
    path: Option<PathBuf>,
    /// Decoded pixel grid
    image: RgbaImage,
}

impl Frame {
    /// Wrap an in-memory image
    pub fn new(id: impl Into<String>, image: DynamicImage) -> Self {
        Self {
            id: id.into(),
            path: None,
            image: image.into_rgba8(),
        }
    }

    /// Decode a frame from an image file
    pub fn open(path: &Path) -> Result<Self> {
        let id = path.display().to_string();
        let image = image::open(path).map_err(|source| PipelineError::FrameLoad {
            image: id.clone(),
            source,
        })?;

        Ok(Self {
            id,
            path: Some(path.to_path_buf()),
            image: image.into_rgba8(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Get frame dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}
