//! OCR layout sources
//!
//! The OCR engine itself is external. A [`LayoutProvider`] hands the
//! pipeline the ALTO document for a frame, either by running Tesseract or
//! by reading a layout file produced earlier.

use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use crate::capture::Frame;
use crate::config::OcrSettings;
use crate::error::{PipelineError, Result};

/// Source of ALTO layout documents
pub trait LayoutProvider: Send + Sync {
    /// Return the raw ALTO XML for a frame
    fn layout_for(&self, frame: &Frame) -> Result<Vec<u8>>;
}

/// Runs the `tesseract` executable with ALTO output
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: PathBuf,
    language: String,
}

impl TesseractOcr {
    pub fn new(binary: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }

    pub fn from_settings(settings: &OcrSettings) -> Self {
        Self::new(settings.tesseract_path.clone(), settings.language.clone())
    }
}

impl LayoutProvider for TesseractOcr {
    fn layout_for(&self, frame: &Frame) -> Result<Vec<u8>> {
        let path = frame.path().ok_or_else(|| PipelineError::Ocr {
            image: frame.id().to_string(),
            reason: "frame has no backing file".to_string(),
        })?;

        debug!("Running {:?} on {:?} ({})", self.binary, path, self.language);
        let output = Command::new(&self.binary)
            .arg(path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("alto")
            .output()
            .map_err(|e| PipelineError::Ocr {
                image: frame.id().to_string(),
                reason: format!("failed to run {:?} (is it installed?): {}", self.binary, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::Ocr {
                image: frame.id().to_string(),
                reason: format!("tesseract exited with {}: {}", output.status, stderr.trim()),
            });
        }

        Ok(output.stdout)
    }
}

/// Reads `<frame stem>.xml` layout files written by an earlier OCR pass
#[derive(Debug, Clone, Default)]
pub struct SidecarLayout {
    /// Directory holding the layout files; next to each frame when `None`
    directory: Option<PathBuf>,
}

impl SidecarLayout {
    /// Look for layouts next to their frames
    pub fn beside_frames() -> Self {
        Self { directory: None }
    }

    /// Look for layouts in a separate directory
    pub fn in_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: Some(directory.into()),
        }
    }

    fn layout_path(&self, frame_path: &Path) -> Option<PathBuf> {
        match &self.directory {
            Some(directory) => {
                let file_name = frame_path.with_extension("xml");
                Some(directory.join(file_name.file_name()?))
            }
            None => Some(frame_path.with_extension("xml")),
        }
    }
}

impl LayoutProvider for SidecarLayout {
    fn layout_for(&self, frame: &Frame) -> Result<Vec<u8>> {
        let path = frame
            .path()
            .and_then(|p| self.layout_path(p))
            .ok_or_else(|| PipelineError::Ocr {
                image: frame.id().to_string(),
                reason: "cannot derive a layout file name for this frame".to_string(),
            })?;

        std::fs::read(&path).map_err(|e| PipelineError::Ocr {
            image: frame.id().to_string(),
            reason: format!("failed to read layout {:?}: {}", path, e),
        })
    }
}
