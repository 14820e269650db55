//! Frame Input Layer
//!
//! Frames are stills that were already sampled from video by an external
//! tool (one image file per frame). This module only resolves which files to
//! read; decoding happens in [`frame::Frame::open`].

pub mod frame;

pub use frame::Frame;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// File extensions treated as frame images
const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp", "tif", "tiff"];

/// Expand the given inputs into a list of frame files.
///
/// Files are kept as given. Directories contribute their image files
/// (non-recursive, hidden files skipped) sorted by name, which matches the
/// `0001.jpg`, `0002.jpg`, ... numbering of extracted frames.
pub fn expand_frame_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut frames = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(input)
                .with_context(|| format!("Failed to read frame directory: {:?}", input))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && is_frame_file(path))
                .collect();
            entries.sort();
            frames.extend(entries);
        } else {
            frames.push(input.clone());
        }
    }

    Ok(frames)
}

fn is_frame_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(true);

    let image_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false);

    !hidden && image_extension
}
