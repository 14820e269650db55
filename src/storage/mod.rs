//! Storage Layer
//!
//! Locates the configuration directory and writes attribution reports.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::app::FrameReport;

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "bubble-attribution", "BubbleAttribution")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    let config_dir = proj_dirs.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}

/// Write reports as pretty-printed JSON
pub fn write_reports<W: Write>(reports: &[FrameReport], mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, reports)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Save reports to a JSON file
pub fn save_reports(reports: &[FrameReport], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create report file: {:?}", path))?;
    write_reports(reports, std::io::BufWriter::new(file))
}
