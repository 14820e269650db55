//! Character palette and marker classification
//!
//! Each character is identified by one canonical, already posterized marker
//! color. Lookups are exact; there is no nearest-color fallback.

use image::Rgb;
use std::collections::HashMap;
use tracing::warn;

use crate::error::{PipelineError, Result};
use crate::vision::marker::posterize_color;

/// Validated mapping from marker color to character
#[derive(Debug, Clone, Default)]
pub struct CharacterPalette {
    /// Entries in configuration order
    entries: Vec<(String, Rgb<u8>)>,
    by_color: HashMap<[u8; 3], usize>,
}

impl CharacterPalette {
    /// Build a palette, rejecting empty names, repeated names and shared colors
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, [u8; 3])>,
        S: Into<String>,
    {
        let mut palette = Self::default();

        for (name, color) in entries {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(PipelineError::InvalidPalette(format!(
                    "character with color {:?} has an empty name",
                    color
                )));
            }
            if palette.entries.iter().any(|(existing, _)| *existing == name) {
                return Err(PipelineError::InvalidPalette(format!(
                    "character '{}' is listed more than once",
                    name
                )));
            }
            if let Some(&index) = palette.by_color.get(&color) {
                return Err(PipelineError::InvalidPalette(format!(
                    "characters '{}' and '{}' share color {:?}",
                    palette.entries[index].0, name, color
                )));
            }

            palette.by_color.insert(color, palette.entries.len());
            palette.entries.push((name, Rgb(color)));
        }

        Ok(palette)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Character names in configuration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Exact color lookup
    pub fn lookup(&self, color: Rgb<u8>) -> Option<&str> {
        self.by_color
            .get(&color.0)
            .map(|&index| self.entries[index].0.as_str())
    }

    /// Warn about colors that posterization can never produce
    pub fn warn_unreachable(&self, posterize_bits: u8) {
        for (name, color) in &self.entries {
            if posterize_color(*color, posterize_bits) != *color {
                warn!(
                    "Palette color {:?} for '{}' is not a {}-bit posterized color and will never match",
                    color.0, name, posterize_bits
                );
            }
        }
    }
}

/// Classification of one marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerMatch<'a> {
    Matched(&'a str),
    Unmatched,
}

/// Outcome of reconciling both markers of a bubble
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribution<'a> {
    /// Both markers name the same character
    Character(&'a str),
    /// At least one marker is not in the palette
    Unmatched,
    /// Both markers matched, but different characters
    Disagreement { top: &'a str, bottom: &'a str },
}

/// Maps sampled marker colors to characters
#[derive(Debug, Clone)]
pub struct CharacterClassifier {
    palette: CharacterPalette,
}

impl CharacterClassifier {
    pub fn new(palette: CharacterPalette) -> Self {
        Self { palette }
    }

    pub fn palette(&self) -> &CharacterPalette {
        &self.palette
    }

    /// Classify a single sampled color; a missing sample is unmatched
    pub fn classify(&self, color: Option<Rgb<u8>>) -> MarkerMatch<'_> {
        match color.and_then(|c| self.palette.lookup(c)) {
            Some(name) => MarkerMatch::Matched(name),
            None => MarkerMatch::Unmatched,
        }
    }

    /// Two-of-two consensus over the top and bottom markers
    pub fn attribute(&self, colors: [Option<Rgb<u8>>; 2]) -> Attribution<'_> {
        let [top, bottom] = colors;
        match (self.classify(top), self.classify(bottom)) {
            (MarkerMatch::Matched(top), MarkerMatch::Matched(bottom)) if top == bottom => {
                Attribution::Character(top)
            }
            (MarkerMatch::Matched(top), MarkerMatch::Matched(bottom)) => {
                Attribution::Disagreement { top, bottom }
            }
            _ => Attribution::Unmatched,
        }
    }
}
