//! bubble-attribution - Speech bubble character attribution for video frames
//!
//! Reads the OCR layout of a frame, finds the speech bubble around every
//! text block and attributes it to a character by the color of the two
//! marker squares on the bubble's left edge.

pub mod app;
pub mod capture;
pub mod config;
pub mod error;
pub mod layout;
pub mod storage;
pub mod vision;

#[cfg(test)]
mod test_support;

pub use error::{LayoutError, PipelineError, Result};
