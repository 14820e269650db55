//! Speech bubble location
//!
//! A bubble is the text block's rectangle grown by the marker padding. The
//! far edges (right, bottom) are grown by 1.5x the padding while the near
//! edges use 1x. Marker positions depend on this geometry; keep it asymmetric.
//!
//! Far edges are computed as one fractional coordinate and rounded half to
//! even.

use image::{imageops, RgbaImage};
use imageproc::rect::Rect;

use crate::layout::TextBlock;

/// Multiplier applied to the padding on the right and bottom edges
pub const FAR_EDGE_PADDING_FACTOR: f64 = 1.5;

/// Unclamped bubble rectangle in source-image pixels.
/// `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BubbleRegion {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl BubbleRegion {
    /// Derive the bubble rectangle around a text block
    pub fn around(block: &TextBlock, padding: u32) -> Self {
        let near = i64::from(padding);

        Self {
            left: i64::from(block.horizontal_position) - near,
            top: i64::from(block.vertical_position) - near,
            right: far_edge(block.horizontal_position, block.width, padding),
            bottom: far_edge(block.vertical_position, block.height, padding),
        }
    }

    /// Clamp the rectangle to an image of the given size.
    /// Returns `None` when nothing with positive area remains.
    pub fn clamp(&self, width: u32, height: u32) -> Option<Rect> {
        let left = self.left.clamp(0, i64::from(width));
        let top = self.top.clamp(0, i64::from(height));
        let right = self.right.clamp(0, i64::from(width));
        let bottom = self.bottom.clamp(0, i64::from(height));

        if right <= left || bottom <= top {
            return None;
        }

        let x = i32::try_from(left).ok()?;
        let y = i32::try_from(top).ok()?;
        Some(Rect::at(x, y).of_size((right - left) as u32, (bottom - top) as u32))
    }
}

/// Exclusive far edge of a bubble along one axis: `position + extent + 1.5 * padding`,
/// rounded half to even
pub fn far_edge(position: u32, extent: u32, padding: u32) -> i64 {
    let edge = f64::from(position)
        + f64::from(extent)
        + f64::from(padding) * FAR_EDGE_PADDING_FACTOR;
    edge.round_ties_even() as i64
}

/// A bubble cropped out of its frame
#[derive(Debug, Clone)]
pub struct LocatedBubble {
    /// Rectangle actually cropped
    pub bounds: Rect,
    /// Cropped pixels
    pub image: RgbaImage,
}

/// Locate and crop the bubble of a text block; `None` for degenerate regions
pub fn locate(frame: &RgbaImage, block: &TextBlock, padding: u32) -> Option<LocatedBubble> {
    let (width, height) = frame.dimensions();
    let bounds = BubbleRegion::around(block, padding).clamp(width, height)?;

    let image = imageops::crop_imm(
        frame,
        bounds.left() as u32,
        bounds.top() as u32,
        bounds.width(),
        bounds.height(),
    )
    .to_image();

    Some(LocatedBubble { bounds, image })
}
