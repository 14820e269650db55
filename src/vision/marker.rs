//! Marker sampling
//!
//! Every bubble carries two colored squares on its left edge, one in each
//! corner. The sampler reads each square as a single posterized color.

use image::{imageops, DynamicImage, Rgb, RgbImage, RgbaImage};

/// Corners of a bubble that carry a marker square
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerCorner {
    TopLeft,
    BottomLeft,
}

impl MarkerCorner {
    /// All marker positions, top first
    pub const ALL: [MarkerCorner; 2] = [MarkerCorner::TopLeft, MarkerCorner::BottomLeft];

    /// Top-left corner of the patch inside a bubble of the given height
    fn origin(self, bubble_height: u32, side: u32) -> Option<(u32, u32)> {
        match self {
            MarkerCorner::TopLeft => Some((0, 0)),
            MarkerCorner::BottomLeft => bubble_height.checked_sub(side).map(|y| (0, y)),
        }
    }
}

/// Reads the marker colors of a cropped bubble
#[derive(Debug, Clone)]
pub struct MarkerSampler {
    /// Side length of a marker square (the bubble padding)
    side: u32,
    /// Significant bits kept per channel
    posterize_bits: u8,
}

impl MarkerSampler {
    pub fn new(side: u32, posterize_bits: u8) -> Self {
        Self {
            side,
            posterize_bits,
        }
    }

    /// Sample both markers; order follows [`MarkerCorner::ALL`]
    pub fn sample(&self, bubble: &RgbaImage) -> [Option<Rgb<u8>>; 2] {
        MarkerCorner::ALL.map(|corner| self.sample_corner(bubble, corner))
    }

    /// Representative color of one marker patch.
    ///
    /// The patch is flattened to RGB and posterized; the result is the single
    /// pixel at its center, not an average. `None` when the bubble is too
    /// small to contain the patch center.
    pub fn sample_corner(&self, bubble: &RgbaImage, corner: MarkerCorner) -> Option<Rgb<u8>> {
        let (x, y) = corner.origin(bubble.height(), self.side)?;

        let patch = imageops::crop_imm(bubble, x, y, self.side, self.side).to_image();
        let mut patch = DynamicImage::ImageRgba8(patch).to_rgb8();
        posterize(&mut patch, self.posterize_bits);

        let center = self.side / 2;
        if center >= patch.width() || center >= patch.height() {
            return None;
        }
        Some(*patch.get_pixel(center, center))
    }
}

/// Keep only the `bits` most significant bits of every channel
pub fn posterize(image: &mut RgbImage, bits: u8) {
    for pixel in image.pixels_mut() {
        *pixel = posterize_color(*pixel, bits);
    }
}

/// Posterize a single color; `bits` is expected in `1..=8`
pub fn posterize_color(color: Rgb<u8>, bits: u8) -> Rgb<u8> {
    let mask = channel_mask(bits);
    Rgb(color.0.map(|channel| channel & mask))
}

fn channel_mask(bits: u8) -> u8 {
    let bits = bits.clamp(1, 8);
    (0xFFu16 << (8 - bits)) as u8
}
