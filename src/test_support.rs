//! Fixtures shared by unit tests

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use crate::vision::bubble::far_edge;

/// Geometry and lines of one TextBlock in a generated ALTO document
pub struct BlockSpec<'a> {
    pub hpos: u32,
    pub vpos: u32,
    pub width: u32,
    pub height: u32,
    pub lines: &'a [&'a str],
}

impl<'a> BlockSpec<'a> {
    pub fn new(hpos: u32, vpos: u32, width: u32, height: u32, lines: &'a [&'a str]) -> Self {
        Self {
            hpos,
            vpos,
            width,
            height,
            lines,
        }
    }
}

/// Build a Tesseract-style ALTO v3 document with one ComposedBlock per block
pub fn alto_document(blocks: &[BlockSpec<'_>]) -> String {
    let mut body = String::new();
    for (i, block) in blocks.iter().enumerate() {
        body.push_str(&format!(
            "<ComposedBlock ID=\"cblock_{i}\" HPOS=\"{h}\" VPOS=\"{v}\" WIDTH=\"{w}\" HEIGHT=\"{ht}\">\n\
             <TextBlock ID=\"block_{i}\" HPOS=\"{h}\" VPOS=\"{v}\" WIDTH=\"{w}\" HEIGHT=\"{ht}\">\n",
            h = block.hpos,
            v = block.vpos,
            w = block.width,
            ht = block.height,
        ));
        for (j, line) in block.lines.iter().enumerate() {
            body.push_str(&format!(
                "<TextLine ID=\"line_{i}_{j}\"><String ID=\"string_{i}_{j}\" CONTENT=\"{line}\" WC=\"0.90\"/></TextLine>\n"
            ));
        }
        body.push_str("</TextBlock>\n</ComposedBlock>\n");
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<alto xmlns="http://www.loc.gov/standards/alto/ns-v3#" xmlns:xlink="http://www.w3.org/1999/xlink">
<Description>
<MeasurementUnit>pixel</MeasurementUnit>
<sourceImageInformation><fileName>frame.png</fileName></sourceImageInformation>
</Description>
<Layout>
<Page WIDTH="640" HEIGHT="480" PHYSICAL_IMG_NR="0" ID="page_0">
<PrintSpace HPOS="0" VPOS="0" WIDTH="640" HEIGHT="480">
{body}</PrintSpace>
</Page>
</Layout>
</alto>
"#
    )
}

/// A white canvas of the given size
pub fn blank_frame(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
}

/// Fill an axis-aligned square
pub fn paint_square(image: &mut RgbaImage, x: i32, y: i32, side: u32, color: [u8; 3]) {
    draw_filled_rect_mut(
        image,
        Rect::at(x, y).of_size(side, side),
        Rgba([color[0], color[1], color[2], 255]),
    );
}

/// Paint both left-edge markers of the bubble around a text block, assuming
/// the bubble is not clamped by the image borders
pub fn paint_markers(
    image: &mut RgbaImage,
    block: &BlockSpec<'_>,
    padding: u32,
    top: [u8; 3],
    bottom: [u8; 3],
) {
    let left = block.hpos as i32 - padding as i32;
    let bubble_top = block.vpos as i32 - padding as i32;
    let bubble_bottom = far_edge(block.vpos, block.height, padding) as i32;

    paint_square(image, left, bubble_top, padding, top);
    paint_square(image, left, bubble_bottom - padding as i32, padding, bottom);
}
