//! Vision Layer
//!
//! Turns a frame plus its OCR layout into attributed speech bubbles:
//! layout → bubble rectangle → marker colors → character.

pub mod bubble;
pub mod marker;
pub mod ocr;
pub mod palette;

pub use bubble::{BubbleRegion, LocatedBubble};
pub use marker::{MarkerCorner, MarkerSampler};
pub use ocr::{LayoutProvider, SidecarLayout, TesseractOcr};
pub use palette::{Attribution, CharacterClassifier, CharacterPalette, MarkerMatch};

use serde::Serialize;
use std::time::Instant;
use tracing::debug;

use crate::capture::Frame;
use crate::config::{AppConfig, PipelineSettings};
use crate::error::{PipelineError, Result};
use crate::layout::{self, TextBlock};

/// A dialogue line attributed to a character
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeechBubble {
    #[serde(rename = "character_name")]
    pub character: String,
    #[serde(rename = "speech_bubble_text")]
    pub text: String,
}

/// Per-frame counters of what happened to each text block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttributionStats {
    /// Text blocks found in the layout
    pub text_blocks: usize,
    /// Blocks that produced a speech bubble
    pub attributed: usize,
    /// Blocks whose bubble had no area left after clamping
    pub degenerate_regions: usize,
    /// Blocks with at least one marker outside the palette
    pub unmatched_markers: usize,
    /// Blocks whose two markers named different characters
    pub disagreeing_markers: usize,
}

/// Result of attributing one frame
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FrameAttribution {
    /// Speech bubbles in document order
    pub bubbles: Vec<SpeechBubble>,
    pub stats: AttributionStats,
}

/// Attribution pipeline; immutable once built and safe to share across threads
#[derive(Debug, Clone)]
pub struct BubblePipeline {
    padding: u32,
    sampler: MarkerSampler,
    classifier: CharacterClassifier,
}

impl BubblePipeline {
    /// Create a pipeline from validated settings and palette
    pub fn new(settings: &PipelineSettings, palette: CharacterPalette) -> Result<Self> {
        settings.validate()?;
        palette.warn_unreachable(settings.posterize_bits);

        Ok(Self {
            padding: settings.padding,
            sampler: MarkerSampler::new(settings.padding, settings.posterize_bits),
            classifier: CharacterClassifier::new(palette),
        })
    }

    /// Create a pipeline from the application configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(&config.pipeline, config.palette()?)
    }

    pub fn padding(&self) -> u32 {
        self.padding
    }

    pub fn palette(&self) -> &CharacterPalette {
        self.classifier.palette()
    }

    /// Attribute the speech bubbles of a frame given its ALTO layout.
    ///
    /// A malformed layout aborts the frame. Blocks that cannot be attributed
    /// are skipped and only show up in the returned stats.
    pub fn attribute(&self, frame: &Frame, layout: &[u8]) -> Result<FrameAttribution> {
        let blocks =
            layout::parse_text_blocks(layout).map_err(|source| PipelineError::MalformedLayout {
                image: frame.id().to_string(),
                source,
            })?;

        let start = Instant::now();
        let result = self.attribute_blocks(frame.image(), &blocks);

        let (width, height) = frame.dimensions();
        debug!(
            "Attributed {} of {} text blocks in {} ({}x{}) in {:?}",
            result.stats.attributed,
            result.stats.text_blocks,
            frame.id(),
            width,
            height,
            start.elapsed()
        );

        Ok(result)
    }

    /// Attribute already parsed text blocks against a pixel grid
    pub fn attribute_blocks(&self, image: &image::RgbaImage, blocks: &[TextBlock]) -> FrameAttribution {
        let mut result = FrameAttribution::default();

        for (index, block) in blocks.iter().enumerate() {
            result.stats.text_blocks += 1;

            let Some(bubble) = bubble::locate(image, block, self.padding) else {
                debug!(
                    "Block {} skipped: bubble {:?} lies outside the frame",
                    index,
                    BubbleRegion::around(block, self.padding)
                );
                result.stats.degenerate_regions += 1;
                continue;
            };

            let colors = self.sampler.sample(&bubble.image);
            match self.classifier.attribute(colors) {
                Attribution::Character(name) => {
                    result.stats.attributed += 1;
                    result.bubbles.push(SpeechBubble {
                        character: name.to_string(),
                        text: block.content.clone(),
                    });
                }
                Attribution::Unmatched => {
                    debug!(
                        "Block {} skipped: unmatched marker colors {:?} in bubble {:?}",
                        index, colors, bubble.bounds
                    );
                    result.stats.unmatched_markers += 1;
                }
                Attribution::Disagreement { top, bottom } => {
                    debug!(
                        "Block {} skipped: markers disagree ({} / {}) in bubble {:?}",
                        index, top, bottom, bubble.bounds
                    );
                    result.stats.disagreeing_markers += 1;
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{alto_document, blank_frame, paint_markers, BlockSpec};
    use image::DynamicImage;

    const TORO: [u8; 3] = [224, 224, 192];
    const KURO: [u8; 3] = [32, 32, 32];
    const NOBODY: [u8; 3] = [0, 128, 0];

    fn pipeline() -> BubblePipeline {
        let palette = CharacterPalette::new([("井上トロ", TORO), ("クロ", KURO)]).unwrap();
        BubblePipeline::new(&PipelineSettings::default(), palette).unwrap()
    }

    fn frame(image: image::RgbaImage) -> Frame {
        Frame::new("frame.png", DynamicImage::ImageRgba8(image))
    }

    #[test]
    fn test_single_bubble_scenario() {
        let block = BlockSpec::new(100, 50, 80, 40, &["こんにちは"]);
        let mut image = blank_frame(640, 480);
        paint_markers(&mut image, &block, 8, TORO, TORO);

        let layout = alto_document(&[block]);
        let result = pipeline().attribute(&frame(image), layout.as_bytes()).unwrap();

        assert_eq!(
            result.bubbles,
            vec![SpeechBubble {
                character: "井上トロ".to_string(),
                text: "こんにちは".to_string(),
            }]
        );
        assert_eq!(result.stats.text_blocks, 1);
        assert_eq!(result.stats.attributed, 1);
    }

    #[test]
    fn test_multiline_text_attributed() {
        let block = BlockSpec::new(100, 50, 80, 40, &["A", "B", "C"]);
        let mut image = blank_frame(640, 480);
        paint_markers(&mut image, &block, 8, KURO, KURO);

        let layout = alto_document(&[block]);
        let result = pipeline().attribute(&frame(image), layout.as_bytes()).unwrap();

        assert_eq!(result.bubbles.len(), 1);
        assert_eq!(result.bubbles[0].character, "クロ");
        assert_eq!(result.bubbles[0].text, "A\nB\nC");
    }

    #[test]
    fn test_disagreeing_markers_skipped() {
        let block = BlockSpec::new(100, 50, 80, 40, &["x"]);
        let mut image = blank_frame(640, 480);
        paint_markers(&mut image, &block, 8, TORO, KURO);

        let layout = alto_document(&[block]);
        let result = pipeline().attribute(&frame(image), layout.as_bytes()).unwrap();

        assert!(result.bubbles.is_empty());
        assert_eq!(result.stats.disagreeing_markers, 1);
    }

    #[test]
    fn test_unmatched_marker_skipped() {
        let block = BlockSpec::new(100, 50, 80, 40, &["x"]);
        let mut image = blank_frame(640, 480);
        paint_markers(&mut image, &block, 8, TORO, NOBODY);

        let layout = alto_document(&[block]);
        let result = pipeline().attribute(&frame(image), layout.as_bytes()).unwrap();

        assert!(result.bubbles.is_empty());
        assert_eq!(result.stats.unmatched_markers, 1);
    }

    #[test]
    fn test_degenerate_region_skipped() {
        let layout = alto_document(&[BlockSpec::new(1000, 1000, 10, 10, &["off screen"])]);
        let result = pipeline()
            .attribute(&frame(blank_frame(640, 480)), layout.as_bytes())
            .unwrap();

        assert!(result.bubbles.is_empty());
        assert_eq!(result.stats.degenerate_regions, 1);
        assert_eq!(result.stats.text_blocks, 1);
    }

    #[test]
    fn test_order_preserved_and_failures_absent() {
        let blocks = [
            BlockSpec::new(300, 300, 60, 30, &["one"]),
            BlockSpec::new(20, 20, 60, 30, &["two"]),
            BlockSpec::new(300, 20, 60, 30, &["three"]),
            BlockSpec::new(20, 300, 60, 30, &["four"]),
        ];
        let mut image = blank_frame(640, 480);
        paint_markers(&mut image, &blocks[0], 8, KURO, KURO);
        paint_markers(&mut image, &blocks[1], 8, TORO, NOBODY);
        paint_markers(&mut image, &blocks[2], 8, TORO, TORO);
        paint_markers(&mut image, &blocks[3], 8, KURO, KURO);

        let layout = alto_document(&blocks);
        let result = pipeline().attribute(&frame(image), layout.as_bytes()).unwrap();

        let got: Vec<_> = result
            .bubbles
            .iter()
            .map(|b| (b.character.as_str(), b.text.as_str()))
            .collect();
        assert_eq!(got, [("クロ", "one"), ("井上トロ", "three"), ("クロ", "four")]);
        assert_eq!(
            result.stats,
            AttributionStats {
                text_blocks: 4,
                attributed: 3,
                degenerate_regions: 0,
                unmatched_markers: 1,
                disagreeing_markers: 0,
            }
        );
    }

    #[test]
    fn test_identical_inputs_identical_output() {
        let blocks = [
            BlockSpec::new(100, 50, 80, 40, &["a"]),
            BlockSpec::new(300, 200, 80, 40, &["b"]),
        ];
        let mut image = blank_frame(640, 480);
        paint_markers(&mut image, &blocks[0], 8, TORO, TORO);
        paint_markers(&mut image, &blocks[1], 8, KURO, KURO);
        let frame = frame(image);
        let layout = alto_document(&blocks);

        let pipeline = pipeline();
        let first = pipeline.attribute(&frame, layout.as_bytes()).unwrap();
        let second = pipeline.attribute(&frame, layout.as_bytes()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.bubbles.len(), 2);
    }

    #[test]
    fn test_malformed_layout_reports_frame() {
        let layout = br#"<alto><Layout><Page><PrintSpace>
<TextBlock HPOS="0" VPOS="0" WIDTH="ten" HEIGHT="1"/>
</PrintSpace></Page></Layout></alto>"#;

        let err = pipeline()
            .attribute(&frame(blank_frame(10, 10)), layout)
            .unwrap_err();
        match err {
            PipelineError::MalformedLayout { image, .. } => assert_eq!(image, "frame.png"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_clamped_bubble_uses_clamped_height() {
        // The bubble runs past the bottom edge; the bottom marker is read
        // from the last rows that remain inside the frame
        let block = BlockSpec::new(50, 60, 40, 30, &["edge"]);
        let mut image = blank_frame(200, 95);
        crate::test_support::paint_square(&mut image, 42, 52, 8, TORO);
        crate::test_support::paint_square(&mut image, 42, 87, 8, TORO);

        let layout = alto_document(&[block]);
        let result = pipeline().attribute(&frame(image), layout.as_bytes()).unwrap();

        assert_eq!(result.bubbles.len(), 1);
        assert_eq!(result.bubbles[0].text, "edge");
    }

    #[test]
    fn test_odd_padding_bottom_marker_position() {
        // Bubble bottom is 3 + 7 + 4.5 = 14.5, rounded to 14, so the bottom
        // patch starts at row 11 and is read at row 12
        let palette = CharacterPalette::new([("井上トロ", TORO)]).unwrap();
        let settings = PipelineSettings {
            padding: 3,
            ..Default::default()
        };
        let pipeline = BubblePipeline::new(&settings, palette).unwrap();

        let block = BlockSpec::new(20, 3, 20, 7, &["odd"]);
        let mut image = blank_frame(100, 100);
        crate::test_support::paint_square(&mut image, 18, 1, 1, TORO);
        crate::test_support::paint_square(&mut image, 18, 12, 1, TORO);

        let layout = alto_document(&[block]);
        let result = pipeline.attribute(&frame(image), layout.as_bytes()).unwrap();

        assert_eq!(result.stats.attributed, 1);
        assert_eq!(result.bubbles[0].text, "odd");
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = PipelineSettings {
            padding: 0,
            ..Default::default()
        };
        let result = BubblePipeline::new(&settings, CharacterPalette::default());
        assert!(matches!(result, Err(PipelineError::InvalidSettings(_))));
    }

    #[test]
    fn test_from_default_config() {
        let pipeline = BubblePipeline::from_config(&AppConfig::default()).unwrap();
        assert_eq!(pipeline.padding(), 8);
        assert_eq!(pipeline.palette().names().collect::<Vec<_>>(), ["井上トロ"]);
    }

    #[test]
    fn test_speech_bubble_json_keys() {
        let bubble = SpeechBubble {
            character: "井上トロ".to_string(),
            text: "こんにちは".to_string(),
        };
        let json = serde_json::to_value(&bubble).unwrap();
        assert_eq!(json["character_name"], "井上トロ");
        assert_eq!(json["speech_bubble_text"], "こんにちは");
    }
}
