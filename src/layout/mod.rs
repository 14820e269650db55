//! Layout Parsing
//!
//! Turns an OCR layout document into the ordered list of text blocks the
//! rest of the pipeline works on. Only `ComposedBlock` containers and
//! `TextBlock` leaves are interpreted; every other element is skipped.

pub mod alto;

pub use alto::{LayoutNode, LayoutTree, NodeKind};

use serde::Serialize;

use crate::error::LayoutError;

/// A recognized text region in source-image pixel coordinates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextBlock {
    pub width: u32,
    pub height: u32,
    pub horizontal_position: u32,
    pub vertical_position: u32,
    /// Line texts joined with `\n`, no trailing newline
    pub content: String,
}

impl TextBlock {
    fn from_node(node: &LayoutNode) -> Result<Self, LayoutError> {
        let block = node.attribute("ID").unwrap_or("<unnamed>");

        let content = node
            .children
            .iter()
            .filter(|child| child.kind == NodeKind::TextLine)
            .map(line_text)
            .collect::<Vec<_>>()
            .join("\n");

        Ok(Self {
            width: dimension(node, block, "WIDTH")?,
            height: dimension(node, block, "HEIGHT")?,
            horizontal_position: dimension(node, block, "HPOS")?,
            vertical_position: dimension(node, block, "VPOS")?,
            content,
        })
    }
}

/// Parse an ALTO document into text blocks, in document order
pub fn parse_text_blocks(xml: &[u8]) -> Result<Vec<TextBlock>, LayoutError> {
    let tree = alto::parse(xml)?;
    text_blocks(&tree)
}

/// Collect the text blocks of an already parsed layout tree
pub fn text_blocks(tree: &LayoutTree) -> Result<Vec<TextBlock>, LayoutError> {
    let mut blocks = Vec::new();
    for node in &tree.roots {
        collect(node, &mut blocks)?;
    }
    Ok(blocks)
}

fn collect(node: &LayoutNode, blocks: &mut Vec<TextBlock>) -> Result<(), LayoutError> {
    match node.kind {
        NodeKind::Page | NodeKind::PrintSpace | NodeKind::ComposedBlock => {
            for child in &node.children {
                collect(child, blocks)?;
            }
        }
        NodeKind::TextBlock => blocks.push(TextBlock::from_node(node)?),
        NodeKind::TextLine | NodeKind::String | NodeKind::Other => {}
    }
    Ok(())
}

fn line_text(line: &LayoutNode) -> String {
    line.children
        .iter()
        .filter(|child| child.kind == NodeKind::String)
        .filter_map(|string| string.attribute("CONTENT"))
        .collect()
}

fn dimension(node: &LayoutNode, block: &str, attribute: &'static str) -> Result<u32, LayoutError> {
    let value = node
        .attribute(attribute)
        .ok_or_else(|| LayoutError::MissingAttribute {
            block: block.to_string(),
            attribute,
        })?;

    parse_dimension(value).ok_or_else(|| LayoutError::InvalidAttribute {
        block: block.to_string(),
        attribute,
        value: value.to_string(),
    })
}

/// ALTO declares positions as floats; only whole, non-negative values are accepted
fn parse_dimension(value: &str) -> Option<u32> {
    let value = value.trim();
    if let Ok(v) = value.parse::<u32>() {
        return Some(v);
    }

    let v: f64 = value.parse().ok()?;
    (v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64).then_some(v as u32)
}
