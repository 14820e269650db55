//! ALTO XML reader
//!
//! Builds a typed [`LayoutTree`] from the `Layout` section of an ALTO
//! document. Elements are matched on their local name, so the namespace
//! (and the ALTO schema version it encodes) does not matter.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::LayoutError;

/// Kinds of layout elements the pipeline distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Page,
    PrintSpace,
    ComposedBlock,
    TextBlock,
    TextLine,
    String,
    /// Anything else (margins, illustrations, `SP`, `HYP`, future additions)
    Other,
}

impl NodeKind {
    fn from_local_name(name: &[u8]) -> Self {
        match name {
            b"Page" => Self::Page,
            b"PrintSpace" => Self::PrintSpace,
            b"ComposedBlock" => Self::ComposedBlock,
            b"TextBlock" => Self::TextBlock,
            b"TextLine" => Self::TextLine,
            b"String" => Self::String,
            _ => Self::Other,
        }
    }
}

/// A single element of the layout hierarchy
#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub kind: NodeKind,
    attributes: Vec<(String, String)>,
    pub children: Vec<LayoutNode>,
}

impl LayoutNode {
    fn from_element(element: &BytesStart<'_>, position: u64) -> Result<Self, LayoutError> {
        let kind = NodeKind::from_local_name(element.local_name().as_ref());

        let mut attributes = Vec::new();
        for attr in element.attributes() {
            let attr = attr.map_err(|e| LayoutError::Xml {
                position,
                msg: e.to_string(),
            })?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value().map_err(|e| LayoutError::Xml {
                position,
                msg: e.to_string(),
            })?;
            attributes.push((key, value.into_owned()));
        }

        Ok(Self {
            kind,
            attributes,
            children: Vec::new(),
        })
    }

    /// Look up an attribute by its local name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// The children of an ALTO `Layout` element, in document order
#[derive(Debug, Clone, Default)]
pub struct LayoutTree {
    pub roots: Vec<LayoutNode>,
}

/// Parse the `Layout` section of an ALTO document
pub fn parse(xml: &[u8]) -> Result<LayoutTree, LayoutError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut stack: Vec<LayoutNode> = Vec::new();
    let mut roots = Vec::new();
    let mut in_layout = false;
    let mut seen_layout = false;

    loop {
        let position = reader.buffer_position() as u64;
        let event = reader.read_event_into(&mut buf);
        match event.map_err(|e| LayoutError::Xml {
            position,
            msg: e.to_string(),
        })? {
            Event::Start(ref e) if !in_layout => {
                if e.local_name().as_ref() == b"Layout" {
                    in_layout = true;
                    seen_layout = true;
                }
            }
            Event::Empty(ref e) if !in_layout => {
                if e.local_name().as_ref() == b"Layout" {
                    seen_layout = true;
                }
            }
            Event::Start(ref e) => stack.push(LayoutNode::from_element(e, position)?),
            Event::Empty(ref e) => {
                let node = LayoutNode::from_element(e, position)?;
                attach(&mut stack, &mut roots, node);
            }
            Event::End(_) if in_layout => match stack.pop() {
                Some(node) => attach(&mut stack, &mut roots, node),
                // Only `</Layout>` closes with an empty stack
                None => in_layout = false,
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if in_layout {
        return Err(LayoutError::Xml {
            position: reader.buffer_position() as u64,
            msg: "unexpected end of document inside Layout".to_string(),
        });
    }
    if !seen_layout {
        return Err(LayoutError::MissingLayout);
    }

    Ok(LayoutTree { roots })
}

fn attach(stack: &mut Vec<LayoutNode>, roots: &mut Vec<LayoutNode>, node: LayoutNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => roots.push(node),
    }
}
