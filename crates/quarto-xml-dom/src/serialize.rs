/*
 * serialize.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Rendering nodes back to XML text.
//!
//! Parsed nodes are written from their raw source for as long as it is still
//! valid. Nodes built in code, cloned, or whose value changed are rendered
//! canonically.
//!
//! An element reuses its captured tag close and end tag only when its name
//! is unchanged and its attribute list was not modified. An element written
//! without an end tag (self-closing, or closed implicitly during recovery)
//! must also still be childless; one left open at the end of input keeps
//! its children inside it. Otherwise it is closed with `/>` when childless,
//! or `>` children `</name>`.
//!
//! Rendering walks the tree with an explicit stack, so nesting depth is
//! bounded only by memory.

use quick_xml::escape::{escape, partial_escape};

use crate::attributes::Attributes;
use crate::node::{Node, NodeData, NodeKind};
use crate::raw::{AttributeRaw, ElementRaw, RawSource};

/// Pending output: a node still to render, or text closing an element.
enum Step {
    Node(Node),
    Close(String),
}

impl Node {
    /// Serialize this node and its subtree. Never modifies the tree.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![Step::Node(self.clone())];
        while let Some(step) = stack.pop() {
            match step {
                Step::Node(node) => node.write_xml(&mut out, &mut stack),
                Step::Close(text) => out.push_str(&text),
            }
        }
        out
    }

    /// Write everything up to this node's children, then queue the children
    /// followed by the closing text.
    fn write_xml(&self, out: &mut String, stack: &mut Vec<Step>) {
        let data = self.0.borrow();
        match data.kind {
            NodeKind::Element => {
                if let Some(close) = write_element(&data, out) {
                    stack.push(Step::Close(close));
                }
                push_children(&data, stack);
            }
            NodeKind::Attribute => write_attribute(&data, out),
            NodeKind::Text => match verbatim(&data) {
                Some(raw) => out.push_str(raw),
                None => out.push_str(&partial_escape(&data.value)),
            },
            NodeKind::CDataSection => match verbatim(&data) {
                Some(raw) => out.push_str(raw),
                None => {
                    out.push_str("<![CDATA[");
                    out.push_str(&data.value);
                    out.push_str("]]>");
                }
            },
            NodeKind::Comment => match verbatim(&data) {
                Some(raw) => out.push_str(raw),
                None => {
                    out.push_str("<!--");
                    out.push_str(&data.value);
                    out.push_str("-->");
                }
            },
            NodeKind::ProcessingInstruction => match verbatim(&data) {
                Some(raw) => out.push_str(raw),
                None => {
                    out.push_str("<?");
                    out.push_str(&data.name);
                    if !data.value.is_empty() {
                        out.push(' ');
                        out.push_str(&data.value);
                    }
                    out.push_str("?>");
                }
            },
            NodeKind::DocumentType => match verbatim(&data) {
                Some(raw) => out.push_str(raw),
                None => {
                    out.push_str("<!");
                    out.push_str(&data.value);
                    out.push('>');
                }
            },
            NodeKind::EntityReference => {
                out.push('&');
                out.push_str(&data.name);
                out.push(';');
            }
            NodeKind::Entity | NodeKind::Notation => {}
            NodeKind::Document | NodeKind::DocumentFragment => push_children(&data, stack),
        }
    }
}

/// The single raw span of a leaf, unless its value changed.
fn verbatim(data: &NodeData) -> Option<&str> {
    if data.value_modified {
        return None;
    }
    match &data.raw {
        Some(RawSource::Verbatim(text)) => Some(text),
        _ => None,
    }
}

fn push_children(data: &NodeData, stack: &mut Vec<Step>) {
    stack.extend(data.children.iter().rev().cloned().map(Step::Node));
}

/// Write the start tag and return the text that closes the element after
/// its children, if any.
fn write_element(data: &NodeData, out: &mut String) -> Option<String> {
    let raw: Option<&ElementRaw> = match &data.raw {
        Some(RawSource::Element(raw)) => Some(raw),
        _ => None,
    };

    out.push_str(raw.map_or("<", |raw| raw.before_name.as_str()));
    out.push_str(&data.name);
    let attributes_modified = data.attributes.as_ref().is_some_and(Attributes::is_modified);
    if let Some(attributes) = &data.attributes {
        for attr in attributes.nodes() {
            write_attribute(&attr.0.borrow(), out);
        }
    }

    let has_children = !data.children.is_empty();
    let captured_close = raw.filter(|raw| {
        raw.name == data.name
            && !attributes_modified
            && (raw.end_tag.is_some() || raw.open_at_eof || !has_children)
    });
    match captured_close {
        Some(raw) => {
            out.push_str(&raw.tag_close);
            raw.end_tag.clone()
        }
        None if !has_children => {
            out.push_str("/>");
            None
        }
        None => {
            out.push('>');
            Some(format!("</{}>", data.name))
        }
    }
}

fn write_attribute(data: &NodeData, out: &mut String) {
    let raw: Option<&AttributeRaw> = match &data.raw {
        Some(RawSource::Attribute(raw)) => Some(raw),
        _ => None,
    };

    out.push_str(raw.map_or(" ", |raw| raw.leading.as_str()));
    out.push_str(&data.name);
    match raw.filter(|_| !data.value_modified) {
        Some(raw) => {
            out.push_str(&raw.equals_and_open_quote);
            out.push_str(&raw.value);
            out.push_str(&raw.close_quote);
        }
        None => {
            out.push_str("=\"");
            out.push_str(&escape(&data.value));
            out.push('"');
        }
    }
}
