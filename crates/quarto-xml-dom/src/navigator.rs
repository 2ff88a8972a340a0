/*
 * navigator.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! A read-only cursor over a document tree, for query engines.
//!
//! The cursor sits either on a node or on one of an element's attributes.
//! It never hands out the underlying [`Node`], so code holding only a
//! navigator cannot mutate the tree.

use std::fmt;

use crate::node::{Node, NodeKind};

/// The node categories a query engine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigatorNodeType {
    Root,
    Element,
    Attribute,
    /// Text and CDATA sections.
    Text,
    /// Comments, and every kind without a category of its own.
    Comment,
    ProcessingInstruction,
}

#[derive(Clone)]
pub struct NodeNavigator {
    node: Node,
    /// Index into the element's attributes when positioned on one.
    attribute: Option<usize>,
}

impl NodeNavigator {
    pub fn new(node: &Node) -> Self {
        Self {
            node: node.clone(),
            attribute: None,
        }
    }

    /// The node under the cursor.
    fn current(&self) -> Node {
        self.attribute
            .and_then(|index| self.node.attributes()?.item(index))
            .unwrap_or_else(|| self.node.clone())
    }

    pub fn node_type(&self) -> NavigatorNodeType {
        match self.current().kind() {
            NodeKind::Document => NavigatorNodeType::Root,
            NodeKind::Element => NavigatorNodeType::Element,
            NodeKind::Attribute => NavigatorNodeType::Attribute,
            NodeKind::Text | NodeKind::CDataSection => NavigatorNodeType::Text,
            NodeKind::ProcessingInstruction => NavigatorNodeType::ProcessingInstruction,
            NodeKind::Comment
            | NodeKind::DocumentType
            | NodeKind::DocumentFragment
            | NodeKind::EntityReference
            | NodeKind::Entity
            | NodeKind::Notation => NavigatorNodeType::Comment,
        }
    }

    pub fn local_name(&self) -> String {
        self.current().local_name()
    }

    /// The name prefix, empty when there is none.
    pub fn prefix(&self) -> String {
        self.current().prefix().unwrap_or_default()
    }

    pub fn value(&self) -> String {
        self.current().value()
    }

    pub fn to_xml(&self) -> String {
        self.current().to_xml()
    }

    /// Whether both cursors point at the same node or attribute.
    pub fn is_same_position(&self, other: &NodeNavigator) -> bool {
        self.node == other.node && self.attribute == other.attribute
    }

    /// Move to the top of the tree containing the current node.
    pub fn move_to_root(&mut self) {
        while self.move_to_parent() {}
    }

    /// From an attribute, move to its element; otherwise to the parent node.
    pub fn move_to_parent(&mut self) -> bool {
        if self.attribute.take().is_some() {
            return true;
        }
        match self.node.parent() {
            Some(parent) => {
                self.node = parent;
                true
            }
            None => false,
        }
    }

    /// Move to the first child. Attributes have no children.
    pub fn move_to_child(&mut self) -> bool {
        if self.attribute.is_some() {
            return false;
        }
        match self.node.first_child() {
            Some(child) => {
                self.node = child;
                true
            }
            None => false,
        }
    }

    /// Move to the first sibling. Returns `false` when already there.
    pub fn move_to_first(&mut self) -> bool {
        if !self.move_to_previous() {
            return false;
        }
        while self.move_to_previous() {}
        true
    }

    pub fn move_to_next(&mut self) -> bool {
        if self.attribute.is_some() {
            return false;
        }
        match self.node.next_sibling() {
            Some(sibling) => {
                self.node = sibling;
                true
            }
            None => false,
        }
    }

    pub fn move_to_previous(&mut self) -> bool {
        if self.attribute.is_some() {
            return false;
        }
        match self.node.previous_sibling() {
            Some(sibling) => {
                self.node = sibling;
                true
            }
            None => false,
        }
    }

    /// Move to the element's first attribute, or from one attribute to the
    /// next.
    pub fn move_to_next_attribute(&mut self) -> bool {
        let Some(attributes) = self.node.attributes() else {
            return false;
        };
        let next = self.attribute.map_or(0, |index| index + 1);
        if next >= attributes.len() {
            return false;
        }
        self.attribute = Some(next);
        true
    }

    /// Jump to the position of `other`.
    pub fn move_to(&mut self, other: &NodeNavigator) -> bool {
        self.node = other.node.clone();
        self.attribute = other.attribute;
        true
    }
}

impl fmt::Debug for NodeNavigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeNavigator")
            .field("node", &self.current())
            .field("attribute", &self.attribute)
            .finish()
    }
}

impl fmt::Display for NodeNavigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml())
    }
}
