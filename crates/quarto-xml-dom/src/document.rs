/*
 * document.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The document node and its node factories.

use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use crate::error::{DomError, DomResult};
use crate::node::{Node, NodeCell, NodeKind};

/// The root of a tree and the owner of every node created through it.
///
/// `Document` dereferences to its [`Node`], so tree operations such as
/// [`Node::append_child`] are called on it directly.
///
/// Nodes do not keep their document alive; see the crate-level notes on
/// lifetimes.
#[derive(Clone, PartialEq, Eq)]
pub struct Document(Node);

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Document(Node::new_detached(
            NodeKind::Document,
            "#document".to_string(),
            String::new(),
            &std::rc::Weak::new(),
        ))
    }

    pub(crate) fn from_rc(rc: Rc<NodeCell>) -> Self {
        Document(Node(rc))
    }

    /// View a node as a document, if it is one.
    pub fn from_node(node: &Node) -> Option<Self> {
        (node.kind() == NodeKind::Document).then(|| Document(node.clone()))
    }

    pub fn as_node(&self) -> &Node {
        &self.0
    }

    pub fn into_node(self) -> Node {
        self.0
    }

    /// The first element child of the document.
    pub fn document_element(&self) -> Option<Node> {
        self.0
            .child_nodes()
            .into_iter()
            .find(|child| child.kind() == NodeKind::Element)
    }

    /// Create a node without validating its name. Used by the parser, which
    /// must accept whatever the source contains.
    pub(crate) fn create(&self, kind: NodeKind, name: &str, value: &str) -> Node {
        Node::new_detached(
            kind,
            name.to_string(),
            value.to_string(),
            &self.0.downgrade(),
        )
    }

    /// # Errors
    ///
    /// [`DomError::InvalidCharacter`] if `name` is not a usable XML name.
    pub fn create_element(&self, name: &str) -> DomResult<Node> {
        check_name(name)?;
        Ok(self.create(NodeKind::Element, name, ""))
    }

    /// Create a detached attribute with an empty value.
    ///
    /// # Errors
    ///
    /// [`DomError::InvalidCharacter`] if `name` is not a usable XML name.
    pub fn create_attribute(&self, name: &str) -> DomResult<Node> {
        check_name(name)?;
        Ok(self.create(NodeKind::Attribute, name, ""))
    }

    pub fn create_text_node(&self, data: &str) -> Node {
        self.create(NodeKind::Text, "#text", data)
    }

    pub fn create_comment(&self, data: &str) -> Node {
        self.create(NodeKind::Comment, "#comment", data)
    }

    /// # Errors
    ///
    /// [`DomError::InvalidCharacter`] if `data` contains `]]>`.
    pub fn create_cdata_section(&self, data: &str) -> DomResult<Node> {
        if data.contains("]]>") {
            return Err(DomError::InvalidCharacter);
        }
        Ok(self.create(NodeKind::CDataSection, "#cdata-section", data))
    }

    /// # Errors
    ///
    /// [`DomError::InvalidCharacter`] if `target` is not a usable XML name
    /// or `data` contains `?>`.
    pub fn create_processing_instruction(&self, target: &str, data: &str) -> DomResult<Node> {
        check_name(target)?;
        if data.contains("?>") {
            return Err(DomError::InvalidCharacter);
        }
        Ok(self.create(NodeKind::ProcessingInstruction, target, data))
    }

    /// # Errors
    ///
    /// [`DomError::InvalidCharacter`] if `name` is not a usable XML name.
    pub fn create_entity_reference(&self, name: &str) -> DomResult<Node> {
        check_name(name)?;
        Ok(self.create(NodeKind::EntityReference, name, ""))
    }

    /// Create a document type node. `declaration` is the text between `<!`
    /// and `>`, e.g. `DOCTYPE html`.
    pub fn create_document_type(&self, declaration: &str) -> Node {
        self.create(NodeKind::DocumentType, "#document-type", declaration)
    }

    pub fn create_document_fragment(&self) -> Node {
        self.create(NodeKind::DocumentFragment, "#document-fragment", "")
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Document {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.0
    }
}

impl PartialEq<Node> for Document {
    fn eq(&self, other: &Node) -> bool {
        self.0 == *other
    }
}

impl PartialEq<Document> for Node {
    fn eq(&self, other: &Document) -> bool {
        *self == other.0
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Document").field(&self.0).finish()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Reject names that could not round-trip through a start tag.
fn check_name(name: &str) -> DomResult<()> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(DomError::InvalidCharacter);
    };
    if first.is_ascii_digit() || first == '-' || first == '.' {
        return Err(DomError::InvalidCharacter);
    }
    let forbidden = |c: char| c.is_whitespace() || "<>&\"'=/!?".contains(c);
    if name.chars().any(forbidden) {
        return Err(DomError::InvalidCharacter);
    }
    Ok(())
}
