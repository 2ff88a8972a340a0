/*
 * node.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The node model shared by every member of a document tree.
//!
//! A [`Node`] is a cheap, clonable handle. Children are owned by their parent
//! through its `children` vector; the parent, owner document and owning
//! attribute collection are weak back-references, so dropping the last
//! handle on a detached subtree frees it.

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use crate::attributes::{Attributes, WeakAttributeMap};
use crate::document::Document;
use crate::raw::RawSource;

pub(crate) type NodeCell = RefCell<NodeData>;
pub(crate) type WeakNode = Weak<NodeCell>;

/// The kind of XML construct a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Element,
    Attribute,
    Text,
    CDataSection,
    EntityReference,
    Entity,
    ProcessingInstruction,
    Comment,
    Document,
    DocumentType,
    DocumentFragment,
    Notation,
}

impl NodeKind {
    /// Whether nodes of this kind may own children.
    pub fn can_have_children(self) -> bool {
        matches!(
            self,
            NodeKind::Element | NodeKind::Document | NodeKind::DocumentFragment
        )
    }

    fn is_character_data(self) -> bool {
        matches!(
            self,
            NodeKind::Text
                | NodeKind::CDataSection
                | NodeKind::Comment
                | NodeKind::ProcessingInstruction
        )
    }
}

pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) name: String,
    pub(crate) value: String,
    pub(crate) value_modified: bool,
    /// Index among the parent's children; `None` while detached.
    pub(crate) position: Option<usize>,
    pub(crate) parent: Option<WeakNode>,
    /// The collection holding this attribute, if any.
    pub(crate) owner_attributes: Option<WeakAttributeMap>,
    pub(crate) children: Vec<Node>,
    /// Points at the node itself for documents.
    pub(crate) owner_document: WeakNode,
    pub(crate) attributes: Option<Attributes>,
    pub(crate) raw: Option<RawSource>,
}

impl Drop for NodeData {
    fn drop(&mut self) {
        // Tear the subtree down with an explicit stack so deep trees cannot
        // overflow. Children that outlive their parent become detached.
        let mut pending = std::mem::take(&mut self.children);
        while let Some(child) = pending.pop() {
            match Rc::try_unwrap(child.0) {
                Ok(cell) => {
                    let mut data = cell.into_inner();
                    pending.append(&mut data.children);
                }
                Err(shared) => {
                    if let Ok(mut data) = shared.try_borrow_mut() {
                        data.parent = None;
                        data.position = None;
                    }
                }
            }
        }
    }
}

/// A handle on one member of a document tree.
///
/// Cloning a `Node` clones the handle, not the node; use
/// [`Node::clone_node`] for a structural copy. Equality is identity.
#[derive(Clone)]
pub struct Node(pub(crate) Rc<NodeCell>);

impl Node {
    /// Create an unattached node owned by `owner_document`.
    ///
    /// Document nodes ignore `owner_document` and own themselves.
    pub(crate) fn new_detached(
        kind: NodeKind,
        name: String,
        value: String,
        owner_document: &WeakNode,
    ) -> Node {
        Node(Rc::new_cyclic(|this: &WeakNode| {
            let owner_document = if kind == NodeKind::Document {
                this.clone()
            } else {
                owner_document.clone()
            };
            let attributes = (kind == NodeKind::Element)
                .then(|| Attributes::new(owner_document.clone(), this.clone()));
            RefCell::new(NodeData {
                kind,
                name,
                value,
                value_modified: false,
                position: None,
                parent: None,
                owner_attributes: None,
                children: Vec::new(),
                owner_document,
                attributes,
                raw: None,
            })
        }))
    }

    pub(crate) fn downgrade(&self) -> WeakNode {
        Rc::downgrade(&self.0)
    }

    pub fn kind(&self) -> NodeKind {
        self.0.borrow().kind
    }

    /// The qualified name, e.g. `csl:style`, `#text` or a PI target.
    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    /// The part of the name after the first `:`, or the whole name.
    pub fn local_name(&self) -> String {
        let data = self.0.borrow();
        match data.name.split_once(':') {
            Some((_, local)) => local.to_string(),
            None => data.name.clone(),
        }
    }

    /// The part of the name before the first `:`, if there is one.
    pub fn prefix(&self) -> Option<String> {
        self.0
            .borrow()
            .name
            .split_once(':')
            .map(|(prefix, _)| prefix.to_string())
    }

    /// The textual payload; empty for elements, documents and fragments.
    pub fn value(&self) -> String {
        self.0.borrow().value.clone()
    }

    /// Whether [`Node::set_value`] was called since the node was created or
    /// parsed. A modified node no longer serializes from its raw source.
    pub fn is_value_modified(&self) -> bool {
        self.0.borrow().value_modified
    }

    /// Index among the parent's children, `None` while detached.
    pub fn position(&self) -> Option<usize> {
        self.0.borrow().position
    }

    pub fn parent(&self) -> Option<Node> {
        self.0
            .borrow()
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Node)
    }

    pub fn child_nodes(&self) -> Vec<Node> {
        self.0.borrow().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.borrow().children.len()
    }

    pub fn has_child_nodes(&self) -> bool {
        !self.0.borrow().children.is_empty()
    }

    pub fn first_child(&self) -> Option<Node> {
        self.0.borrow().children.first().cloned()
    }

    pub fn last_child(&self) -> Option<Node> {
        self.0.borrow().children.last().cloned()
    }

    pub fn previous_sibling(&self) -> Option<Node> {
        let parent = self.parent()?;
        let index = self.position()?.checked_sub(1)?;
        parent.0.borrow().children.get(index).cloned()
    }

    pub fn next_sibling(&self) -> Option<Node> {
        let parent = self.parent()?;
        let index = self.position()? + 1;
        parent.0.borrow().children.get(index).cloned()
    }

    /// The attribute collection; `Some` exactly for elements.
    pub fn attributes(&self) -> Option<Attributes> {
        self.0.borrow().attributes.clone()
    }

    /// The document this node was created under.
    ///
    /// Nodes refer to their document weakly, so this is `None` once every
    /// [`Document`] handle has been dropped. Keep the document alive for as
    /// long as its nodes are used; operations that need it then fail with
    /// [`DomError::InvalidState`](crate::DomError::InvalidState).
    pub fn owner_document(&self) -> Option<Document> {
        self.0
            .borrow()
            .owner_document
            .upgrade()
            .map(Document::from_rc)
    }

    /// For an attribute stored in an element's collection, that element.
    pub fn owner_element(&self) -> Option<Node> {
        let map = self
            .0
            .borrow()
            .owner_attributes
            .as_ref()
            .and_then(Weak::upgrade)?;
        Attributes::from_rc(map).owner_element()
    }

    /// The verbatim source captured by the parser, if any.
    pub fn raw_source(&self) -> Option<RawSource> {
        self.0.borrow().raw.clone()
    }

    /// The captured source spans in order; empty for nodes built in code.
    pub fn raw_spans(&self) -> Vec<String> {
        self.0
            .borrow()
            .raw
            .as_ref()
            .map(RawSource::spans)
            .unwrap_or_default()
    }

    pub(crate) fn set_raw(&self, raw: RawSource) {
        self.0.borrow_mut().raw = Some(raw);
    }

    pub(crate) fn set_end_tag(&self, end_tag: &str) {
        if let Some(RawSource::Element(raw)) = &mut self.0.borrow_mut().raw {
            raw.end_tag = Some(end_tag.to_string());
        }
    }

    pub(crate) fn mark_open_at_eof(&self) {
        if let Some(RawSource::Element(raw)) = &mut self.0.borrow_mut().raw {
            raw.open_at_eof = true;
        }
    }

    /// Rename the node.
    ///
    /// Renaming an attribute that sits in a collection re-keys it in place;
    /// an attribute already stored under the new name is dropped from the
    /// collection.
    pub fn set_name(&self, name: impl Into<String>) {
        let name = name.into();
        let (old, owner) = {
            let mut data = self.0.borrow_mut();
            let old = std::mem::replace(&mut data.name, name.clone());
            (old, data.owner_attributes.as_ref().and_then(Weak::upgrade))
        };
        if let Some(map) = owner.filter(|_| old != name) {
            Attributes::from_rc(map).rekey(&old, name);
        }
    }

    /// Replace the value and mark it modified.
    pub fn set_value(&self, value: impl Into<String>) {
        let mut data = self.0.borrow_mut();
        data.value = value.into();
        data.value_modified = true;
    }

    /// Copy this node into a new, detached node of the same document.
    ///
    /// A shallow copy has no attributes and no children. A deep copy clones
    /// the attribute collection and every descendant. Raw source is never
    /// copied, so copies always serialize canonically.
    pub fn clone_node(&self, deep: bool) -> Node {
        let owner = self.0.borrow().owner_document.clone();
        self.clone_with_owner(deep, &owner)
    }

    pub(crate) fn clone_with_owner(&self, deep: bool, owner: &WeakNode) -> Node {
        let root = self.shallow_copy(owner);
        if !deep {
            return root;
        }

        // A copied document owns its own descendants.
        let descendant_owner = if self.kind() == NodeKind::Document {
            root.downgrade()
        } else {
            owner.clone()
        };
        let mut pending = vec![(self.clone(), root.clone())];
        while let Some((source, copy)) = pending.pop() {
            let data = source.0.borrow();
            if let (Some(attributes), Some(target)) = (&data.attributes, copy.attributes()) {
                attributes.copy_into(&target, &descendant_owner);
            }
            let mut children = Vec::with_capacity(data.children.len());
            for (index, child) in data.children.iter().enumerate() {
                let child_copy = child.shallow_copy(&descendant_owner);
                {
                    let mut child_data = child_copy.0.borrow_mut();
                    child_data.parent = Some(copy.downgrade());
                    child_data.position = Some(index);
                }
                pending.push((child.clone(), child_copy.clone()));
                children.push(child_copy);
            }
            copy.0.borrow_mut().children = children;
        }
        root
    }

    /// Same kind, name and value; no attributes, children or raw source.
    pub(crate) fn shallow_copy(&self, owner: &WeakNode) -> Node {
        let data = self.0.borrow();
        let copy = Node::new_detached(data.kind, data.name.clone(), data.value.clone(), owner);
        copy.0.borrow_mut().value_modified = data.value_modified;
        copy
    }

    pub fn is_same_node(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn same_document(&self, other: &Node) -> bool {
        Weak::ptr_eq(
            &self.0.borrow().owner_document,
            &other.0.borrow().owner_document,
        )
    }

    /// Whether `self` is `other` or one of its ancestors.
    pub fn is_inclusive_ancestor_of(&self, other: &Node) -> bool {
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if node == *self {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// The text of a text, comment, CDATA or processing-instruction node.
    ///
    /// # Panics
    ///
    /// Panics when called on any other kind of node.
    pub fn data(&self) -> String {
        self.expect_character_data("data");
        self.value()
    }

    /// Replace the text of a character-data node, marking it modified.
    ///
    /// # Panics
    ///
    /// Panics when called on any other kind of node.
    pub fn set_data(&self, data: impl Into<String>) {
        self.expect_character_data("set_data");
        self.set_value(data);
    }

    /// Length of the character data, in characters.
    ///
    /// # Panics
    ///
    /// Panics when called on any other kind of node.
    pub fn length(&self) -> usize {
        self.expect_character_data("length");
        self.0.borrow().value.chars().count()
    }

    fn expect_character_data(&self, operation: &str) {
        let kind = self.kind();
        assert!(
            kind.is_character_data(),
            "{operation} is only available on character data, not on {kind:?} nodes"
        );
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(data) => f
                .debug_struct("Node")
                .field("kind", &data.kind)
                .field("name", &data.name)
                .field("value", &data.value)
                .field("position", &data.position)
                .field("children", &data.children.len())
                .finish(),
            Err(_) => f.write_str("Node(<mutably borrowed>)"),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml())
    }
}
