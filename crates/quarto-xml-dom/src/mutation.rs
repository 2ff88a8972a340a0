/*
 * mutation.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Attaching and detaching children.
//!
//! Every operation validates fully before touching the tree, so an `Err`
//! always leaves the tree exactly as it was. A node that already has a parent
//! is silently moved: it is detached from its old parent first.

use std::rc::{Rc, Weak};

use crate::error::{DomError, DomResult};
use crate::node::{Node, NodeKind};

impl Node {
    /// Append `new_child` as the last child, returning it.
    ///
    /// A document fragment contributes its children in order and ends up
    /// empty.
    ///
    /// # Errors
    ///
    /// - [`DomError::WrongDocument`] if `new_child` belongs to another
    ///   document.
    /// - [`DomError::HierarchyRequest`] if `self` cannot have children,
    ///   `new_child` is an attribute or document, or `new_child` is `self` or
    ///   one of its ancestors.
    pub fn append_child(&self, new_child: &Node) -> DomResult<Node> {
        self.check_attach(new_child)?;
        let nodes = new_child.take_for_insertion();
        let index = self.child_count();
        tracing::trace!(parent = %self.name(), child = %new_child.name(), index, "append child");
        self.splice_children(index, nodes);
        self.debug_check();
        Ok(new_child.clone())
    }

    /// Insert `new_child` immediately before `reference`, or append it when
    /// `reference` is `None`. Returns `new_child`.
    ///
    /// # Errors
    ///
    /// [`DomError::NotFound`] if `reference` is not a child of `self`;
    /// otherwise as [`Node::append_child`].
    pub fn insert_before(&self, new_child: &Node, reference: Option<&Node>) -> DomResult<Node> {
        let Some(reference) = reference else {
            return self.append_child(new_child);
        };
        let mut index = self.child_index(reference).ok_or(DomError::NotFound)?;
        self.check_attach(new_child)?;
        if new_child == reference {
            return Ok(new_child.clone());
        }
        if self.child_index(new_child).is_some_and(|current| current < index) {
            index -= 1;
        }

        let nodes = new_child.take_for_insertion();
        tracing::trace!(parent = %self.name(), child = %new_child.name(), index, "insert child");
        self.splice_children(index, nodes);
        self.debug_check();
        Ok(new_child.clone())
    }

    /// Put `new_child` in the slot held by `old_child`, returning the now
    /// detached `old_child`.
    ///
    /// # Errors
    ///
    /// - [`DomError::HierarchyRequest`] if `new_child` is a document
    ///   fragment.
    /// - [`DomError::NotFound`] if `old_child` is not a child of `self`.
    /// - Otherwise as [`Node::append_child`].
    pub fn replace_child(&self, new_child: &Node, old_child: &Node) -> DomResult<Node> {
        if new_child.kind() == NodeKind::DocumentFragment {
            return Err(DomError::HierarchyRequest);
        }
        let mut index = self.child_index(old_child).ok_or(DomError::NotFound)?;
        self.check_attach(new_child)?;
        if new_child == old_child {
            return Ok(old_child.clone());
        }
        if self.child_index(new_child).is_some_and(|current| current < index) {
            index -= 1;
        }

        new_child.detach();
        let removed = self.remove_at(index);
        tracing::trace!(parent = %self.name(), old = %removed.name(), new = %new_child.name(), index, "replace child");
        self.splice_children(index, vec![new_child.clone()]);
        self.debug_check();
        Ok(removed)
    }

    /// Detach `old_child` from `self` and return it.
    ///
    /// # Errors
    ///
    /// [`DomError::NotFound`] if `old_child` is not a child of `self`.
    pub fn remove_child(&self, old_child: &Node) -> DomResult<Node> {
        let index = self.child_index(old_child).ok_or(DomError::NotFound)?;
        tracing::trace!(parent = %self.name(), child = %old_child.name(), index, "remove child");
        let removed = self.remove_at(index);
        self.debug_check();
        Ok(removed)
    }

    fn check_attach(&self, child: &Node) -> DomResult<()> {
        if !self.same_document(child) {
            return Err(DomError::WrongDocument);
        }
        if !self.kind().can_have_children()
            || matches!(child.kind(), NodeKind::Attribute | NodeKind::Document)
        {
            return Err(DomError::HierarchyRequest);
        }
        // A childless node can only be its own ancestor.
        let cycle = if child.has_child_nodes() {
            child.is_inclusive_ancestor_of(self)
        } else {
            child == self
        };
        if cycle {
            return Err(DomError::HierarchyRequest);
        }
        Ok(())
    }

    /// The index of `child` among our children, checked against both its
    /// parent link and our child slot.
    pub(crate) fn child_index(&self, child: &Node) -> Option<usize> {
        let index = child.position()?;
        if child.parent()? != *self {
            return None;
        }
        let data = self.0.borrow();
        (data.children.get(index) == Some(child)).then_some(index)
    }

    /// Remove this node from its parent, if it has one.
    pub(crate) fn detach(&self) {
        let Some(parent) = self.parent() else {
            return;
        };
        if let Some(index) = parent.child_index(self) {
            parent.remove_at(index);
            parent.debug_check();
        }
    }

    /// The nodes an insertion of `self` actually places: the children of a
    /// fragment, or the node itself.
    fn take_for_insertion(&self) -> Vec<Node> {
        if self.kind() == NodeKind::DocumentFragment {
            self.take_children()
        } else {
            self.detach();
            vec![self.clone()]
        }
    }

    /// Detach every child, returning them in order.
    pub(crate) fn take_children(&self) -> Vec<Node> {
        let children = std::mem::take(&mut self.0.borrow_mut().children);
        for child in &children {
            let mut data = child.0.borrow_mut();
            data.parent = None;
            data.position = None;
        }
        children
    }

    fn remove_at(&self, index: usize) -> Node {
        let removed = self.0.borrow_mut().children.remove(index);
        {
            let mut data = removed.0.borrow_mut();
            data.parent = None;
            data.position = None;
        }
        self.renumber_from(index);
        removed
    }

    fn splice_children(&self, index: usize, nodes: Vec<Node>) {
        for node in &nodes {
            node.0.borrow_mut().parent = Some(self.downgrade());
        }
        {
            let children = &mut self.0.borrow_mut().children;
            let tail = children.split_off(index);
            children.extend(nodes);
            children.extend(tail);
        }
        self.renumber_from(index);
    }

    fn renumber_from(&self, start: usize) {
        let data = self.0.borrow();
        for (index, child) in data.children.iter().enumerate().skip(start) {
            child.0.borrow_mut().position = Some(index);
        }
    }

    #[cfg(debug_assertions)]
    fn debug_check(&self) {
        if let Err(message) = self.check_children() {
            panic!("tree invariant violated under {}: {message}", self.name());
        }
    }

    #[cfg(not(debug_assertions))]
    fn debug_check(&self) {}

    /// Walk this subtree and report the first broken structural invariant:
    /// parent links, positions, sibling navigation, owner documents and
    /// attribute ownership.
    pub fn check_consistency(&self) -> Result<(), String> {
        let mut pending = vec![self.clone()];
        while let Some(node) = pending.pop() {
            node.check_children()?;
            pending.extend(node.child_nodes());
        }
        Ok(())
    }

    fn check_children(&self) -> Result<(), String> {
        let data = self.0.borrow();
        if let Some(attributes) = &data.attributes {
            attributes.check_consistency()?;
        }
        if !data.kind.can_have_children() && !data.children.is_empty() {
            return Err(format!("{:?} node has children", data.kind));
        }
        for (index, child) in data.children.iter().enumerate() {
            {
                let child_data = child.0.borrow();
                if child_data.position != Some(index) {
                    return Err(format!(
                        "child {index} records position {:?}",
                        child_data.position
                    ));
                }
                let linked = child_data
                    .parent
                    .as_ref()
                    .is_some_and(|parent| parent.as_ptr() == Rc::as_ptr(&self.0));
                if !linked {
                    return Err(format!("child {index} does not point back at its parent"));
                }
                if !Weak::ptr_eq(&child_data.owner_document, &data.owner_document) {
                    return Err(format!("child {index} belongs to another document"));
                }
            }
            let expected_previous = index.checked_sub(1).map(|i| &data.children[i]);
            if child.previous_sibling().as_ref() != expected_previous {
                return Err(format!("previous sibling of child {index} is wrong"));
            }
            if child.next_sibling().as_ref() != data.children.get(index + 1) {
                return Err(format!("next sibling of child {index} is wrong"));
            }
        }
        Ok(())
    }
}
