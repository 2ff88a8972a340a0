/*
 * attributes.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The attribute collection owned by an element.
//!
//! Entries keep their insertion order for [`Attributes::item`] while name
//! lookups go through the map index. Names are unique within a collection.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::error::{DomError, DomResult};
use crate::node::{Node, NodeKind, WeakNode};

pub(crate) type WeakAttributeMap = Weak<RefCell<AttributeMap>>;

pub(crate) struct AttributeMap {
    document: WeakNode,
    /// Empty for collections that are not attached to an element.
    element: WeakNode,
    entries: IndexMap<String, Node>,
    /// Set once an entry is inserted, replaced or removed outside parsing.
    modified: bool,
}

/// A handle on an element's attributes.
///
/// Like [`Node`], cloning the handle shares the collection; use
/// [`Attributes::duplicate`] for an independent copy.
#[derive(Clone)]
pub struct Attributes(Rc<RefCell<AttributeMap>>);

impl Attributes {
    pub(crate) fn new(document: WeakNode, element: WeakNode) -> Self {
        Attributes(Rc::new(RefCell::new(AttributeMap {
            document,
            element,
            entries: IndexMap::new(),
            modified: false,
        })))
    }

    pub(crate) fn from_rc(map: Rc<RefCell<AttributeMap>>) -> Self {
        Attributes(map)
    }

    /// Look up an attribute by qualified name.
    pub fn get(&self, name: &str) -> Option<Node> {
        self.0.borrow().entries.get(name).cloned()
    }

    /// Store `attr` under its name, returning the attribute it replaced.
    ///
    /// Replacing keeps the slot of the previous entry. Setting an attribute
    /// that is already stored in this collection is a no-op that returns it.
    ///
    /// # Errors
    ///
    /// - [`DomError::HierarchyRequest`] if `attr` is not an attribute node.
    /// - [`DomError::WrongDocument`] if `attr` belongs to another document.
    /// - [`DomError::InUseAttribute`] if `attr` is stored in another
    ///   collection.
    pub fn set(&self, attr: &Node) -> DomResult<Option<Node>> {
        let (name, owner) = {
            let data = attr.0.borrow();
            if data.kind != NodeKind::Attribute {
                return Err(DomError::HierarchyRequest);
            }
            if !Weak::ptr_eq(&data.owner_document, &self.0.borrow().document) {
                return Err(DomError::WrongDocument);
            }
            (
                data.name.clone(),
                data.owner_attributes.as_ref().and_then(Weak::upgrade),
            )
        };
        if let Some(owner) = owner {
            if Rc::ptr_eq(&owner, &self.0) {
                return Ok(Some(attr.clone()));
            }
            return Err(DomError::InUseAttribute);
        }

        let replaced = self.store(name, attr);
        self.0.borrow_mut().modified = true;
        tracing::trace!(attribute = %attr.name(), "set attribute");
        Ok(replaced)
    }

    /// Store a freshly parsed attribute without marking the collection
    /// modified. Returns the entry it displaced, if any.
    pub(crate) fn set_parsed(&self, attr: &Node) -> Option<Node> {
        let name = attr.name();
        self.store(name, attr)
    }

    fn store(&self, name: String, attr: &Node) -> Option<Node> {
        attr.0.borrow_mut().owner_attributes = Some(Rc::downgrade(&self.0));
        let replaced = self.0.borrow_mut().entries.insert(name, attr.clone());
        if let Some(old) = &replaced {
            old.0.borrow_mut().owner_attributes = None;
        }
        replaced
    }

    /// Remove the attribute stored under `name`.
    ///
    /// Later entries move down one slot.
    ///
    /// # Errors
    ///
    /// [`DomError::NotFound`] if no attribute has that name.
    pub fn remove(&self, name: &str) -> DomResult<Node> {
        let removed = self
            .0
            .borrow_mut()
            .entries
            .shift_remove(name)
            .ok_or(DomError::NotFound)?;
        removed.0.borrow_mut().owner_attributes = None;
        self.0.borrow_mut().modified = true;
        tracing::trace!(attribute = name, "removed attribute");
        Ok(removed)
    }

    /// The attribute at `index` in insertion order.
    pub fn item(&self, index: usize) -> Option<Node> {
        self.0
            .borrow()
            .entries
            .get_index(index)
            .map(|(_, attr)| attr.clone())
    }

    pub fn len(&self) -> usize {
        self.0.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().entries.is_empty()
    }

    /// All attributes in insertion order.
    pub fn nodes(&self) -> Vec<Node> {
        self.0.borrow().entries.values().cloned().collect()
    }

    /// The element owning this collection.
    pub fn owner_element(&self) -> Option<Node> {
        self.0.borrow().element.upgrade().map(Node)
    }

    /// Whether entries were inserted, replaced or removed after parsing.
    pub fn is_modified(&self) -> bool {
        self.0.borrow().modified
    }

    /// An independent collection holding copies of every attribute.
    ///
    /// The copy belongs to the same document but to no element. Attributes
    /// have no children, so `deep` only matters for API symmetry with
    /// [`Node::clone_node`].
    pub fn duplicate(&self, _deep: bool) -> Attributes {
        let document = self.0.borrow().document.clone();
        let copy = Attributes::new(document.clone(), Weak::new());
        self.copy_into(&copy, &document);
        copy.0.borrow_mut().modified = self.is_modified();
        copy
    }

    pub(crate) fn copy_into(&self, target: &Attributes, owner: &WeakNode) {
        for attr in self.nodes() {
            let attr_copy = attr.shallow_copy(owner);
            target.store(attr_copy.name(), &attr_copy);
        }
    }

    /// Move the entry stored under `old` to `new`, keeping its slot.
    pub(crate) fn rekey(&self, old: &str, new: String) {
        let displaced = {
            let mut map = self.0.borrow_mut();
            let Some(index) = map.entries.get_index_of(old) else {
                return;
            };
            let Some((_, attr)) = map.entries.shift_remove_index(index) else {
                return;
            };
            let displaced = map.entries.shift_remove(&new);
            let index = index.min(map.entries.len());
            map.entries.shift_insert(index, new, attr);
            map.modified = true;
            displaced
        };
        if let Some(displaced) = displaced {
            displaced.0.borrow_mut().owner_attributes = None;
        }
    }

    pub(crate) fn check_consistency(&self) -> Result<(), String> {
        let map = self.0.borrow();
        for (name, attr) in &map.entries {
            let data = attr.0.borrow();
            if data.kind != NodeKind::Attribute {
                return Err(format!("attribute slot '{name}' holds a {:?} node", data.kind));
            }
            if &data.name != name {
                return Err(format!("attribute '{}' is stored under '{name}'", data.name));
            }
            let owned_here = data
                .owner_attributes
                .as_ref()
                .is_some_and(|owner| owner.as_ptr() == Rc::as_ptr(&self.0));
            if !owned_here {
                return Err(format!("attribute '{name}' does not point back at its collection"));
            }
            if !Weak::ptr_eq(&data.owner_document, &map.document) {
                return Err(format!("attribute '{name}' belongs to another document"));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(map) => f.debug_list().entries(map.entries.keys()).finish(),
            Err(_) => f.write_str("Attributes(<mutably borrowed>)"),
        }
    }
}
