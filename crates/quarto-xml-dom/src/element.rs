/*
 * element.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Attribute conveniences on element nodes.

use crate::attributes::Attributes;
use crate::error::{DomError, DomResult};
use crate::node::Node;

impl Node {
    fn element_attributes(&self, operation: &str) -> Attributes {
        match self.attributes() {
            Some(attributes) => attributes,
            None => panic!(
                "{operation} is only available on elements, not on {:?} nodes",
                self.kind()
            ),
        }
    }

    /// The element's qualified name.
    ///
    /// # Panics
    ///
    /// Panics when called on a node that is not an element.
    pub fn tag_name(&self) -> String {
        self.element_attributes("tag_name");
        self.name()
    }

    /// The value of the named attribute, or `None` when it is absent.
    ///
    /// # Panics
    ///
    /// Panics when called on a node that is not an element.
    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.element_attributes("get_attribute")
            .get(name)
            .map(|attr| attr.value())
    }

    /// Set the named attribute, creating it when absent.
    ///
    /// An existing attribute keeps its slot and only has its value replaced.
    ///
    /// # Errors
    ///
    /// - [`DomError::InvalidCharacter`] if a new attribute would get an
    ///   invalid name.
    /// - [`DomError::InvalidState`] if a new attribute is needed but the
    ///   owner document has been dropped.
    ///
    /// # Panics
    ///
    /// Panics when called on a node that is not an element.
    pub fn set_attribute(&self, name: &str, value: &str) -> DomResult<()> {
        let attributes = self.element_attributes("set_attribute");
        if let Some(existing) = attributes.get(name) {
            existing.set_value(value);
            return Ok(());
        }
        let document = self.owner_document().ok_or(DomError::InvalidState)?;
        let attr = document.create_attribute(name)?;
        attr.set_value(value);
        attributes.set(&attr)?;
        Ok(())
    }

    /// # Errors
    ///
    /// [`DomError::NotFound`] if the element has no attribute by that name.
    ///
    /// # Panics
    ///
    /// Panics when called on a node that is not an element.
    pub fn remove_attribute(&self, name: &str) -> DomResult<Node> {
        self.element_attributes("remove_attribute").remove(name)
    }

    /// # Panics
    ///
    /// Panics when called on a node that is not an element.
    pub fn get_attribute_node(&self, name: &str) -> Option<Node> {
        self.element_attributes("get_attribute_node").get(name)
    }

    /// Store an attribute node, returning the one it replaced.
    ///
    /// # Errors
    ///
    /// See [`Attributes::set`].
    ///
    /// # Panics
    ///
    /// Panics when called on a node that is not an element.
    pub fn set_attribute_node(&self, attr: &Node) -> DomResult<Option<Node>> {
        self.element_attributes("set_attribute_node").set(attr)
    }

    /// Remove `attr` from this element.
    ///
    /// # Errors
    ///
    /// [`DomError::NotFound`] unless `attr` is the node stored under its
    /// name on this element.
    ///
    /// # Panics
    ///
    /// Panics when called on a node that is not an element.
    pub fn remove_attribute_node(&self, attr: &Node) -> DomResult<Node> {
        let attributes = self.element_attributes("remove_attribute_node");
        let name = attr.name();
        match attributes.get(&name) {
            Some(stored) if stored == *attr => attributes.remove(&name),
            _ => Err(DomError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Document, DomError};

    #[test]
    fn test_set_attribute_creates_then_updates() {
        let doc = Document::new();
        let element = doc.create_element("style").unwrap();
        element.set_attribute("class", "in-text").unwrap();
        element.set_attribute("version", "1.0").unwrap();
        element.set_attribute("class", "note").unwrap();

        assert_eq!(element.get_attribute("class").as_deref(), Some("note"));
        let attributes = element.attributes().unwrap();
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes.item(0).unwrap().name(), "class");
        assert_eq!(element.get_attribute("missing"), None);
    }

    #[test]
    fn test_remove_attribute() {
        let doc = Document::new();
        let element = doc.create_element("a").unwrap();
        element.set_attribute("x", "1").unwrap();
        let removed = element.remove_attribute("x").unwrap();
        assert_eq!(removed.value(), "1");
        assert_eq!(element.remove_attribute("x"), Err(DomError::NotFound));
    }

    #[test]
    fn test_attribute_node_round_trip() {
        let doc = Document::new();
        let element = doc.create_element("a").unwrap();
        let attr = doc.create_attribute("x").unwrap();
        attr.set_value("1");

        assert_eq!(element.set_attribute_node(&attr), Ok(None));
        assert_eq!(element.get_attribute_node("x").unwrap(), attr);
        assert_eq!(attr.owner_element().unwrap(), element);

        let impostor = doc.create_attribute("x").unwrap();
        assert_eq!(
            element.remove_attribute_node(&impostor),
            Err(DomError::NotFound)
        );
        assert_eq!(element.remove_attribute_node(&attr), Ok(attr.clone()));
        assert!(attr.owner_element().is_none());
    }

    #[test]
    fn test_set_attribute_with_invalid_name() {
        let doc = Document::new();
        let element = doc.create_element("a").unwrap();
        assert_eq!(
            element.set_attribute("bad name", "1"),
            Err(DomError::InvalidCharacter)
        );
        assert!(element.attributes().unwrap().is_empty());
    }

    #[test]
    fn test_set_attribute_after_document_dropped() {
        let root = crate::parse(r#"<a y="1"/>"#)
            .unwrap()
            .document_element()
            .unwrap();
        assert!(root.owner_document().is_none());
        assert!(root.parent().is_none());

        assert_eq!(
            root.set_attribute("x", "1"),
            Err(DomError::InvalidState)
        );
        assert_eq!(root.get_attribute("x"), None);

        // Existing attributes need no document.
        root.set_attribute("y", "2").unwrap();
        assert_eq!(root.get_attribute("y").as_deref(), Some("2"));
    }

    #[test]
    #[should_panic(expected = "only available on elements")]
    fn test_attribute_access_on_text_panics() {
        let doc = Document::new();
        doc.create_text_node("t").get_attribute("x");
    }
}
