/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Mutable, format-preserving XML documents for Quarto.
//!
//! This crate parses XML into a tree of [`Node`]s that can be edited in
//! place and written back out. Every part of the document that was not
//! touched is reproduced byte for byte, including whitespace, quote style
//! and self-closing notation; only modified parts are re-rendered.
//!
//! # Overview
//!
//! The main types are:
//! - [`Document`]: the root of a tree and the factory for new nodes
//! - [`Node`]: a shared handle on one member of the tree
//! - [`Attributes`]: the ordered attribute collection of an element
//! - [`NodeNavigator`]: a read-only cursor for query engines
//!
//! # Example
//!
//! ```rust
//! use quarto_xml_dom::parse;
//!
//! let doc = parse(r#"<style version='1.0'>
//!   <macro name="author"/>
//! </style>"#).unwrap();
//!
//! let style = doc.document_element().unwrap();
//! let text = doc.create_element("text").unwrap();
//! text.set_attribute("variable", "author").unwrap();
//! let macro_element = style.child_nodes()[1].clone();
//! macro_element.append_child(&text).unwrap();
//!
//! assert_eq!(
//!     doc.to_xml(),
//!     r#"<style version='1.0'>
//!   <macro name="author"><text variable="author"/></macro>
//! </style>"#
//! );
//! ```
//!
//! # Recovery
//!
//! Malformed nesting does not fail the parse. An end tag that closes an
//! outer element closes the inner ones implicitly, moving their children up
//! a level; see [`ParseOptions`] for the alternatives and
//! [`parse_with_context`] for the diagnostics.
//!
//! # Lifetimes
//!
//! The tree uses `Rc` and `RefCell` and is meant for one thread at a time.
//! A parent owns its children, while every node refers to its [`Document`]
//! weakly. Keep the `Document` alive while working with its nodes: once it
//! is dropped, its top-level nodes are detached, [`Node::owner_document`]
//! returns `None`, and operations that create nodes fail with
//! [`DomError::InvalidState`].

pub mod attributes;
pub mod context;
pub mod document;
mod element;
pub mod error;
mod mutation;
pub mod navigator;
pub mod node;
pub mod options;
pub mod parser;
pub mod raw;
mod serialize;
mod start_tag;

// Re-export main types
pub use attributes::Attributes;
pub use context::{DiagnosticKind, ParseDiagnostic, XmlParseContext};
pub use document::Document;
pub use error::{DomError, DomResult, Error, Result};
pub use navigator::{NavigatorNodeType, NodeNavigator};
pub use node::{Node, NodeKind};
pub use options::{ParseOptions, UnmatchedEndTagPolicy};
pub use parser::{parse, parse_bytes, parse_reader, parse_with_context, parse_with_options};
pub use raw::{AttributeRaw, ElementRaw, RawSource};
