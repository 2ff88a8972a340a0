/*
 * context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Context for XML parsing with diagnostic collection.

use std::fmt;

use crate::options::ParseOptions;

/// What kind of recovery a diagnostic reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// An end tag closed one or more inner elements implicitly.
    MismatchedEndTag,
    /// An end tag matched no open element and was kept as text.
    UnmatchedEndTag,
    /// An element was still open at the end of input.
    UnclosedElement,
    /// A start tag repeated an attribute name; the later value won.
    DuplicateAttribute,
    /// Text or an attribute value held an undecodable entity and was kept
    /// as written.
    UndecodedText,
}

/// A recovery the parser performed instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// Byte offset of the offending token.
    pub position: usize,
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte {}", self.message, self.position)
    }
}

/// Context for XML parsing that collects diagnostics.
///
/// Diagnostics are accumulated during parsing and can be retrieved
/// afterwards, so callers see every recovery even on a successful parse.
///
/// # Example
///
/// ```rust
/// use quarto_xml_dom::{parse_with_context, XmlParseContext};
///
/// let mut ctx = XmlParseContext::new();
/// let doc = parse_with_context("<a><b></a>", &mut ctx).unwrap();
/// assert_eq!(doc.to_xml(), "<a><b></a>");
/// for diag in ctx.diagnostics() {
///     eprintln!("Warning: {diag}");
/// }
/// assert!(ctx.has_diagnostics());
/// ```
#[derive(Debug, Default)]
pub struct XmlParseContext {
    options: ParseOptions,

    /// Accumulated diagnostics.
    diagnostics: Vec<ParseDiagnostic>,
}

impl XmlParseContext {
    /// Create a new XML parse context with default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            diagnostics: Vec::new(),
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Add a diagnostic to the context.
    pub fn add_diagnostic(&mut self, diagnostic: ParseDiagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Check if any diagnostics have been collected.
    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Get all collected diagnostics.
    pub fn diagnostics(&self) -> &[ParseDiagnostic] {
        &self.diagnostics
    }

    /// Take all collected diagnostics, leaving the context empty.
    pub fn take_diagnostics(&mut self) -> Vec<ParseDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_diagnostics_empties_context() {
        let mut ctx = XmlParseContext::new();
        ctx.add_diagnostic(ParseDiagnostic {
            kind: DiagnosticKind::UnclosedElement,
            message: "element <a> is never closed".to_string(),
            position: 0,
        });
        assert!(ctx.has_diagnostics());
        assert_eq!(
            ctx.diagnostics()[0].to_string(),
            "element <a> is never closed at byte 0"
        );

        let taken = ctx.take_diagnostics();
        assert_eq!(taken.len(), 1);
        assert!(!ctx.has_diagnostics());
    }
}
