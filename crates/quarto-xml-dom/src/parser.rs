/*
 * parser.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Format-preserving XML parser that builds a [`Document`].

use std::io::Read;

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::Event;

use crate::context::{DiagnosticKind, ParseDiagnostic, XmlParseContext};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::node::{Node, NodeKind};
use crate::options::{ParseOptions, UnmatchedEndTagPolicy};
use crate::raw::{AttributeRaw, ElementRaw, RawSource};
use crate::start_tag::StartTag;

/// Parse XML text into a document, recovering from malformed nesting.
///
/// # Example
///
/// ```rust
/// use quarto_xml_dom::parse;
///
/// let source = "<style version='1.0'>\n  <info/>\n</style>";
/// let doc = parse(source).unwrap();
/// let root = doc.document_element().unwrap();
/// assert_eq!(root.get_attribute("version").as_deref(), Some("1.0"));
/// assert_eq!(doc.to_xml(), source);
/// ```
///
/// # Errors
///
/// Returns an error only for input the tokenizer cannot get past, such as an
/// unterminated comment or CDATA section, or a `<` with no `>` after it. A
/// stray `<` that is followed by a `>` somewhere later is read as a start
/// tag, which then goes through the usual nesting recovery.
pub fn parse(content: &str) -> Result<Document> {
    parse_with_options(content, &ParseOptions::default())
}

/// Parse UTF-8 encoded XML bytes.
///
/// # Errors
///
/// As [`parse`], plus [`Error::InvalidUtf8`].
pub fn parse_bytes(bytes: &[u8]) -> Result<Document> {
    parse(std::str::from_utf8(bytes)?)
}

/// Read a stream to its end and parse it.
///
/// # Errors
///
/// As [`parse_bytes`], plus [`Error::Io`] when reading fails.
pub fn parse_reader<R: Read>(mut reader: R) -> Result<Document> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;
    parse_bytes(&buffer)
}

/// Parse with explicit options.
///
/// # Errors
///
/// As [`parse`]. With `recover` disabled, malformed nesting is reported as
/// [`Error::MismatchedEndTag`], [`Error::InvalidStructure`] or
/// [`Error::UnexpectedEof`].
pub fn parse_with_options(content: &str, options: &ParseOptions) -> Result<Document> {
    let mut ctx = XmlParseContext::with_options(options.clone());
    parse_with_context(content, &mut ctx)
}

/// Parse using the context's options, recording every recovery in it.
///
/// Diagnostics gathered before a failure are kept in the context.
///
/// # Errors
///
/// As [`parse_with_options`].
pub fn parse_with_context(content: &str, ctx: &mut XmlParseContext) -> Result<Document> {
    let mut parser = XmlParser::new(content, ctx.options().clone());
    let result = parser.parse();
    for diagnostic in parser.diagnostics {
        ctx.add_diagnostic(diagnostic);
    }
    result
}

/// Internal parser state.
struct XmlParser<'a> {
    /// The source content being parsed, without its byte order mark.
    source: &'a str,

    /// The byte order mark, if the input started with one.
    bom: &'a str,

    /// The quick-xml reader.
    reader: Reader<&'a [u8]>,

    options: ParseOptions,

    document: Document,

    /// Elements whose end tag has not been seen yet, innermost last.
    open: Vec<Node>,

    diagnostics: Vec<ParseDiagnostic>,
}

impl<'a> XmlParser<'a> {
    fn new(input: &'a str, options: ParseOptions) -> Self {
        let (bom, source) = match input.strip_prefix('\u{feff}') {
            Some(rest) => (&input[..input.len() - rest.len()], rest),
            None => ("", input),
        };
        let mut reader = Reader::from_str(source);
        let config = reader.config_mut();
        config.trim_text_start = false;
        config.trim_text_end = false;
        config.check_end_names = false;
        config.allow_unmatched_ends = true;

        Self {
            source,
            bom,
            reader,
            options,
            document: Document::new(),
            open: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn parse(&mut self) -> Result<Document> {
        let source = self.source;
        // Offsets are reported against the input, byte order mark included.
        let base = self.bom.len();
        if !self.bom.is_empty() {
            let bom = self.bom;
            self.add_leaf(NodeKind::Text, "#text", bom, bom)?;
        }

        loop {
            // Capture position before reading the event
            let event_start = self.reader.buffer_position() as usize;
            let event = match self.reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    return Err(Error::XmlSyntax {
                        message: e.to_string(),
                        position: Some(self.reader.error_position() + base as u64),
                    });
                }
            };
            let event_end = self.reader.buffer_position() as usize;
            let raw = source.get(event_start..event_end).unwrap_or_default();
            let position = base + event_start;

            match event {
                Event::Start(_) => self.handle_start(raw, position, false)?,
                Event::Empty(_) => self.handle_start(raw, position, true)?,
                Event::End(_) => self.handle_end(raw, position)?,
                Event::Text(_) => {
                    tracing::trace!(position, "text");
                    let value = self.decode(raw, position);
                    self.add_leaf(NodeKind::Text, "#text", &value, raw)?;
                }
                Event::CData(_) => {
                    let value = strip_delimiters(raw, "<![CDATA[", "]]>");
                    self.add_leaf(NodeKind::CDataSection, "#cdata-section", value, raw)?;
                }
                Event::Comment(_) => {
                    let value = strip_delimiters(raw, "<!--", "-->");
                    self.add_leaf(NodeKind::Comment, "#comment", value, raw)?;
                }
                Event::Decl(_) | Event::PI(_) => {
                    let inner = strip_delimiters(raw, "<?", "?>");
                    let (target, data) = match inner.split_once(|c: char| c.is_whitespace()) {
                        Some((target, data)) => (target, data.trim_start()),
                        None => (inner, ""),
                    };
                    self.add_leaf(NodeKind::ProcessingInstruction, target, data, raw)?;
                }
                Event::DocType(_) => {
                    let value = strip_delimiters(raw, "<!", ">");
                    self.add_leaf(NodeKind::DocumentType, "#document-type", value, raw)?;
                }
                Event::Eof => break,
            }
        }

        self.finish()?;
        tracing::debug!(
            bytes = base + self.source.len(),
            top_level = self.document.child_count(),
            diagnostics = self.diagnostics.len(),
            "parsed XML document"
        );
        Ok(self.document.clone())
    }

    /// The node new content is appended to.
    fn current_parent(&self) -> Node {
        match self.open.last() {
            Some(element) => element.clone(),
            None => self.document.as_node().clone(),
        }
    }

    fn add_leaf(&mut self, kind: NodeKind, name: &str, value: &str, raw: &str) -> Result<()> {
        let node = self.document.create(kind, name, value);
        node.set_raw(RawSource::Verbatim(raw.to_string()));
        self.current_parent().append_child(&node)?;
        Ok(())
    }

    fn handle_start(&mut self, raw: &str, position: usize, self_closing: bool) -> Result<()> {
        let tag = StartTag::lex(raw);
        tracing::trace!(name = tag.name, position, self_closing, "start tag");

        let element = self.document.create(NodeKind::Element, tag.name, "");
        if let Some(attributes) = element.attributes() {
            for span in &tag.attributes {
                let value = self.decode(span.value, position);
                let attr = self.document.create(NodeKind::Attribute, span.name, &value);
                attr.set_raw(RawSource::Attribute(AttributeRaw {
                    leading: span.leading.to_string(),
                    name: span.name.to_string(),
                    equals_and_open_quote: span.equals_and_open_quote.to_string(),
                    value: span.value.to_string(),
                    close_quote: span.close_quote.to_string(),
                }));
                if attributes.set_parsed(&attr).is_some() {
                    self.record(
                        DiagnosticKind::DuplicateAttribute,
                        format!(
                            "attribute '{}' repeated on <{}>, keeping the last value",
                            span.name, tag.name
                        ),
                        position,
                    );
                }
            }
        }
        element.set_raw(RawSource::Element(ElementRaw {
            before_name: tag.before_name.to_string(),
            name: tag.name.to_string(),
            tag_close: tag.tag_close.to_string(),
            end_tag: None,
            self_closing,
            open_at_eof: false,
        }));

        self.current_parent().append_child(&element)?;
        if !self_closing {
            self.open.push(element);
        }
        Ok(())
    }

    fn handle_end(&mut self, raw: &str, position: usize) -> Result<()> {
        let name = strip_delimiters(raw, "</", ">").trim();
        tracing::trace!(name, position, "end tag");

        let Some(index) = self.open.iter().rposition(|element| element.name() == name) else {
            return self.handle_unmatched_end(name, raw, position);
        };

        let innermost = self.open.len() - 1;
        if index != innermost {
            if !self.options.recover {
                return Err(Error::MismatchedEndTag {
                    expected: self.open[innermost].name(),
                    found: name.to_string(),
                    position: position as u64,
                });
            }
            while self.open.len() > index + 1 {
                if let Some(element) = self.open.pop() {
                    self.record(
                        DiagnosticKind::MismatchedEndTag,
                        format!("</{name}> closes <{}> implicitly", element.name()),
                        position,
                    );
                    close_implicitly(&element)?;
                }
            }
        }
        if let Some(element) = self.open.pop() {
            element.set_end_tag(raw);
        }
        Ok(())
    }

    /// The end tag is kept in place as an empty text node carrying its raw
    /// text, so the document still serializes to its source.
    fn handle_unmatched_end(&mut self, name: &str, raw: &str, position: usize) -> Result<()> {
        if !self.options.recover {
            return Err(Error::InvalidStructure {
                message: format!("Unexpected closing tag </{name}>"),
                position: position as u64,
            });
        }
        self.record(
            DiagnosticKind::UnmatchedEndTag,
            format!("</{name}> matches no open element and is kept as text"),
            position,
        );
        if self.options.unmatched_end_tag == UnmatchedEndTagPolicy::CloseToRoot {
            while let Some(element) = self.open.pop() {
                close_implicitly(&element)?;
            }
        }
        self.add_leaf(NodeKind::Text, "#text", "", raw)
    }

    /// Elements still open at the end of input keep their children and get
    /// no end tag.
    fn finish(&mut self) -> Result<()> {
        if let Some(element) = self.open.last().filter(|_| !self.options.recover) {
            return Err(Error::UnexpectedEof {
                expected: format!("closing tag </{}>", element.name()),
            });
        }
        let unclosed: Vec<Node> = self.open.drain(..).collect();
        let end = self.bom.len() + self.source.len();
        for element in unclosed {
            element.mark_open_at_eof();
            self.record(
                DiagnosticKind::UnclosedElement,
                format!("<{}> is never closed", element.name()),
                end,
            );
        }
        Ok(())
    }

    /// Entity-decode text, keeping it as written when it cannot be decoded.
    fn decode(&mut self, raw: &str, position: usize) -> String {
        match unescape(raw) {
            Ok(decoded) => decoded.into_owned(),
            Err(err) => {
                self.record(
                    DiagnosticKind::UndecodedText,
                    format!("kept text as written: {err}"),
                    position,
                );
                raw.to_string()
            }
        }
    }

    fn record(&mut self, kind: DiagnosticKind, message: String, position: usize) {
        tracing::warn!(?kind, position, "{message}");
        self.diagnostics.push(ParseDiagnostic {
            kind,
            message,
            position,
        });
    }
}

/// Close an element without an end tag, hoisting its children to just
/// after it in its parent.
fn close_implicitly(element: &Node) -> Result<()> {
    let Some(parent) = element.parent() else {
        return Ok(());
    };
    for child in element.take_children() {
        parent.append_child(&child)?;
    }
    Ok(())
}

fn strip_delimiters<'s>(raw: &'s str, open: &str, close: &str) -> &'s str {
    let inner = raw.strip_prefix(open).unwrap_or(raw);
    inner.strip_suffix(close).unwrap_or(inner)
}
