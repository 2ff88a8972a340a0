/*
 * raw.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Verbatim source text captured by the parser.
//!
//! A node parsed from text keeps the exact substrings it was built from so
//! the serializer can reproduce them byte for byte. An end tag that matched
//! no open element is kept as an empty text node whose raw span is the tag. Nodes created through the
//! construction API (or by cloning) carry no raw source and are always
//! rendered canonically.

/// The verbatim pieces of a start tag and its matching end tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRaw {
    /// Everything before the tag name, normally just `<`.
    pub before_name: String,

    /// The tag name exactly as written.
    pub name: String,

    /// Whitespace after the last attribute plus `>` or `/>`.
    pub tag_close: String,

    /// The end tag as written (`</name >`), if the source had one.
    ///
    /// `None` for self-closing elements and for elements that were closed
    /// implicitly during recovery.
    pub end_tag: Option<String>,

    /// Whether the start tag was written as `<name/>`.
    pub self_closing: bool,

    /// The input ended while this element was open, so everything after its
    /// start tag was parsed into it.
    pub open_at_eof: bool,
}

/// The verbatim pieces of one attribute inside a start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRaw {
    /// Whitespace preceding the attribute name.
    pub leading: String,

    /// The attribute name exactly as written.
    pub name: String,

    /// Spacing around `=` plus the opening quote, if any.
    pub equals_and_open_quote: String,

    /// The value as written, entities left encoded.
    pub value: String,

    /// The closing quote, empty for bare values.
    pub close_quote: String,
}

/// Raw source captured for a single node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSource {
    Element(ElementRaw),
    Attribute(AttributeRaw),
    /// Text, comments, CDATA sections, processing instructions and
    /// document type declarations are kept as one span.
    Verbatim(String),
}

impl RawSource {
    /// The captured spans in source order.
    ///
    /// Elements yield `[before_name, name, tag_close]` followed by the end
    /// tag when one was captured; attributes yield their five pieces.
    pub fn spans(&self) -> Vec<String> {
        match self {
            RawSource::Element(raw) => {
                let mut spans = vec![
                    raw.before_name.clone(),
                    raw.name.clone(),
                    raw.tag_close.clone(),
                ];
                if let Some(end_tag) = &raw.end_tag {
                    spans.push(end_tag.clone());
                }
                spans
            }
            RawSource::Attribute(raw) => vec![
                raw.leading.clone(),
                raw.name.clone(),
                raw.equals_and_open_quote.clone(),
                raw.value.clone(),
                raw.close_quote.clone(),
            ],
            RawSource::Verbatim(text) => vec![text.clone()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_spans_include_end_tag() {
        let raw = RawSource::Element(ElementRaw {
            before_name: "<".to_string(),
            name: "a".to_string(),
            tag_close: " >".to_string(),
            end_tag: Some("</a >".to_string()),
            self_closing: false,
            open_at_eof: false,
        });
        assert_eq!(raw.spans(), vec!["<", "a", " >", "</a >"]);
    }

    #[test]
    fn test_self_closing_spans() {
        let raw = RawSource::Element(ElementRaw {
            before_name: "<".to_string(),
            name: "br".to_string(),
            tag_close: "/>".to_string(),
            end_tag: None,
            self_closing: true,
            open_at_eof: false,
        });
        assert_eq!(raw.spans(), vec!["<", "br", "/>"]);
    }
}
