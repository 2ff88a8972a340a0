/*
 * start_tag.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Lexer for the raw text of a start tag.
//!
//! quick-xml finds where a tag begins and ends; this lexer splits the tag's
//! text into pieces without normalizing anything. Concatenating every piece
//! in order always gives back the input. Quoted, bare and valueless
//! attributes are all accepted.

/// The pieces of one attribute, as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AttributeSpan<'a> {
    pub leading: &'a str,
    pub name: &'a str,
    /// Spacing around `=` and the opening quote; empty for valueless
    /// attributes.
    pub equals_and_open_quote: &'a str,
    pub value: &'a str,
    /// Empty for bare values and unterminated quotes.
    pub close_quote: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StartTag<'a> {
    pub before_name: &'a str,
    pub name: &'a str,
    pub attributes: Vec<AttributeSpan<'a>>,
    /// Trailing whitespace plus `>` or `/>`.
    pub tag_close: &'a str,
}

fn is_space(b: u8) -> bool {
    b.is_ascii_whitespace()
}

impl<'a> StartTag<'a> {
    pub(crate) fn lex(raw: &'a str) -> StartTag<'a> {
        let bytes = raw.as_bytes();
        let mut pos = 0;
        if bytes.first() == Some(&b'<') {
            pos = 1;
        }
        while pos < bytes.len() && is_space(bytes[pos]) {
            pos += 1;
        }
        let before_name = &raw[..pos];

        let name_start = pos;
        while pos < bytes.len() && !is_space(bytes[pos]) && !matches!(bytes[pos], b'>' | b'/') {
            pos += 1;
        }
        let name = &raw[name_start..pos];

        // The body holds the attributes; everything after it is the close.
        let mut body_end = raw
            .strip_suffix("/>")
            .or_else(|| raw.strip_suffix('>'))
            .map_or(raw.len(), str::len);
        while body_end > pos && is_space(bytes[body_end - 1]) {
            body_end -= 1;
        }
        let body_end = body_end.max(pos);

        let mut attributes = Vec::new();
        while pos < body_end {
            let (attribute, next) = lex_attribute(raw, pos, body_end);
            attributes.push(attribute);
            pos = next;
        }

        StartTag {
            before_name,
            name,
            attributes,
            tag_close: &raw[body_end..],
        }
    }
}

/// Lex one attribute starting at `pos`. Always consumes at least one byte.
fn lex_attribute(raw: &str, mut pos: usize, end: usize) -> (AttributeSpan<'_>, usize) {
    let bytes = raw.as_bytes();

    let leading_start = pos;
    while pos < end && is_space(bytes[pos]) {
        pos += 1;
    }
    let leading = &raw[leading_start..pos];

    let name_start = pos;
    while pos < end && !is_space(bytes[pos]) && bytes[pos] != b'=' {
        pos += 1;
    }
    let name = &raw[name_start..pos];

    // Whitespace only belongs to this attribute when `=` follows it.
    let mut lookahead = pos;
    while lookahead < end && is_space(bytes[lookahead]) {
        lookahead += 1;
    }
    if lookahead >= end || bytes[lookahead] != b'=' {
        let attribute = AttributeSpan {
            leading,
            name,
            equals_and_open_quote: "",
            value: "",
            close_quote: "",
        };
        return (attribute, pos);
    }

    let equals_start = pos;
    pos = lookahead + 1;
    while pos < end && is_space(bytes[pos]) {
        pos += 1;
    }

    let quote = bytes.get(pos).copied().filter(|b| matches!(b, b'"' | b'\''));
    let (equals_and_open_quote, value, close_quote, next) = match quote {
        Some(quote) if pos < end => {
            let value_start = pos + 1;
            match bytes[value_start..end].iter().position(|&b| b == quote) {
                Some(offset) => {
                    let value_end = value_start + offset;
                    (
                        &raw[equals_start..value_start],
                        &raw[value_start..value_end],
                        &raw[value_end..value_end + 1],
                        value_end + 1,
                    )
                }
                None => (
                    &raw[equals_start..value_start],
                    &raw[value_start..end],
                    "",
                    end,
                ),
            }
        }
        _ => {
            let value_start = pos;
            while pos < end && !is_space(bytes[pos]) {
                pos += 1;
            }
            (
                &raw[equals_start..value_start],
                &raw[value_start..pos],
                "",
                pos,
            )
        }
    };

    let attribute = AttributeSpan {
        leading,
        name,
        equals_and_open_quote,
        value,
        close_quote,
    };
    (attribute, next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reassemble(tag: &StartTag<'_>) -> String {
        let mut out = format!("{}{}", tag.before_name, tag.name);
        for attr in &tag.attributes {
            out.push_str(attr.leading);
            out.push_str(attr.name);
            out.push_str(attr.equals_and_open_quote);
            out.push_str(attr.value);
            out.push_str(attr.close_quote);
        }
        out.push_str(tag.tag_close);
        out
    }

    #[test]
    fn test_plain_tags() {
        let tag = StartTag::lex("<a>");
        assert_eq!((tag.before_name, tag.name, tag.tag_close), ("<", "a", ">"));
        assert!(tag.attributes.is_empty());

        let tag = StartTag::lex("<br />");
        assert_eq!((tag.name, tag.tag_close), ("br", " />"));

        let tag = StartTag::lex("<csl:style\n>");
        assert_eq!((tag.name, tag.tag_close), ("csl:style", "\n>"));
    }

    #[test]
    fn test_quoted_attributes_keep_spacing_and_quotes() {
        let tag = StartTag::lex(r#"<a  x = "1" y='two'>"#);
        assert_eq!(tag.attributes.len(), 2);
        let x = tag.attributes[0];
        assert_eq!(x.leading, "  ");
        assert_eq!(x.name, "x");
        assert_eq!(x.equals_and_open_quote, " = \"");
        assert_eq!(x.value, "1");
        assert_eq!(x.close_quote, "\"");
        let y = tag.attributes[1];
        assert_eq!((y.leading, y.name, y.value, y.close_quote), (" ", "y", "two", "'"));
        assert_eq!(tag.tag_close, ">");
    }

    #[test]
    fn test_bare_and_valueless_attributes() {
        let tag = StartTag::lex("<input type=text disabled value=1/>");
        let names: Vec<&str> = tag.attributes.iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["type", "disabled", "value"]);
        assert_eq!(tag.attributes[0].value, "text");
        assert_eq!(tag.attributes[0].equals_and_open_quote, "=");
        assert_eq!(tag.attributes[1].equals_and_open_quote, "");
        assert_eq!(tag.attributes[2].value, "1");
        assert_eq!(tag.tag_close, "/>");
    }

    #[test]
    fn test_quoted_value_may_contain_delimiters() {
        let tag = StartTag::lex(r#"<a href="x/y>z" title='a "b"'>"#);
        assert_eq!(tag.attributes[0].value, "x/y>z");
        assert_eq!(tag.attributes[1].value, "a \"b\"");
    }

    #[test]
    fn test_unterminated_quote() {
        let tag = StartTag::lex(r#"<a x="1>"#);
        assert_eq!(tag.attributes[0].value, "1");
        assert_eq!(tag.attributes[0].close_quote, "");
        assert_eq!(tag.tag_close, ">");
    }

    #[test]
    fn test_pieces_reassemble_to_input() {
        for raw in [
            "<a>",
            "<a/>",
            "< a >",
            "<a x=\"1\"/>",
            "<a\tx\n=\n'1'\ny = 2   />",
            "<a x y z>",
            "<a =\"v\">",
            "<a x=\"1\"y=\"2\">",
            "<é attr=\"ü\">",
            "<a x=>",
        ] {
            assert_eq!(reassemble(&StartTag::lex(raw)), raw, "{raw:?}");
        }
    }
}
