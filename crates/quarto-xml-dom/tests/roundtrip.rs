/*
 * roundtrip.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Serialization tests: unmodified documents reproduce their source exactly,
 * and edits only change the parts they touch.
 */

use proptest::prelude::*;
use quarto_xml_dom::{
    DiagnosticKind, Document, Error, ParseOptions, UnmatchedEndTagPolicy, XmlParseContext, parse,
    parse_reader, parse_with_context,
};

const CSL_STYLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<style xmlns="http://purl.org/net/xbiblio/csl" class="in-text" version="1.0">
  <!-- metadata -->
  <info>
    <title>Test &amp; Style</title>
    <updated>2025-01-01T00:00:00+00:00</updated>
  </info>
  <citation et-al-min = '3'
            disambiguate-add-names="true" >
    <layout prefix="(" suffix=")" delimiter="; ">
      <text variable="title"/>
      <group delimiter=", " ><names variable="author" /></group>
    </layout>
  </citation>
</style>
"#;

#[test]
fn test_csl_style_round_trips() {
    let doc = parse(CSL_STYLE).unwrap();
    assert_eq!(doc.to_xml(), CSL_STYLE);
    assert!(doc.check_consistency().is_ok());
}

#[test]
fn test_removing_attribute_reverts_to_self_closing() {
    let doc = parse(r#"<a><b x="1"/></a>"#).unwrap();
    let b = doc.document_element().unwrap().first_child().unwrap();
    b.remove_attribute("x").unwrap();
    insta::assert_snapshot!(doc.to_xml(), @"<a><b/></a>");
}

#[test]
fn test_stray_end_tag_round_trips() {
    let mut ctx = XmlParseContext::new();
    let doc = parse_with_context("<a><b>x</c>y</b></a>", &mut ctx).unwrap();
    insta::assert_snapshot!(doc.to_xml(), @"<a><b>x</c>y</b></a>");
    assert_eq!(ctx.diagnostics()[0].kind, DiagnosticKind::UnmatchedEndTag);
}

#[test]
fn test_mismatched_markup_round_trips() {
    let mut ctx = XmlParseContext::new();
    let doc = parse_with_context("<a><b></a>", &mut ctx).unwrap();

    let a = doc.document_element().unwrap();
    assert_eq!(doc.child_count(), 1);
    assert_eq!(a.child_count(), 1);
    let b = a.first_child().unwrap();
    assert_eq!(b.name(), "b");
    assert!(!b.has_child_nodes());
    assert_eq!(b.raw_spans(), vec!["<", "b", ">"]);

    insta::assert_snapshot!(doc.to_xml(), @"<a><b></a>");
    assert_eq!(ctx.diagnostics().len(), 1);
    assert_eq!(ctx.diagnostics()[0].kind, DiagnosticKind::MismatchedEndTag);
}

#[test]
fn test_created_text_is_escaped() {
    let doc = Document::new();
    let text = doc.create_text_node("a < b");
    insta::assert_snapshot!(text.to_xml(), @"a &lt; b");
}

#[test]
fn test_edits_only_touch_their_node() {
    let doc = parse(CSL_STYLE).unwrap();
    let style = doc.document_element().unwrap();
    style.set_attribute("class", "note").unwrap();

    let info = style
        .child_nodes()
        .into_iter()
        .find(|node| node.name() == "info")
        .unwrap();
    let title = info
        .child_nodes()
        .into_iter()
        .find(|node| node.name() == "title")
        .unwrap();
    let text = title.first_child().unwrap();
    assert_eq!(text.value(), "Test & Style");
    text.set_value("Edited <Style>");

    let expected = CSL_STYLE
        .replace(r#"class="in-text""#, r#"class="note""#)
        .replace("Test &amp; Style", "Edited &lt;Style&gt;");
    assert_eq!(doc.to_xml(), expected);
}

#[test]
fn test_inserted_element_renders_canonically() {
    let doc = parse("<list>\n  <item n='1'/>\n</list>").unwrap();
    let list = doc.document_element().unwrap();
    let item = doc.create_element("item").unwrap();
    item.set_attribute("n", "2").unwrap();
    list.insert_before(&item, list.last_child().as_ref()).unwrap();
    insta::assert_snapshot!(doc.to_xml(), @r#"
    <list>
      <item n='1'/><item n="2"/>
    </list>
    "#);
}

#[test]
fn test_moved_subtree_keeps_its_formatting() {
    let doc = parse("<r><a x = '1' >t</a ><b/></r>").unwrap();
    let r = doc.document_element().unwrap();
    let a = r.first_child().unwrap();
    r.append_child(&a).unwrap();
    insta::assert_snapshot!(doc.to_xml(), @"<r><b/><a x = '1' >t</a ></r>");
}

#[test]
fn test_clone_renders_canonically() {
    let doc = parse("<r><a x = '1' >t</a ></r>").unwrap();
    let r = doc.document_element().unwrap();
    let copy = r.first_child().unwrap().clone_node(true);
    r.append_child(&copy).unwrap();
    insta::assert_snapshot!(doc.to_xml(), @r#"<r><a x = '1' >t</a ><a x="1">t</a></r>"#);
}

#[test]
fn test_fragment_insertion() {
    let doc = parse("<r><z/></r>").unwrap();
    let r = doc.document_element().unwrap();
    let fragment = doc.create_document_fragment();
    fragment
        .append_child(&doc.create_comment(" generated "))
        .unwrap();
    fragment
        .append_child(&doc.create_element("y").unwrap())
        .unwrap();
    r.insert_before(&fragment, r.first_child().as_ref())
        .unwrap();
    insta::assert_snapshot!(doc.to_xml(), @"<r><!-- generated --><y/><z/></r>");
}

#[test]
fn test_byte_order_mark_is_preserved() {
    let source = "\u{feff}<a/>";
    let doc = parse(source).unwrap();
    assert_eq!(doc.to_xml(), source);
}

#[test]
fn test_options_deserialize_from_kebab_case() {
    let options: ParseOptions =
        serde_json::from_str(r#"{"recover": false, "unmatched-end-tag": "ignore"}"#).unwrap();
    assert!(!options.recover);
    assert_eq!(options.unmatched_end_tag, UnmatchedEndTagPolicy::Ignore);

    let defaults: ParseOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(defaults, ParseOptions::default());
}

struct FailingReader;

impl std::io::Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
        Err(std::io::Error::other("connection reset"))
    }
}

#[test]
fn test_reader_failure_is_propagated() {
    let err = parse_reader(FailingReader).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert_eq!(err.to_string(), "I/O error: connection reset");
}

// ============================================================================
// Generated documents
// ============================================================================

fn name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,3}(:[a-z]{1,3})?"
}

fn attributes() -> impl Strategy<Value = String> {
    let attribute = (
        "[ \t\n]{1,2}",
        prop_oneof![Just("="), Just(" = "), Just("= "), Just(" =")],
        prop_oneof![Just('"'), Just('\'')],
        "[a-zA-Z0-9 ./-]{0,6}",
    );
    prop::collection::btree_map("[a-z]{1,3}", attribute, 0..3).prop_map(|attributes| {
        attributes
            .into_iter()
            .map(|(name, (leading, equals, quote, value))| {
                format!("{leading}{name}{equals}{quote}{value}{quote}")
            })
            .collect()
    })
}

fn start_tag() -> impl Strategy<Value = (String, String)> {
    (name(), attributes(), "[ \n]{0,1}")
        .prop_map(|(name, attributes, space)| (name.clone(), format!("<{name}{attributes}{space}")))
}

fn content() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        "[a-zA-Z0-9 \n>]{1,8}",
        Just("&amp;".to_string()),
        Just("&#169;".to_string()),
        "[a-z ]{0,6}".prop_map(|text| format!("<!--{text}-->")),
        "[a-z<>&]{0,4}".prop_map(|text| format!("<![CDATA[{text}]]>")),
        start_tag().prop_map(|(_, open)| format!("{open}/>")),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        (start_tag(), prop::collection::vec(inner, 0..4), "[ \n]{0,1}").prop_map(
            |((name, open), children, space)| {
                format!("{open}>{}</{name}{space}>", children.concat())
            },
        )
    })
}

fn document() -> impl Strategy<Value = String> {
    (
        prop_oneof![
            Just(String::new()),
            Just("<?xml version=\"1.0\"?>\n".to_string()),
        ],
        prop::collection::vec(content(), 1..3),
    )
        .prop_map(|(prolog, body)| format!("{prolog}{}", body.concat()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Parsing then serializing an untouched document gives back its source.
    #[test]
    fn test_untouched_documents_round_trip(source in document()) {
        let doc = parse(&source).unwrap();
        prop_assert_eq!(doc.to_xml(), source);
        prop_assert!(doc.check_consistency().is_ok());
    }

    /// Recovery never loses bytes: a missing end tag is closed implicitly.
    #[test]
    fn test_unbalanced_documents_round_trip(
        source in document(),
        cut in 0usize..64,
    ) {
        let Some(start) = source.match_indices("</").map(|(index, _)| index).nth(cut % 4) else {
            return Ok(());
        };
        let Some(length) = source[start..].find('>') else {
            return Ok(());
        };
        let unbalanced = format!("{}{}", &source[..start], &source[start + length + 1..]);

        let doc = parse(&unbalanced).unwrap();
        prop_assert!(doc.check_consistency().is_ok());
        prop_assert_eq!(doc.to_xml(), unbalanced);
    }

    /// An end tag matching nothing is kept, under either policy.
    #[test]
    fn test_stray_end_tags_round_trip(source in document(), ignore in any::<bool>()) {
        // Right after the first `>` is always outside any tag.
        let Some(split) = source.find('>').map(|index| index + 1) else {
            return Ok(());
        };
        let with_stray = format!("{}</zz>{}", &source[..split], &source[split..]);

        let options = ParseOptions {
            unmatched_end_tag: if ignore {
                UnmatchedEndTagPolicy::Ignore
            } else {
                UnmatchedEndTagPolicy::CloseToRoot
            },
            ..ParseOptions::default()
        };
        let doc = quarto_xml_dom::parse_with_options(&with_stray, &options).unwrap();
        prop_assert!(doc.check_consistency().is_ok());
        prop_assert_eq!(doc.to_xml(), with_stray);
    }
}
