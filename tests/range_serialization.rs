//! Integration tests for node, range and selection serialization.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use rstest::rstest;

use docencode::{
    Boundary, Document, DocumentEncoder, EncoderFlags, NodeId, Range, Selection, TreeKind,
};

const ARTICLE: &str = "<body><h1 id=title>Title</h1>\
<p id=intro>One <a href=\"x.html\">link</a> and <b>bold <i>italic</i></b>.</p>\
<ul id=list><li>first</li><li>second</li><li>third</li></ul>\
<p id=outro>The end<br></p></body>";

const ARTICLE_HTML: &str = "<body><h1 id=\"title\">Title</h1>\
<p id=\"intro\">One <a href=\"x.html\">link</a> and <b>bold <i>italic</i></b>.</p>\
<ul id=\"list\"><li>first</li><li>second</li><li>third</li></ul>\
<p id=\"outro\">The end<br></p></body>";

fn html_encoder(doc: &Document, flags: EncoderFlags) -> DocumentEncoder<'_> {
    let mut encoder = DocumentEncoder::new();
    encoder.init(doc, "text/html", flags);
    encoder
}

fn elements(doc: &Document) -> Vec<NodeId> {
    doc.descendants(doc.root())
        .filter(|&n| doc.is_element(n))
        .collect()
}

// ---------------------------------------------------------------------------
// Whole document and single nodes
// ---------------------------------------------------------------------------

#[test]
fn test_whole_document_round_trips_markup() {
    let doc = Document::parse_html(ARTICLE).unwrap();
    let mut encoder = html_encoder(&doc, EncoderFlags::empty());
    let first = encoder.encode().unwrap();
    assert_eq!(first, ARTICLE_HTML);
    assert_eq!(encoder.encode().unwrap(), first);
}

#[test]
fn test_every_selected_element_matches_its_node_encoding() {
    let doc = Document::parse_html(ARTICLE).unwrap();
    for node in elements(&doc) {
        let mut by_node = html_encoder(&doc, EncoderFlags::empty());
        by_node.set_node(node);
        let expected = by_node.encode().unwrap();

        let mut by_range = html_encoder(&doc, EncoderFlags::empty());
        by_range.set_range(Range::select_node(&doc, node).unwrap());
        assert_eq!(by_range.encode().unwrap(), expected, "element {:?}", doc.local_name(node));
    }
}

#[test]
fn test_container_node_omits_its_own_tags() {
    let doc = Document::parse_html(ARTICLE).unwrap();
    let list = doc.element_by_id("list").unwrap();
    let mut encoder = html_encoder(&doc, EncoderFlags::empty());
    encoder.set_container_node(list);
    assert_eq!(encoder.encode().unwrap(), "<li>first</li><li>second</li><li>third</li>");
}

// ---------------------------------------------------------------------------
// Ranges
// ---------------------------------------------------------------------------

#[rstest]
#[case(0, 5, "Title")]
#[case(1, 4, "itl")]
#[case(2, 2, "")]
#[case(4, 5, "e")]
fn test_range_in_one_text_node_is_a_substring(
    #[case] start: usize,
    #[case] end: usize,
    #[case] expected: &str,
) {
    let doc = Document::parse_html(ARTICLE).unwrap();
    let text = doc.first_child(doc.element_by_id("title").unwrap()).unwrap();
    let mut encoder = html_encoder(&doc, EncoderFlags::empty());
    encoder.set_range(Range::new(Boundary::new(text, start), Boundary::new(text, end)));
    assert_eq!(encoder.encode().unwrap(), expected);
}

#[rstest]
#[case(EncoderFlags::empty())]
#[case(EncoderFlags::ALLOW_CROSS_SHADOW_BOUNDARY)]
fn test_collapsed_range_produces_nothing(#[case] flags: EncoderFlags) {
    let doc = Document::parse_html(ARTICLE).unwrap();
    let intro = doc.element_by_id("intro").unwrap();
    let tree = if flags.is_empty() { TreeKind::Light } else { TreeKind::Flat };
    let mut encoder = html_encoder(&doc, flags);
    encoder.set_range(Range::in_tree(Boundary::new(intro, 1), Boundary::new(intro, 1), tree));
    assert_eq!(encoder.encode().unwrap(), "");
}

#[test]
fn test_range_across_paragraphs_closes_and_reopens_tags() {
    let doc = Document::parse_html(ARTICLE).unwrap();
    let intro = doc.element_by_id("intro").unwrap();
    let list = doc.element_by_id("list").unwrap();
    let link_text = doc.first_child(doc.children(intro).nth(1).unwrap()).unwrap();
    let second = doc.first_child(doc.children(list).nth(1).unwrap()).unwrap();

    let mut encoder = html_encoder(&doc, EncoderFlags::empty());
    encoder.set_range(Range::new(Boundary::new(link_text, 2), Boundary::new(second, 3)));
    assert_eq!(
        encoder.encode().unwrap(),
        "<p id=\"intro\"><a href=\"x.html\">nk</a> and <b>bold <i>italic</i></b>.</p>\
<ul id=\"list\"><li>first</li><li>sec</li></ul>"
    );
}

#[test]
fn test_template_content_is_serialized() {
    let doc =
        Document::parse_html("<div id=d><template id=t><i>inside</i></template></div>").unwrap();
    let d = doc.element_by_id("d").unwrap();
    let mut encoder = html_encoder(&doc, EncoderFlags::empty());
    encoder.set_node(d);
    assert_eq!(
        encoder.encode().unwrap(),
        "<div id=\"d\"><template id=\"t\"><i>inside</i></template></div>"
    );
}

// ---------------------------------------------------------------------------
// Selections
// ---------------------------------------------------------------------------

#[test]
fn test_row_selection_emits_table_context_once() {
    let doc = Document::parse_html(
        "<table id=t><tbody><tr id=r1><td>a</td></tr><tr id=r2><td>b</td></tr>\
<tr id=r3><td>c</td></tr></tbody></table>",
    )
    .unwrap();
    let rows = ["r1", "r2", "r3"].map(|id| doc.element_by_id(id).unwrap());
    let selection: Selection = rows
        .iter()
        .map(|&row| Range::select_node_contents(&doc, row))
        .collect();

    let mut encoder = html_encoder(&doc, EncoderFlags::empty());
    encoder.set_selection(selection);
    let out = encoder.encode().unwrap();
    assert_eq!(out.matches("<table").count(), 1, "{out}");
    assert_eq!(out.matches("</table>").count(), 1, "{out}");
    assert_eq!(out.matches("<tbody>").count(), 1, "{out}");
    for cell in ["<td>a</td>", "<td>b</td>", "<td>c</td>"] {
        assert!(out.contains(cell), "{out}");
    }
}

#[test]
fn test_selection_of_disjoint_ranges_concatenates() {
    let doc = Document::parse_html(ARTICLE).unwrap();
    let title = doc.first_child(doc.element_by_id("title").unwrap()).unwrap();
    let outro = doc.first_child(doc.element_by_id("outro").unwrap()).unwrap();
    let selection: Selection = [
        Range::new(Boundary::new(title, 0), Boundary::new(title, 2)),
        Range::new(Boundary::new(outro, 4), Boundary::new(outro, 7)),
    ]
    .into_iter()
    .collect();
    let mut encoder = html_encoder(&doc, EncoderFlags::empty());
    encoder.set_selection(selection);
    assert_eq!(encoder.encode().unwrap(), "Tiend");
}

// ---------------------------------------------------------------------------
// Flattened tree
// ---------------------------------------------------------------------------

#[test]
fn test_flat_tree_renders_slot_fallback() {
    let doc = Document::parse_html(
        "<div id=host><template shadowrootmode=open><slot><em>fallback</em></slot>\
</template></div>",
    )
    .unwrap();
    let host = doc.element_by_id("host").unwrap();

    let mut flat = html_encoder(&doc, EncoderFlags::ALLOW_CROSS_SHADOW_BOUNDARY);
    flat.set_node(host);
    assert_eq!(flat.encode().unwrap(), "<div id=\"host\"><slot><em>fallback</em></slot></div>");

    let mut light = html_encoder(&doc, EncoderFlags::empty());
    light.set_node(host);
    assert_eq!(light.encode().unwrap(), "<div id=\"host\"></div>");
}

#[test]
fn test_flat_tree_projects_assigned_nodes() {
    let doc = Document::parse_html(
        "<div id=host><template shadowrootmode=open><b>[</b><slot></slot><b>]</b></template>\
<span>light</span></div>",
    )
    .unwrap();
    let host = doc.element_by_id("host").unwrap();
    let mut encoder = html_encoder(&doc, EncoderFlags::ALLOW_CROSS_SHADOW_BOUNDARY);
    encoder.set_container_node(host);
    assert_eq!(encoder.encode().unwrap(), "<b>[</b><slot><span>light</span></slot><b>]</b>");
}

// ---------------------------------------------------------------------------
// Plain text
// ---------------------------------------------------------------------------

#[test]
fn test_plain_text_range() {
    let doc = Document::parse_html(ARTICLE).unwrap();
    let list = doc.element_by_id("list").unwrap();
    let mut encoder = DocumentEncoder::new();
    encoder.init(&doc, "text/plain", EncoderFlags::empty());
    encoder.set_range(Range::select_node_contents(&doc, list));
    assert_eq!(encoder.encode().unwrap(), "first\nsecond\nthird");
}
