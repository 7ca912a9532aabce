//! HTML serializer.
//!
//! Renders nodes as HTML markup:
//!
//! - Void elements use `<br>` syntax and never get an end tag
//! - Text inside raw text elements (script, style) is not escaped
//! - `&`, `<`, `>` and U+00A0 are escaped in text; `&`, `"` and U+00A0 in
//!   attribute values
//! - With `OUTPUT_ABSOLUTE_LINKS`, URL attributes are resolved against the
//!   document base URL
//! - When the encoding declaration is rewritten, `<meta charset>` names the
//!   output charset

use url::Url;

use crate::encoder::EncoderFlags;
use crate::error::EncodeError;
use crate::html::{is_link_attribute, is_raw_text_element, is_void_element};
use crate::tree::{Document, NodeId, NodeKind};

use super::{char_slice, write_doctype, ContentSerializer, SerializerInit};

/// Writes HTML markup.
#[derive(Debug, Default)]
pub struct HtmlSerializer {
    flags: EncoderFlags,
    charset: String,
    rewrite_encoding_declaration: bool,
    base_url: Option<Url>,
}

impl HtmlSerializer {
    fn write_attribute_value(
        &self,
        doc: &Document,
        element: NodeId,
        name: &str,
        value: &str,
        out: &mut String,
    ) {
        let lower = name.to_ascii_lowercase();
        if self.rewrite_encoding_declaration && doc.is_element_named(element, "meta") {
            if lower == "charset" {
                write_html_escaped_attr(out, &self.charset);
                return;
            }
            let is_content_type = doc
                .attribute(element, "http-equiv")
                .is_some_and(|v| v.eq_ignore_ascii_case("content-type"));
            if lower == "content" && is_content_type {
                write_html_escaped_attr(out, &format!("text/html; charset={}", self.charset));
                return;
            }
        }
        if self.flags.contains(EncoderFlags::OUTPUT_ABSOLUTE_LINKS) && is_link_attribute(&lower) {
            if let Some(absolute) = self.base_url.as_ref().and_then(|base| base.join(value).ok()) {
                write_html_escaped_attr(out, absolute.as_str());
                return;
            }
        }
        write_html_escaped_attr(out, value);
    }

    fn resolve_base(&mut self, doc: &Document) {
        if self.base_url.is_none() && self.flags.contains(EncoderFlags::OUTPUT_ABSOLUTE_LINKS) {
            self.base_url = doc.base_url.as_deref().and_then(|base| Url::parse(base).ok());
        }
    }
}

impl ContentSerializer for HtmlSerializer {
    fn init(&mut self, init: &SerializerInit) -> bool {
        self.flags = init.flags;
        self.charset = init.encoding.name().to_string();
        self.rewrite_encoding_declaration = init.rewrite_encoding_declaration;
        self.base_url = None;
        false
    }

    fn append_element_start(
        &mut self,
        doc: &Document,
        element: NodeId,
        _original: NodeId,
        out: &mut String,
    ) -> Result<(), EncodeError> {
        let NodeKind::Element { name, attributes, .. } = &doc.node(element).kind else {
            return Ok(());
        };
        self.resolve_base(doc);
        out.push('<');
        out.push_str(name);
        for attr in attributes {
            out.push(' ');
            out.push_str(&attr.name);
            out.push_str("=\"");
            self.write_attribute_value(doc, element, &attr.name, &attr.value, out);
            out.push('"');
        }
        out.push('>');
        Ok(())
    }

    fn append_element_end(
        &mut self,
        doc: &Document,
        element: NodeId,
        _original: NodeId,
        out: &mut String,
    ) -> Result<(), EncodeError> {
        let Some(local) = doc.local_name(element) else {
            return Ok(());
        };
        if is_void_element(&local) {
            return Ok(());
        }
        if let Some(name) = doc.node_name(element) {
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        Ok(())
    }

    fn append_text(
        &mut self,
        doc: &Document,
        text: NodeId,
        start: usize,
        end: Option<usize>,
        out: &mut String,
    ) -> Result<(), EncodeError> {
        let content = char_slice(doc.node_text(text).unwrap_or_default(), start, end);
        let raw = doc
            .parent(text)
            .and_then(|p| doc.local_name(p))
            .is_some_and(|name| is_raw_text_element(&name));
        if raw {
            out.push_str(content);
        } else {
            write_html_escaped_text(out, content);
        }
        Ok(())
    }

    fn append_cdata(
        &mut self,
        doc: &Document,
        cdata: NodeId,
        start: usize,
        end: Option<usize>,
        out: &mut String,
    ) -> Result<(), EncodeError> {
        out.push_str("<![CDATA[");
        out.push_str(char_slice(doc.node_text(cdata).unwrap_or_default(), start, end));
        out.push_str("]]>");
        Ok(())
    }

    fn append_processing_instruction(
        &mut self,
        doc: &Document,
        pi: NodeId,
        start: usize,
        end: Option<usize>,
        out: &mut String,
    ) -> Result<(), EncodeError> {
        out.push_str("<?");
        out.push_str(doc.node_name(pi).unwrap_or_default());
        let data = char_slice(doc.node_text(pi).unwrap_or_default(), start, end);
        if !data.is_empty() {
            out.push(' ');
            out.push_str(data);
        }
        out.push('>');
        Ok(())
    }

    fn append_comment(
        &mut self,
        doc: &Document,
        comment: NodeId,
        start: usize,
        end: Option<usize>,
        out: &mut String,
    ) -> Result<(), EncodeError> {
        out.push_str("<!--");
        out.push_str(char_slice(doc.node_text(comment).unwrap_or_default(), start, end));
        out.push_str("-->");
        Ok(())
    }

    fn append_doctype(
        &mut self,
        doc: &Document,
        doctype: NodeId,
        out: &mut String,
    ) -> Result<(), EncodeError> {
        write_doctype(doc, doctype, out);
        Ok(())
    }
}

/// Escapes text content for HTML output.
///
/// - `&` → `&amp;`
/// - `<` → `&lt;`
/// - `>` → `&gt;`
/// - U+00A0 → `&nbsp;`
fn write_html_escaped_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

/// Escapes an attribute value for double-quoted HTML output.
fn write_html_escaped_attr(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}
