//! XML serializer.
//!
//! Renders nodes as well-formed XML. Elements with no children are written
//! in the empty-element form `<name/>`.

use crate::error::EncodeError;
use crate::tree::{Document, NodeId, NodeKind};

use super::{char_slice, write_doctype, ContentSerializer, SerializerInit};

/// Writes XML markup.
#[derive(Debug, Default)]
pub struct XmlSerializer {
    charset: String,
    rewrite_encoding_declaration: bool,
}

/// Whether `element` is written as `<name/>`.
fn is_empty_element(doc: &Document, element: NodeId) -> bool {
    doc.first_child(element).is_none()
        && doc.template_content(element).is_none()
        && doc.shadow_root(element).is_none()
}

impl ContentSerializer for XmlSerializer {
    fn init(&mut self, init: &SerializerInit) -> bool {
        self.charset = init.encoding.name().to_string();
        self.rewrite_encoding_declaration = init.rewrite_encoding_declaration;
        false
    }

    fn append_document_start(
        &mut self,
        doc: &Document,
        out: &mut String,
    ) -> Result<(), EncodeError> {
        let encoding = if self.rewrite_encoding_declaration {
            Some(self.charset.as_str())
        } else {
            doc.encoding.as_deref()
        };
        match encoding {
            Some(encoding) => {
                out.push_str(&format!("<?xml version=\"1.0\" encoding=\"{encoding}\"?>\n"));
            }
            None => out.push_str("<?xml version=\"1.0\"?>\n"),
        }
        Ok(())
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
        out.push('<');
        out.push_str(name);
        for attr in attributes {
            out.push(' ');
            out.push_str(&attr.name);
            out.push_str("=\"");
            write_escaped_attr(out, &attr.value);
            out.push('"');
        }
        if is_empty_element(doc, element) {
            out.push_str("/>");
        } else {
            out.push('>');
        }
        Ok(())
    }

    fn append_element_end(
        &mut self,
        doc: &Document,
        element: NodeId,
        _original: NodeId,
        out: &mut String,
    ) -> Result<(), EncodeError> {
        if is_empty_element(doc, element) {
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
        write_escaped_text(out, char_slice(doc.node_text(text).unwrap_or_default(), start, end));
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
        out.push_str("?>");
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

/// Writes a character as a hexadecimal character reference (`&#xHH;`).
fn write_hex_char_ref(out: &mut String, ch: char) {
    out.push_str(&format!("&#x{:X};", ch as u32));
}

/// Escapes text content for XML output.
fn write_escaped_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            '\t' | '\n' => out.push(ch),
            c if (c as u32) < 0x20 => write_hex_char_ref(out, c),
            _ => out.push(ch),
        }
    }
}

/// Escapes an attribute value for double-quoted XML output.
fn write_escaped_attr(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\r' => out.push_str("&#13;"),
            '\n' => out.push_str("&#10;"),
            '\t' => out.push_str("&#9;"),
            c if (c as u32) < 0x20 => write_hex_char_ref(out, c),
            _ => out.push(ch),
        }
    }
}
