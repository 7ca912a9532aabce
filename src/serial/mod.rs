//! Format-specific content serializers.
//!
//! The encoder walks the tree and reports node boundaries and text to a
//! [`ContentSerializer`], which renders them into the output buffer. Three
//! writers are provided: [`html::HtmlSerializer`], [`xml::XmlSerializer`] and
//! [`text::PlainTextSerializer`]. [`serializer_for_mime`] maps a MIME type to
//! a fresh writer.

pub mod html;
pub mod text;
pub mod xml;

use encoding_rs::Encoding;

use crate::encoder::EncoderFlags;
use crate::error::EncodeError;
use crate::tree::{Document, NodeId};

pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_HTML: &str = "text/html";
pub const TEXT_XML: &str = "text/xml";
pub const APPLICATION_XML: &str = "application/xml";
pub const APPLICATION_XHTML_XML: &str = "application/xhtml+xml";
pub const IMAGE_SVG_XML: &str = "image/svg+xml";

/// Settings handed to a serializer at the start of every encode pass.
#[derive(Debug, Clone, Copy)]
pub struct SerializerInit {
    pub flags: EncoderFlags,
    /// Column plain-text output wraps at (0 disables wrapping).
    pub wrap_column: usize,
    /// Charset the output will be transcoded to.
    pub encoding: &'static Encoding,
    /// Whether the output is destined for the clipboard.
    pub is_copy: bool,
    /// Whether in-document encoding declarations should name `encoding`.
    pub rewrite_encoding_declaration: bool,
}

/// A writer that renders node boundaries and character data.
///
/// Every `append_*` method appends to `out`. Text-like nodes take a char
/// range `[start, end)` of their content; `end: None` means "to the end".
/// `append_element_start`/`end` receive the node to render (possibly a
/// fixup replacement) and the node the walk is actually visiting.
pub trait ContentSerializer {
    /// Resets per-pass state. Returns `true` if the writer wants the
    /// preformat scan hooks called around every element and text node.
    fn init(&mut self, init: &SerializerInit) -> bool;

    /// Called once before a whole-document walk.
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    fn append_document_start(
        &mut self,
        _doc: &Document,
        _out: &mut String,
    ) -> Result<(), EncodeError> {
        Ok(())
    }

    /// # Errors
    ///
    /// Propagates writer failures.
    fn append_element_start(
        &mut self,
        doc: &Document,
        element: NodeId,
        original: NodeId,
        out: &mut String,
    ) -> Result<(), EncodeError>;

    /// # Errors
    ///
    /// Propagates writer failures.
    fn append_element_end(
        &mut self,
        doc: &Document,
        element: NodeId,
        original: NodeId,
        out: &mut String,
    ) -> Result<(), EncodeError>;

    /// # Errors
    ///
    /// Propagates writer failures.
    fn append_text(
        &mut self,
        doc: &Document,
        text: NodeId,
        start: usize,
        end: Option<usize>,
        out: &mut String,
    ) -> Result<(), EncodeError>;

    /// # Errors
    ///
    /// Propagates writer failures.
    fn append_cdata(
        &mut self,
        doc: &Document,
        cdata: NodeId,
        start: usize,
        end: Option<usize>,
        out: &mut String,
    ) -> Result<(), EncodeError>;

    /// # Errors
    ///
    /// Propagates writer failures.
    fn append_processing_instruction(
        &mut self,
        doc: &Document,
        pi: NodeId,
        start: usize,
        end: Option<usize>,
        out: &mut String,
    ) -> Result<(), EncodeError>;

    /// # Errors
    ///
    /// Propagates writer failures.
    fn append_comment(
        &mut self,
        doc: &Document,
        comment: NodeId,
        start: usize,
        end: Option<usize>,
        out: &mut String,
    ) -> Result<(), EncodeError>;

    /// # Errors
    ///
    /// Propagates writer failures.
    fn append_doctype(
        &mut self,
        doc: &Document,
        doctype: NodeId,
        out: &mut String,
    ) -> Result<(), EncodeError>;

    /// Entering `element` (or the parent element of a text node).
    fn scan_element_for_preformat(&mut self, _doc: &Document, _element: NodeId) {}

    /// Leaving an element previously passed to `scan_element_for_preformat`.
    fn forget_element_for_preformat(&mut self, _doc: &Document, _element: NodeId) {}

    /// Completes output at the end of an encode pass.
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    fn flush_and_finish(&mut self, out: &mut String) -> Result<(), EncodeError> {
        self.finish(out)
    }

    /// Completes output that is not followed by further conversion (context
    /// markup).
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    fn finish(&mut self, _out: &mut String) -> Result<(), EncodeError> {
        Ok(())
    }
}

/// Returns a new serializer for `mime`, or `None` if the type is not supported.
///
/// # Examples
///
/// ```
/// use docencode::serial::serializer_for_mime;
///
/// assert!(serializer_for_mime("text/html").is_some());
/// assert!(serializer_for_mime("application/pdf").is_none());
/// ```
#[must_use]
pub fn serializer_for_mime(mime: &str) -> Option<Box<dyn ContentSerializer>> {
    let mime = mime.trim().to_ascii_lowercase();
    match mime.as_str() {
        TEXT_HTML => Some(Box::new(html::HtmlSerializer::default())),
        TEXT_XML | APPLICATION_XML | APPLICATION_XHTML_XML | IMAGE_SVG_XML => {
            Some(Box::new(xml::XmlSerializer::default()))
        }
        TEXT_PLAIN => Some(Box::new(text::PlainTextSerializer::default())),
        _ => None,
    }
}

/// Returns the chars `[start, end)` of `text`, clamped to its length.
pub(crate) fn char_slice(text: &str, start: usize, end: Option<usize>) -> &str {
    let byte_at = |index: usize| {
        text.char_indices()
            .nth(index)
            .map_or(text.len(), |(byte, _)| byte)
    };
    let from = byte_at(start);
    let to = end.map_or(text.len(), byte_at);
    if from >= to {
        ""
    } else {
        &text[from..to]
    }
}

/// Writes `<!DOCTYPE name PUBLIC "..." "...">`.
pub(crate) fn write_doctype(doc: &Document, doctype: NodeId, out: &mut String) {
    let crate::tree::NodeKind::DocumentType {
        name,
        public_id,
        system_id,
    } = &doc.node(doctype).kind
    else {
        return;
    };
    out.push_str("<!DOCTYPE ");
    out.push_str(name);
    match (public_id, system_id) {
        (Some(public), Some(system)) => {
            out.push_str(&format!(" PUBLIC \"{public}\" \"{system}\""));
        }
        (Some(public), None) => out.push_str(&format!(" PUBLIC \"{public}\"")),
        (None, Some(system)) => out.push_str(&format!(" SYSTEM \"{system}\"")),
        (None, None) => {}
    }
    out.push('>');
}
