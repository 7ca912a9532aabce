//! The clipboard encoder.

use std::io::Write;

use encoding_rs::Encoding;

use super::{
    DocumentEncoder, EncodedContext, EncoderFlags, NodeFixup, RangeNodeContext, RangePromoter,
};
use crate::error::EncodeError;
use crate::html::{is_formatting_context_element, is_table_structure_element};
use crate::range::Selection;
use crate::serial::{TEXT_HTML, TEXT_PLAIN};
use crate::tree::{Document, NodeId, TreeKind};

/// Context strategy for copied fragments: inline formatting ancestors and the
/// innermost run of table structure are carried along.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClipboardContext;

impl RangeNodeContext for ClipboardContext {
    fn include_in_context(&self, doc: &Document, node: NodeId) -> bool {
        // An inline editing host would duplicate its own styling on paste.
        if doc.is_editing_host(node) {
            return false;
        }
        doc.local_name(node)
            .is_some_and(|name| is_formatting_context_element(&name))
    }

    fn immediate_context_count(&self, doc: &Document, ancestors: &[NodeId]) -> usize {
        ancestors
            .iter()
            .take_while(|&&node| {
                doc.local_name(node)
                    .is_some_and(|name| is_table_structure_element(&name))
            })
            .count()
    }
}

/// A [`DocumentEncoder`] configured for copying a selection to the
/// clipboard.
///
/// Ranges are promoted before encoding, links are made absolute, and
/// fragments come with their formatting context. A selection inside an
/// `<input>` or `<textarea>` (or in a non-HTML document) is copied as plain
/// text, unpromoted and without context.
pub struct CopyEncoder<'a> {
    inner: DocumentEncoder<'a>,
    is_text_widget: bool,
}

impl<'a> CopyEncoder<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: DocumentEncoder::with_range_node_context(Box::new(ClipboardContext)),
            is_text_widget: false,
        }
    }

    /// Binds the encoder to `doc`. `text/plain` is kept; any other MIME type
    /// copies as `text/html`.
    pub fn init(&mut self, doc: &'a Document, mime_type: &str, flags: EncoderFlags) {
        let mime_type = if mime_type.eq_ignore_ascii_case(TEXT_PLAIN) {
            TEXT_PLAIN
        } else {
            TEXT_HTML
        };
        let mut flags = flags | EncoderFlags::OUTPUT_ABSOLUTE_LINKS;
        if !doc.scripting_enabled {
            flags |= EncoderFlags::OUTPUT_NO_SCRIPT_CONTENT;
        }
        self.inner.init(doc, mime_type, flags);
        self.inner.is_copying = true;
        self.is_text_widget = false;
    }

    /// Sets the selection to copy, promoting every range unless the
    /// selection sits in a text widget.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty selection, `NotInitialized` without a
    /// document, or the first promotion error. On error the previous scope is
    /// kept.
    pub fn set_selection(&mut self, selection: &Selection) -> Result<(), EncodeError> {
        let Some(first) = selection.ranges().first() else {
            return Err(EncodeError::InvalidArgument("selection has no ranges".to_string()));
        };
        let doc = self.inner.document.ok_or(EncodeError::NotInitialized)?;

        let in_widget = first
            .common_ancestor(doc, TreeKind::Light)
            .is_some_and(|common| {
                doc.inclusive_ancestors(common).into_iter().any(|node| {
                    doc.is_element_named(node, "input") || doc.is_element_named(node, "textarea")
                })
            });
        self.is_text_widget = in_widget || !doc.is_html;
        if self.is_text_widget {
            tracing::debug!("selection is inside a text widget, copying as plain text");
            self.inner.set_selection(selection.clone());
            return Ok(());
        }

        let promoter = RangePromoter::new(doc, self.inner.tree_kind());
        let promoted = selection
            .ranges()
            .iter()
            .map(|range| promoter.promote(range))
            .collect::<Result<Selection, _>>()
            .inspect_err(|err| tracing::warn!(%err, "range promotion failed"))?;
        self.inner.set_selection(promoted);
        Ok(())
    }

    #[must_use]
    pub fn is_text_widget(&self) -> bool {
        self.is_text_widget
    }

    #[must_use]
    pub fn mime_type(&self) -> &str {
        self.inner.mime_type()
    }

    #[must_use]
    pub fn flags(&self) -> EncoderFlags {
        self.inner.flags()
    }

    /// See [`DocumentEncoder::set_charset`].
    ///
    /// # Errors
    ///
    /// `EncodingUnsupported` for an unknown label.
    pub fn set_charset(&mut self, label: &str) -> Result<(), EncodeError> {
        self.inner.set_charset(label)
    }

    #[must_use]
    pub fn charset(&self) -> &'static Encoding {
        self.inner.charset()
    }

    pub fn set_wrap_column(&mut self, column: usize) {
        self.inner.set_wrap_column(column);
    }

    pub fn set_node_fixup(&mut self, fixup: Box<dyn NodeFixup + 'a>) {
        self.inner.set_node_fixup(fixup);
    }

    pub fn set_invisibility_check(&mut self, check: impl Fn(&Document, NodeId) -> bool + 'a) {
        self.inner.set_invisibility_check(check);
    }

    fn prepare(&mut self) {
        if self.is_text_widget {
            self.inner.set_mime_type(TEXT_PLAIN);
        }
    }

    /// Encodes the selection. See [`DocumentEncoder::encode`].
    ///
    /// # Errors
    ///
    /// Any error of [`DocumentEncoder::encode`].
    pub fn encode(&mut self) -> Result<String, EncodeError> {
        self.prepare();
        self.inner.encode()
    }

    /// # Errors
    ///
    /// Any error of [`DocumentEncoder::encode_with_max_length`].
    pub fn encode_with_max_length(&mut self, max_length: usize) -> Result<String, EncodeError> {
        self.prepare();
        self.inner.encode_with_max_length(max_length)
    }

    /// # Errors
    ///
    /// Any error of [`DocumentEncoder::encode_to_stream`].
    pub fn encode_to_stream(&mut self, sink: &mut dyn Write) -> Result<(), EncodeError> {
        self.prepare();
        self.inner.encode_to_stream(sink)
    }

    /// Encodes the selection with its context. In a text widget the context
    /// and info strings are empty.
    ///
    /// # Errors
    ///
    /// Any error of [`DocumentEncoder::encode_with_context`].
    pub fn encode_with_context(&mut self) -> Result<EncodedContext, EncodeError> {
        self.prepare();
        if self.is_text_widget {
            let fragment = self.inner.encode()?;
            return Ok(EncodedContext {
                fragment,
                ..EncodedContext::default()
            });
        }
        self.inner.encode_with_context()
    }
}

impl Default for CopyEncoder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CopyEncoder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CopyEncoder")
            .field("inner", &self.inner)
            .field("is_text_widget", &self.is_text_widget)
            .finish()
    }
}
