//! Document encoders.
//!
//! A [`DocumentEncoder`] renders a whole document, a single node, a range or
//! a multi-range selection through the [`ContentSerializer`] registered for
//! its MIME type, either into a `String` or streamed through a charset
//! encoder into an [`std::io::Write`] sink. [`CopyEncoder`] is the clipboard
//! flavour: it widens ranges with a [`RangePromoter`] before encoding and
//! wraps fragments in formatting and table context.
//!
//! # Examples
//!
//! ```
//! use docencode::encoder::{DocumentEncoder, EncoderFlags};
//! use docencode::range::{Boundary, Range};
//! use docencode::Document;
//!
//! let doc = Document::parse_html("<p id=p>Hello <b>world</b>!</p>").unwrap();
//! let p = doc.element_by_id("p").unwrap();
//!
//! let mut encoder = DocumentEncoder::new();
//! encoder.init(&doc, "text/html", EncoderFlags::empty());
//! encoder.set_range(Range::new(Boundary::new(p, 1), Boundary::new(p, 2)));
//! assert_eq!(encoder.encode().unwrap(), "<b>world</b>");
//! ```

mod copy;
mod node;
mod promote;
mod range;

pub use copy::{ClipboardContext, CopyEncoder};
pub use node::InvisibilityCheck;
pub use promote::RangePromoter;

use std::fmt;
use std::io::Write;

use encoding_rs::{Encoding, UTF_8};

use crate::encoding::{resolve_charset, TextStreamer};
use crate::error::EncodeError;
use crate::html::is_non_rendered_element;
use crate::range::{Range, Selection};
use crate::serial::{serializer_for_mime, ContentSerializer, SerializerInit, TEXT_PLAIN};
use crate::tree::{Document, NodeId, TreeKind};

use node::{NodeSerializer, SerializeConfig};
use range::{RangeContextSerializer, RangeSerializer};

/// Column plain-text output wraps at unless configured otherwise.
pub const DEFAULT_WRAP_COLUMN: usize = 72;

/// Initial capacity of the reusable output buffer.
const BUFFER_CAPACITY: usize = 2048;

bitflags::bitflags! {
    /// Options recognized by the encoders and serializers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EncoderFlags: u32 {
        /// Skip nodes the invisibility check reports as not rendered.
        const SKIP_INVISIBLE_CONTENT = 1 << 0;
        /// Treat all text as preformatted.
        const OUTPUT_PREFORMATTED = 1 << 1;
        /// Drop `<br>` elements that render nothing.
        const OUTPUT_DROP_INVISIBLE_BREAK = 1 << 2;
        /// Resolve URL attributes against the document base URL.
        const OUTPUT_ABSOLUTE_LINKS = 1 << 3;
        /// Render `<noscript>` content as text.
        const OUTPUT_NO_SCRIPT_CONTENT = 1 << 4;
        /// Leave in-document encoding declarations untouched.
        const OUTPUT_DONT_REWRITE_ENCODING_DECLARATION = 1 << 5;
        /// Walk the flattened tree: shadow roots replace host children and
        /// slots show their assigned nodes.
        const ALLOW_CROSS_SHADOW_BOUNDARY = 1 << 6;
        /// Wrap plain-text lines at the wrap column.
        const OUTPUT_WRAP = 1 << 7;
        /// Release the document after every successful encode.
        const REQUIRES_REINIT_AFTER_OUTPUT = 1 << 8;
    }
}

/// What part of the document the next encode covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EncodingScope {
    #[default]
    Document,
    Selection(Selection),
    Range(Range),
    /// A single node; with `container` set only its children are encoded.
    Node { node: NodeId, container: bool },
}

impl EncodingScope {
    /// Whether the scope is narrower than the whole document.
    #[must_use]
    pub fn is_limited(&self) -> bool {
        !matches!(self, Self::Document)
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Selection(_) => "selection",
            Self::Range(_) => "range",
            Self::Node { .. } => "node",
        }
    }
}

/// Hook that substitutes the node rendered in place of a walked node.
pub trait NodeFixup {
    /// Returns the replacement for `node` (or `None` to keep it) and whether
    /// the replacement's children should be walked instead of the original's.
    fn fixup(&self, doc: &Document, node: NodeId) -> (Option<NodeId>, bool);
}

/// Decides which ancestors wrap a range fragment as context.
pub trait RangeNodeContext {
    /// Whether `node` is always carried as context. Entering such a node
    /// during a range walk also stops context depth counting.
    fn include_in_context(&self, _doc: &Document, _node: NodeId) -> bool {
        false
    }

    /// How many of the innermost `ancestors` (innermost first) are carried
    /// as context regardless of `include_in_context`.
    fn immediate_context_count(&self, _doc: &Document, _ancestors: &[NodeId]) -> usize {
        0
    }
}

/// Context strategy of the plain encoder: no ancestor is context.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainContext;

impl RangeNodeContext for PlainContext {}

/// How many ancestor levels the range walk entered above each boundary
/// before reaching a context node.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ContextInfoDepth {
    pub start: usize,
    pub end: usize,
}

impl fmt::Display for ContextInfoDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.start, self.end)
    }
}

/// Result of [`DocumentEncoder::encode_with_context`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EncodedContext {
    /// The encoded scope.
    pub fragment: String,
    /// Empty start and end tags of the context ancestors.
    pub context: String,
    /// `"start,end"` depth pair for paste consumers.
    pub info: String,
    pub depth: ContextInfoDepth,
}

/// Default invisibility check: non-rendered elements, the `hidden`
/// attribute and inline `display: none`.
#[must_use]
pub fn is_hidden(doc: &Document, node: NodeId) -> bool {
    let Some(name) = doc.local_name(node) else {
        return false;
    };
    if is_non_rendered_element(&name) || doc.attribute(node, "hidden").is_some() {
        return true;
    }
    doc.attribute(node, "style").is_some_and(|style| {
        style.split(';').any(|declaration| {
            let mut parts = declaration.splitn(2, ':');
            matches!(
                (parts.next(), parts.next()),
                (Some(property), Some(value))
                    if property.trim().eq_ignore_ascii_case("display")
                        && value.trim().eq_ignore_ascii_case("none")
            )
        })
    })
}

/// Encodes a document, or part of it, as text.
pub struct DocumentEncoder<'a> {
    document: Option<&'a Document>,
    mime_type: String,
    encoding: &'static Encoding,
    flags: EncoderFlags,
    wrap_column: usize,
    is_copying: bool,
    scope: EncodingScope,
    serializer: Option<Box<dyn ContentSerializer>>,
    needs_preformat_scan: bool,
    node_fixup: Option<Box<dyn NodeFixup + 'a>>,
    invisibility: Box<InvisibilityCheck<'a>>,
    range_node_context: Box<dyn RangeNodeContext + 'a>,
    range_context: RangeContextSerializer,
    range_serializer: RangeSerializer,
    cached_buffer: Option<String>,
    in_pass: bool,
}

/// Clears per-pass state when an encode pass ends, successfully or not.
struct PassGuard<'e, 'a> {
    encoder: &'e mut DocumentEncoder<'a>,
}

impl Drop for PassGuard<'_, '_> {
    fn drop(&mut self) {
        self.encoder.range_context.clear();
        self.encoder.scope = EncodingScope::Document;
        self.encoder.in_pass = false;
    }
}

impl<'a> DocumentEncoder<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_range_node_context(Box::new(PlainContext))
    }

    /// An encoder using `context` to pick the ancestors wrapping range
    /// fragments.
    #[must_use]
    pub fn with_range_node_context(context: Box<dyn RangeNodeContext + 'a>) -> Self {
        Self {
            document: None,
            mime_type: TEXT_PLAIN.to_string(),
            encoding: UTF_8,
            flags: EncoderFlags::empty(),
            wrap_column: DEFAULT_WRAP_COLUMN,
            is_copying: false,
            scope: EncodingScope::Document,
            serializer: None,
            needs_preformat_scan: false,
            node_fixup: None,
            invisibility: Box::new(is_hidden),
            range_node_context: context,
            range_context: RangeContextSerializer::default(),
            range_serializer: RangeSerializer::default(),
            cached_buffer: None,
            in_pass: false,
        }
    }

    /// Binds the encoder to `doc` and selects the output format. Resets the
    /// scope, flags and wrap column; keeps the charset. The cached serializer
    /// is dropped when the MIME type changes.
    pub fn init(&mut self, doc: &'a Document, mime_type: &str, flags: EncoderFlags) {
        self.set_mime_type(mime_type);
        self.document = Some(doc);
        self.reset(flags);
        tracing::debug!(mime = %self.mime_type, ?flags, "encoder initialized");
    }

    fn reset(&mut self, flags: EncoderFlags) {
        self.flags = flags;
        self.wrap_column = DEFAULT_WRAP_COLUMN;
        self.is_copying = false;
        self.scope = EncodingScope::Document;
        self.needs_preformat_scan = false;
        self.range_context = RangeContextSerializer::default();
        self.range_serializer = RangeSerializer::default();
    }

    fn set_mime_type(&mut self, mime_type: &str) {
        if !self.mime_type.eq_ignore_ascii_case(mime_type) {
            self.serializer = None;
        }
        self.mime_type = mime_type.to_string();
    }

    fn release_document(&mut self) {
        tracing::trace!("releasing document after output");
        self.document = None;
        self.reset(EncoderFlags::empty());
    }

    pub(crate) fn tree_kind(&self) -> TreeKind {
        SerializeConfig::new(self.flags, false).tree
    }

    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    #[must_use]
    pub fn flags(&self) -> EncoderFlags {
        self.flags
    }

    #[must_use]
    pub fn charset(&self) -> &'static Encoding {
        self.encoding
    }

    #[must_use]
    pub fn scope(&self) -> &EncodingScope {
        &self.scope
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.scope = EncodingScope::Selection(selection);
    }

    pub fn set_range(&mut self, range: Range) {
        self.scope = EncodingScope::Range(range);
    }

    /// Encodes `node` including its own tags.
    pub fn set_node(&mut self, node: NodeId) {
        self.scope = EncodingScope::Node {
            node,
            container: false,
        };
    }

    /// Encodes only the children of `node`.
    pub fn set_container_node(&mut self, node: NodeId) {
        self.scope = EncodingScope::Node {
            node,
            container: true,
        };
    }

    /// Selects the output charset by label.
    ///
    /// # Errors
    ///
    /// Returns `EncodingUnsupported` for an unknown label.
    pub fn set_charset(&mut self, label: &str) -> Result<(), EncodeError> {
        self.encoding = resolve_charset(label)?;
        Ok(())
    }

    pub fn set_wrap_column(&mut self, column: usize) {
        self.wrap_column = column;
    }

    pub fn set_node_fixup(&mut self, fixup: Box<dyn NodeFixup + 'a>) {
        self.node_fixup = Some(fixup);
    }

    /// Replaces the predicate consulted under `SKIP_INVISIBLE_CONTENT`.
    pub fn set_invisibility_check(&mut self, check: impl Fn(&Document, NodeId) -> bool + 'a) {
        self.invisibility = Box::new(check);
    }

    /// Encodes the current scope into a string.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` without a document, `UnsupportedFormat` when
    /// no serializer handles the MIME type, or any serializer failure.
    pub fn encode(&mut self) -> Result<String, EncodeError> {
        self.encode_with_max_length(0)
    }

    /// Like [`encode`](Self::encode), but stops descending into further
    /// subtrees of a document or node walk once `max_length` chars were
    /// produced. Zero means no limit.
    ///
    /// # Errors
    ///
    /// See [`encode`](Self::encode).
    pub fn encode_with_max_length(&mut self, max_length: usize) -> Result<String, EncodeError> {
        let result = self.encode_fragment(max_length)?;
        self.after_output();
        Ok(result)
    }

    fn encode_fragment(&mut self, max_length: usize) -> Result<String, EncodeError> {
        let mut out = match self.cached_buffer.take() {
            Some(buffer) => buffer,
            None => {
                let mut buffer = String::new();
                buffer
                    .try_reserve(BUFFER_CAPACITY)
                    .map_err(|_| EncodeError::OutOfMemory)?;
                buffer
            }
        };
        out.clear();
        let capacity = out.capacity();

        self.run_pass(&mut out, (max_length > 0).then_some(max_length), None)?;

        // A buffer that had to grow is handed out; one that did not is kept.
        if out.capacity() == capacity {
            let result = out.as_str().to_owned();
            out.clear();
            self.cached_buffer = Some(out);
            Ok(result)
        } else {
            Ok(out)
        }
    }

    /// Encodes the current scope and writes it to `sink` in the configured
    /// charset, flushing in chunks as output accumulates.
    ///
    /// # Errors
    ///
    /// See [`encode`](Self::encode); sink failures surface as `Io`.
    pub fn encode_to_stream(&mut self, sink: &mut dyn Write) -> Result<(), EncodeError> {
        let plain_text = self.mime_type.eq_ignore_ascii_case(TEXT_PLAIN);
        let mut streamer = TextStreamer::new(sink, self.encoding, plain_text);
        let mut buffer = String::with_capacity(BUFFER_CAPACITY);
        let result = self.run_pass(&mut buffer, None, Some(&mut streamer));
        let flushed = streamer.force_flush(&mut buffer);
        result.and(flushed)?;
        self.after_output();
        Ok(())
    }

    /// Encodes the current scope and the markup of the ancestors that wrap
    /// it, plus the context depth pair.
    ///
    /// The context is taken from the last range walked. A leading text
    /// ancestor is dropped and both depths shrink by one for it.
    ///
    /// # Errors
    ///
    /// See [`encode`](Self::encode).
    pub fn encode_with_context(&mut self) -> Result<EncodedContext, EncodeError> {
        let fragment = self.encode_fragment(0)?;
        let (context, depth) = self.encode_context()?;
        self.after_output();
        Ok(EncodedContext {
            fragment,
            context,
            info: depth.to_string(),
            depth,
        })
    }

    fn encode_context(&mut self) -> Result<(String, ContextInfoDepth), EncodeError> {
        let doc = self.document.ok_or(EncodeError::NotInitialized)?;
        let init = SerializerInit {
            flags: self.flags,
            wrap_column: self.wrap_column,
            encoding: self.encoding,
            is_copy: self.is_copying,
            rewrite_encoding_declaration: false,
        };
        let Some(serializer) = self.serializer.as_deref_mut() else {
            return Err(EncodeError::UnsupportedFormat(self.mime_type.clone()));
        };
        self.needs_preformat_scan = serializer.init(&init);
        let config = SerializeConfig::new(self.flags, self.needs_preformat_scan);

        let mut ancestors = self.range_serializer.common_inclusive_ancestors.clone();
        let mut depth = self.range_serializer.context_depth;
        if ancestors.first().is_some_and(|&node| doc.is_text(node)) {
            ancestors.remove(0);
            depth.start = depth.start.saturating_sub(1);
            depth.end = depth.end.saturating_sub(1);
        }

        let strategy = self.range_node_context.as_ref();
        let immediate = strategy.immediate_context_count(doc, &ancestors);
        let wrapping: Vec<NodeId> = ancestors
            .iter()
            .enumerate()
            .filter(|&(i, &node)| strategy.include_in_context(doc, node) || i < immediate)
            .map(|(_, &node)| node)
            .collect();

        let mut context = String::new();
        {
            let mut ns = NodeSerializer::new(
                doc,
                serializer,
                &mut context,
                &config,
                self.node_fixup.as_deref(),
                self.invisibility.as_ref(),
                None,
            );
            for &node in wrapping.iter().rev() {
                ns.serialize_node_start(node, 0, None, None)?;
            }
            for &node in &wrapping {
                ns.serialize_node_end(node, None)?;
            }
        }
        serializer.finish(&mut context)?;
        tracing::trace!(%depth, ancestors = wrapping.len(), "encoded range context");
        Ok((context, depth))
    }

    fn after_output(&mut self) {
        if self.flags.contains(EncoderFlags::REQUIRES_REINIT_AFTER_OUTPUT) {
            self.release_document();
        }
    }

    fn run_pass(
        &mut self,
        out: &mut String,
        max_length: Option<usize>,
        streamer: Option<&mut TextStreamer<'_>>,
    ) -> Result<(), EncodeError> {
        assert!(!self.in_pass, "encode pass started while another pass was active");
        self.in_pass = true;
        let mut guard = PassGuard { encoder: self };
        guard.encoder.serialize_pass(out, max_length, streamer)
    }

    fn serialize_pass(
        &mut self,
        out: &mut String,
        max_length: Option<usize>,
        streamer: Option<&mut TextStreamer<'_>>,
    ) -> Result<(), EncodeError> {
        let doc = self.document.ok_or(EncodeError::NotInitialized)?;
        if self.serializer.is_none() {
            let Some(serializer) = serializer_for_mime(&self.mime_type) else {
                tracing::warn!(mime = %self.mime_type, "no serializer registered for format");
                return Err(EncodeError::UnsupportedFormat(self.mime_type.clone()));
            };
            self.serializer = Some(serializer);
        }

        let flags = self.flags;
        let init = SerializerInit {
            flags,
            wrap_column: self.wrap_column,
            encoding: self.encoding,
            is_copy: self.is_copying,
            rewrite_encoding_declaration: !self.scope.is_limited()
                && !flags.contains(EncoderFlags::OUTPUT_DONT_REWRITE_ENCODING_DECLARATION),
        };
        let scope = std::mem::take(&mut self.scope);
        tracing::debug!(scope = scope.name(), mime = %self.mime_type, "encode pass");

        let Some(serializer) = self.serializer.as_deref_mut() else {
            return Err(EncodeError::UnsupportedFormat(self.mime_type.clone()));
        };
        self.needs_preformat_scan = serializer.init(&init);
        let config = SerializeConfig::new(flags, self.needs_preformat_scan);
        self.range_serializer = RangeSerializer::default();

        {
            let strategy = self.range_node_context.as_ref();
            let mut ns = NodeSerializer::new(
                doc,
                serializer,
                out,
                &config,
                self.node_fixup.as_deref(),
                self.invisibility.as_ref(),
                streamer,
            );
            match scope {
                EncodingScope::Selection(selection) => self.range_serializer.serialize_selection(
                    &mut ns,
                    &mut self.range_context,
                    strategy,
                    &selection,
                )?,
                EncodingScope::Range(range) => self.range_serializer.serialize_range_to_string(
                    &mut ns,
                    &mut self.range_context,
                    strategy,
                    &range,
                )?,
                EncodingScope::Node { node, container } => {
                    let filtered = self.node_fixup.is_some()
                        || flags.contains(EncoderFlags::SKIP_INVISIBLE_CONTENT)
                        || ns.is_streaming();
                    if container && !filtered {
                        ns.serialize_to_string_iterative(node)?;
                    } else {
                        ns.serialize_to_string_recursive(node, !container, max_length)?;
                    }
                }
                EncodingScope::Document => {
                    ns.append_document_start()?;
                    ns.serialize_to_string_recursive(doc.root(), true, max_length)?;
                }
            }
        }

        serializer.flush_and_finish(out)
    }
}

impl Default for DocumentEncoder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DocumentEncoder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentEncoder")
            .field("mime_type", &self.mime_type)
            .field("encoding", &self.encoding.name())
            .field("flags", &self.flags)
            .field("wrap_column", &self.wrap_column)
            .field("scope", &self.scope)
            .field("initialized", &self.document.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::range::Boundary;
    use pretty_assertions::assert_eq;

    const PAGE: &str = "<html><head><title>t</title></head>\
<body><p id=p>Hello <b>world</b>!</p><div id=d><i>a</i>b</div></body></html>";

    fn encoder<'a>(doc: &'a Document, mime: &str, flags: EncoderFlags) -> DocumentEncoder<'a> {
        let mut encoder = DocumentEncoder::new();
        encoder.init(doc, mime, flags);
        encoder
    }

    #[test]
    fn test_whole_document_is_idempotent() {
        let doc = Document::parse_html(PAGE).unwrap();
        let mut encoder = encoder(&doc, "text/html", EncoderFlags::empty());
        let first = encoder.encode().unwrap();
        let second = encoder.encode().unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first,
            "<html><head><title>t</title></head>\
<body><p id=\"p\">Hello <b>world</b>!</p><div id=\"d\"><i>a</i>b</div></body></html>"
        );
    }

    #[test]
    fn test_scope_is_cleared_after_pass() {
        let doc = Document::parse_html(PAGE).unwrap();
        let mut encoder = encoder(&doc, "text/html", EncoderFlags::empty());
        encoder.set_node(doc.element_by_id("d").unwrap());
        assert_eq!(encoder.encode().unwrap(), "<div id=\"d\"><i>a</i>b</div>");
        assert_eq!(encoder.scope(), &EncodingScope::Document);
        assert!(encoder.encode().unwrap().starts_with("<html>"));
    }

    #[test]
    fn test_node_and_container_node() {
        let doc = Document::parse_html(PAGE).unwrap();
        let d = doc.element_by_id("d").unwrap();
        let mut encoder = encoder(&doc, "text/html", EncoderFlags::empty());
        encoder.set_container_node(d);
        assert_eq!(encoder.encode().unwrap(), "<i>a</i>b");
        encoder.set_container_node(d);
        encoder.set_invisibility_check(|_: &Document, _: NodeId| false);
        encoder.flags |= EncoderFlags::SKIP_INVISIBLE_CONTENT;
        assert_eq!(encoder.encode().unwrap(), "<i>a</i>b");
    }

    #[test]
    fn test_plain_text_document() {
        let doc = Document::parse_html(PAGE).unwrap();
        let mut encoder = encoder(&doc, "text/plain", EncoderFlags::empty());
        assert_eq!(encoder.encode().unwrap(), "Hello world!\nab");
    }

    #[test]
    fn test_max_length_limits_walk() {
        let doc = Document::parse_html("<p>one</p><p>two</p><p>three</p>").unwrap();
        let mut encoder = encoder(&doc, "text/html", EncoderFlags::empty());
        assert_eq!(encoder.encode_with_max_length(10).unwrap(), "<p>one</p>");
        assert_eq!(encoder.encode_with_max_length(5).unwrap(), "<p>on</p>");
        assert_eq!(
            encoder.encode_with_max_length(0).unwrap(),
            "<p>one</p><p>two</p><p>three</p>"
        );
    }

    #[test]
    fn test_range_inside_text_is_substring() {
        let doc = Document::parse_html(PAGE).unwrap();
        let p = doc.element_by_id("p").unwrap();
        let hello = doc.first_child(p).unwrap();
        let mut encoder = encoder(&doc, "text/html", EncoderFlags::empty());
        encoder.set_range(Range::new(Boundary::new(hello, 1), Boundary::new(hello, 4)));
        assert_eq!(encoder.encode().unwrap(), "ell");
    }

    #[test]
    fn test_collapsed_range_is_empty() {
        let doc = Document::parse_html(PAGE).unwrap();
        let p = doc.element_by_id("p").unwrap();
        let mut encoder = encoder(&doc, "text/html", EncoderFlags::empty());
        encoder.set_range(Range::new(Boundary::new(p, 1), Boundary::new(p, 1)));
        assert_eq!(encoder.encode().unwrap(), "");
    }

    #[test]
    fn test_contained_node_matches_node_encoding() {
        let doc = Document::parse_html(PAGE).unwrap();
        let d = doc.element_by_id("d").unwrap();
        let mut encoder = encoder(&doc, "text/html", EncoderFlags::empty());
        encoder.set_node(d);
        let alone = encoder.encode().unwrap();
        encoder.set_range(Range::select_node(&doc, d).unwrap());
        assert_eq!(encoder.encode().unwrap(), alone);
    }

    #[test]
    fn test_missing_document() {
        let mut encoder = DocumentEncoder::new();
        assert!(matches!(encoder.encode(), Err(EncodeError::NotInitialized)));
    }

    #[test]
    fn test_unsupported_format() {
        let doc = Document::parse_html(PAGE).unwrap();
        let mut encoder = encoder(&doc, "application/pdf", EncoderFlags::empty());
        assert!(matches!(
            encoder.encode(),
            Err(EncodeError::UnsupportedFormat(m)) if m == "application/pdf"
        ));
    }

    #[test]
    fn test_unknown_charset() {
        let mut encoder = DocumentEncoder::new();
        assert!(matches!(
            encoder.set_charset("no-such-charset"),
            Err(EncodeError::EncodingUnsupported(_))
        ));
        encoder.set_charset("latin1").unwrap();
        assert_eq!(encoder.charset(), encoding_rs::WINDOWS_1252);
    }

    #[test]
    fn test_requires_reinit_releases_document() {
        let doc = Document::parse_html(PAGE).unwrap();
        let mut encoder = encoder(&doc, "text/html", EncoderFlags::REQUIRES_REINIT_AFTER_OUTPUT);
        encoder.encode().unwrap();
        assert!(matches!(encoder.encode(), Err(EncodeError::NotInitialized)));
    }

    #[test]
    fn test_skip_invisible_content() {
        let doc = Document::parse_html(
            "<p>a<span hidden>b</span><span style=\"color: red; display : none\">c</span>d</p>",
        )
        .unwrap();
        let mut encoder = encoder(&doc, "text/html", EncoderFlags::SKIP_INVISIBLE_CONTENT);
        assert_eq!(encoder.encode().unwrap(), "<p>ad</p>");
    }

    #[test]
    fn test_xml_declaration_rewrite() {
        let markup = "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><r><e/></r>";
        let doc = Document::parse_xml(markup).unwrap();
        let mut encoder = encoder(&doc, "application/xml", EncoderFlags::empty());
        assert_eq!(
            encoder.encode().unwrap(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<r><e/></r>"
        );
        let mut encoder = DocumentEncoder::new();
        encoder.init(
            &doc,
            "application/xml",
            EncoderFlags::OUTPUT_DONT_REWRITE_ENCODING_DECLARATION,
        );
        assert_eq!(
            encoder.encode().unwrap(),
            "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<r><e/></r>"
        );
    }

    #[test]
    fn test_stream_matches_string() {
        let doc = Document::parse_html(PAGE).unwrap();
        let mut encoder = encoder(&doc, "text/html", EncoderFlags::empty());
        let expected = encoder.encode().unwrap();
        let mut sink = Vec::new();
        encoder.encode_to_stream(&mut sink).unwrap();
        assert_eq!(String::from_utf8(sink).unwrap(), expected);
    }

    #[test]
    fn test_is_hidden() {
        let doc = Document::parse_html(
            "<p id=a hidden></p><p id=b style=\"display:none\"></p>\
<p id=c style=\"display:block\"></p><script id=s></script>",
        )
        .unwrap();
        assert!(is_hidden(&doc, doc.element_by_id("a").unwrap()));
        assert!(is_hidden(&doc, doc.element_by_id("b").unwrap()));
        assert!(!is_hidden(&doc, doc.element_by_id("c").unwrap()));
        assert!(is_hidden(&doc, doc.element_by_id("s").unwrap()));
        assert!(!is_hidden(&doc, doc.root()));
    }

    #[test]
    #[should_panic(expected = "encode pass started while another pass was active")]
    fn test_pass_cannot_start_inside_another() {
        let doc = Document::parse_html(PAGE).unwrap();
        let mut encoder = encoder(&doc, "text/html", EncoderFlags::empty());
        // State of an encoder whose pass never ended.
        encoder.in_pass = true;
        let _ = encoder.encode();
    }

    #[test]
    fn test_failed_pass_ends_the_pass() {
        let markup = format!("<p>{}</p><p>tail</p>", "x".repeat(2000));
        let doc = Document::parse_html(&markup).unwrap();
        let mut encoder = encoder(&doc, "text/html", EncoderFlags::empty());
        let mut sink = FailingWrite;
        assert!(encoder.encode_to_stream(&mut sink).is_err());
        assert!(!encoder.in_pass);
        assert!(encoder.encode().is_ok());
    }

    struct FailingWrite;

    impl std::io::Write for FailingWrite {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_context_depth_display() {
        assert_eq!(ContextInfoDepth { start: 2, end: 0 }.to_string(), "2,0");
    }
}
