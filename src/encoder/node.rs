//! Single-subtree serialization.
//!
//! [`NodeSerializer`] bundles everything one encode pass needs to emit node
//! events: the document, the content serializer, the output buffer, the
//! pass configuration, the optional fixup hook and the invisibility check.
//! The range walker and the selection walker drive it.

use crate::encoding::TextStreamer;
use crate::error::EncodeError;
use crate::serial::ContentSerializer;
use crate::tree::{Document, NodeId, NodeKind, TreeKind};

use super::{EncoderFlags, NodeFixup};

/// Predicate telling whether a node is not rendered.
pub type InvisibilityCheck<'a> = dyn Fn(&Document, NodeId) -> bool + 'a;

/// Immutable settings for one encode pass.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SerializeConfig {
    pub(crate) flags: EncoderFlags,
    pub(crate) tree: TreeKind,
    pub(crate) needs_preformat_scan: bool,
}

impl SerializeConfig {
    pub(crate) fn new(flags: EncoderFlags, needs_preformat_scan: bool) -> Self {
        let tree = if flags.contains(EncoderFlags::ALLOW_CROSS_SHADOW_BOUNDARY) {
            TreeKind::Flat
        } else {
            TreeKind::Light
        };
        Self {
            flags,
            tree,
            needs_preformat_scan,
        }
    }
}

pub(crate) struct NodeSerializer<'p, 's> {
    pub(crate) doc: &'p Document,
    serializer: &'p mut dyn ContentSerializer,
    out: &'p mut String,
    pub(crate) config: &'p SerializeConfig,
    fixup: Option<&'p dyn NodeFixup>,
    invisibility: &'p InvisibilityCheck<'p>,
    streamer: Option<&'p mut TextStreamer<'s>>,
    /// Chars produced so far, including those already handed to the
    /// streamer, up to byte `counted_bytes` of the current buffer.
    counted_chars: usize,
    counted_bytes: usize,
}

impl<'p, 's> NodeSerializer<'p, 's> {
    pub(crate) fn new(
        doc: &'p Document,
        serializer: &'p mut dyn ContentSerializer,
        out: &'p mut String,
        config: &'p SerializeConfig,
        fixup: Option<&'p dyn NodeFixup>,
        invisibility: &'p InvisibilityCheck<'p>,
        streamer: Option<&'p mut TextStreamer<'s>>,
    ) -> Self {
        Self {
            doc,
            serializer,
            out,
            config,
            fixup,
            invisibility,
            streamer,
            counted_chars: 0,
            counted_bytes: 0,
        }
    }

    pub(crate) fn is_streaming(&self) -> bool {
        self.streamer.is_some()
    }

    /// Length of the output produced so far in this pass, in chars. Only
    /// the text appended since the previous call is scanned.
    fn output_length(&mut self) -> usize {
        let fresh = self.out.get(self.counted_bytes..).unwrap_or_default();
        self.counted_chars += fresh.chars().count();
        self.counted_bytes = self.out.len();
        self.counted_chars
    }

    /// Hands the buffer to the streamer once it is long enough.
    fn flush_if_long_enough(&mut self) -> Result<(), EncodeError> {
        if self.streamer.is_none() {
            return Ok(());
        }
        // The buffer may be cleared below; account for it first.
        self.output_length();
        let result = match self.streamer.as_deref_mut() {
            Some(streamer) => streamer.flush_if_long_enough(self.out),
            None => Ok(()),
        };
        self.counted_bytes = self.out.len();
        result
    }

    /// Whether `node` is skipped as invisible. Shadow roots take the
    /// visibility of their host.
    pub(crate) fn is_invisible(&self, node: NodeId) -> bool {
        if !self.config.flags.contains(EncoderFlags::SKIP_INVISIBLE_CONTENT) {
            return false;
        }
        let target = self.doc.shadow_host(node).unwrap_or(node);
        (self.invisibility)(self.doc, target)
    }

    /// Whether a text node is skipped because its parent is invisible.
    pub(crate) fn has_invisible_parent(&self, text: NodeId) -> bool {
        if !self.config.flags.contains(EncoderFlags::SKIP_INVISIBLE_CONTENT) {
            return false;
        }
        self.doc.parent(text).map_or(true, |parent| self.is_invisible(parent))
    }

    /// Picks the node to render for `node`: an explicit `fixup_node`, else
    /// the hook's replacement, else `node` itself. The flag asks for the
    /// replacement's children to be walked instead of the original's.
    fn resolve_fixup(&self, node: NodeId, fixup_node: Option<NodeId>) -> (NodeId, bool) {
        if let Some(fixed) = fixup_node {
            return (fixed, false);
        }
        match self.fixup {
            Some(hook) => {
                let (replacement, serialize_children) = hook.fixup(self.doc, node);
                match replacement {
                    Some(fixed) => (fixed, serialize_children),
                    None => (node, false),
                }
            }
            None => (node, false),
        }
    }

    fn preformat_target(&self, node: NodeId) -> Option<NodeId> {
        if !self.config.needs_preformat_scan {
            return None;
        }
        match self.doc.node(node).kind {
            NodeKind::Element { .. } => Some(node),
            NodeKind::Text { .. } | NodeKind::CData { .. } => {
                self.doc.parent(node).filter(|&p| self.doc.is_element(p))
            }
            _ => None,
        }
    }

    pub(crate) fn append_document_start(&mut self) -> Result<(), EncodeError> {
        self.serializer.append_document_start(self.doc, self.out)
    }

    /// Emits the opening event for `node`. Character data gets the char
    /// range `[start, end)`.
    pub(crate) fn serialize_node_start(
        &mut self,
        node: NodeId,
        start: usize,
        end: Option<usize>,
        fixup_node: Option<NodeId>,
    ) -> Result<(), EncodeError> {
        if let Some(element) = self.preformat_target(node) {
            self.serializer.scan_element_for_preformat(self.doc, element);
        }
        if self.is_invisible(node) {
            return Ok(());
        }
        let (fixed, _) = self.resolve_fixup(node, fixup_node);
        let doc = self.doc;
        match &doc.node(fixed).kind {
            NodeKind::Element { .. } => {
                let drop_breaks =
                    EncoderFlags::OUTPUT_PREFORMATTED | EncoderFlags::OUTPUT_DROP_INVISIBLE_BREAK;
                if self.config.flags.intersects(drop_breaks) && doc.is_invisible_break(fixed) {
                    return Ok(());
                }
                self.serializer.append_element_start(doc, fixed, node, self.out)
            }
            NodeKind::Text { .. } => {
                self.serializer.append_text(doc, fixed, start, end, self.out)
            }
            NodeKind::CData { .. } => {
                self.serializer.append_cdata(doc, fixed, start, end, self.out)
            }
            NodeKind::ProcessingInstruction { .. } => self
                .serializer
                .append_processing_instruction(doc, fixed, start, end, self.out),
            NodeKind::Comment { .. } => {
                self.serializer.append_comment(doc, fixed, start, end, self.out)
            }
            NodeKind::DocumentType { .. } => self.serializer.append_doctype(doc, fixed, self.out),
            NodeKind::Document
            | NodeKind::DocumentFragment { .. }
            | NodeKind::ShadowRoot { .. } => Ok(()),
        }
    }

    /// Emits the closing event for `node` (elements only).
    pub(crate) fn serialize_node_end(
        &mut self,
        node: NodeId,
        fixup_node: Option<NodeId>,
    ) -> Result<(), EncodeError> {
        if let Some(element) = self.preformat_target(node) {
            self.serializer.forget_element_for_preformat(self.doc, element);
        }
        if self.is_invisible(node) {
            return Ok(());
        }
        let (fixed, _) = self.resolve_fixup(node, fixup_node);
        if self.doc.is_element(fixed) {
            self.serializer.append_element_end(self.doc, fixed, node, self.out)?;
        }
        Ok(())
    }

    /// Emits `[start, end)` of a single text node.
    pub(crate) fn serialize_text_node(
        &mut self,
        node: NodeId,
        start: usize,
        end: Option<usize>,
    ) -> Result<(), EncodeError> {
        self.serialize_node_start(node, start, end, None)?;
        self.serialize_node_end(node, None)
    }

    /// Children a recursive walk descends into.
    fn walk_children(&self, node: NodeId) -> Vec<NodeId> {
        let doc = self.doc;
        if self.config.tree == TreeKind::Flat
            && doc.is_slot(node)
            && !doc.assigned_nodes(node).is_empty()
        {
            return doc.assigned_nodes(node).to_vec();
        }
        std::iter::successors(doc.first_child_of_template_or_node(node), |&c| {
            doc.next_sibling(c)
        })
        .collect()
    }

    /// Depth-first walk of `node`'s subtree, emitting `node` itself only when
    /// `include_root` is set. Stops descending once `max_length` chars have
    /// been produced.
    pub(crate) fn serialize_to_string_recursive(
        &mut self,
        node: NodeId,
        include_root: bool,
        max_length: Option<usize>,
    ) -> Result<(), EncodeError> {
        let produced = match max_length {
            Some(max) => {
                let produced = self.output_length();
                if produced >= max {
                    return Ok(());
                }
                Some(max - produced)
            }
            None => None,
        };

        if self.is_invisible(node) {
            return Ok(());
        }

        let (fixed, serialize_fixup_children) = self.resolve_fixup(node, None);

        if include_root {
            self.serialize_node_start(node, 0, produced, Some(fixed))?;
        }

        let shadow = match self.config.tree {
            TreeKind::Flat => self.doc.shadow_root(node),
            TreeKind::Light => None,
        };
        // Slotted light children are reached through their slot.
        let parent = match shadow {
            Some(shadow) => shadow,
            None if serialize_fixup_children => fixed,
            None => node,
        };
        for child in self.walk_children(parent) {
            self.serialize_to_string_recursive(child, true, max_length)?;
        }

        if include_root {
            self.serialize_node_end(node, Some(fixed))?;
        }

        self.flush_if_long_enough()
    }

    /// Loop-based walk of the subtree below `root` (exclusive). Used when no
    /// fixup, filtering or streaming is active.
    pub(crate) fn serialize_to_string_iterative(
        &mut self,
        root: NodeId,
    ) -> Result<(), EncodeError> {
        let doc = self.doc;
        let mut next = doc.first_child_of_template_or_node(root);
        while let Some(mut current) = next {
            self.serialize_node_start(current, 0, None, Some(current))?;
            next = doc.first_child_of_template_or_node(current);
            while next.is_none() && current != root {
                self.serialize_node_end(current, Some(current))?;
                next = doc.next_sibling(current);
                if next.is_none() {
                    let Some(parent) = doc.parent(current) else {
                        break;
                    };
                    current = parent;
                    if current != root {
                        if let Some(template) = doc.template_host(current) {
                            current = template;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
