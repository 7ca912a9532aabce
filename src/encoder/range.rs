//! Range-bounded and selection walks.
//!
//! [`RangeSerializer`] splits the subtree under a range's common ancestor
//! into fully contained nodes (handed whole to the node walker) and
//! partially contained nodes (walked again with narrowed child windows).
//! [`RangeContextSerializer`] wraps the fragment in the ancestor tags chosen
//! by the encoder's [`RangeNodeContext`].

use crate::error::EncodeError;
use crate::range::{AncestorChain, Range, Selection};
use crate::tree::{Document, NodeId, TreeKind};

use super::node::NodeSerializer;
use super::{ContextInfoDepth, RangeNodeContext};

/// Stack of ancestor lists opened around range fragments.
#[derive(Debug, Default)]
pub(crate) struct RangeContextSerializer {
    /// Suppresses both `start` and `end` while a table-row block is open.
    pub(crate) disabled: bool,
    contexts: Vec<Vec<NodeId>>,
}

impl RangeContextSerializer {
    /// Emits start tags for the context ancestors in `ancestors` (innermost
    /// first), outermost first.
    pub(crate) fn start(
        &mut self,
        ns: &mut NodeSerializer<'_, '_>,
        strategy: &dyn RangeNodeContext,
        ancestors: &[NodeId],
    ) -> Result<(), EncodeError> {
        if self.disabled {
            return Ok(());
        }
        let immediate = strategy.immediate_context_count(ns.doc, ancestors);
        let mut serialized = Vec::new();
        let mut result = Ok(());
        for (i, &node) in ancestors.iter().enumerate().rev() {
            if strategy.include_in_context(ns.doc, node) || i < immediate {
                serialized.push(node);
                result = ns.serialize_node_start(node, 0, None, None);
                if result.is_err() {
                    break;
                }
            }
        }
        tracing::trace!(count = serialized.len(), "opened range context");
        self.contexts.push(serialized);
        result
    }

    /// Closes the most recently opened context.
    ///
    /// # Panics
    ///
    /// Panics if no context is open and serialization is not disabled.
    pub(crate) fn end(&mut self, ns: &mut NodeSerializer<'_, '_>) -> Result<(), EncodeError> {
        if self.disabled {
            return Ok(());
        }
        let Some(serialized) = self.contexts.pop() else {
            panic!("ending a range context that was never started");
        };
        for &node in serialized.iter().rev() {
            ns.serialize_node_end(node, None)?;
        }
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.contexts.clear();
        self.disabled = false;
    }
}

/// Per-range walk state.
#[derive(Debug, Default)]
pub(crate) struct RangeSerializer {
    common_ancestor: Option<NodeId>,
    /// Inclusive ancestors of the last walked range's common ancestor,
    /// innermost first.
    pub(crate) common_inclusive_ancestors: Vec<NodeId>,
    pub(crate) context_depth: ContextInfoDepth,
    range: Option<Range>,
    start_chain: AncestorChain,
    end_chain: AncestorChain,
    start_root_index: Option<usize>,
    end_root_index: Option<usize>,
    /// Set once a context-worthy ancestor is entered; stops depth counting
    /// for the rest of the pass.
    halt_range_hint: bool,
}

impl RangeSerializer {
    /// The start and end boundary ancestors `depth` levels below the common
    /// ancestor, if the chains reach that far.
    fn boundary_nodes_at(&self, depth: usize) -> (Option<NodeId>, Option<NodeId>) {
        let at = |chain: &AncestorChain, root: Option<usize>| {
            root.and_then(|r| r.checked_sub(depth))
                .and_then(|i| chain.nodes.get(i).copied())
        };
        (
            at(&self.start_chain, self.start_root_index),
            at(&self.end_chain, self.end_root_index),
        )
    }

    fn chain_offset(chain: &AncestorChain, root: Option<usize>, depth: usize) -> Option<usize> {
        root.and_then(|r| r.checked_sub(depth))
            .and_then(|i| chain.offsets.get(i).copied().flatten())
    }

    /// Serializes one range, wrapped in its context.
    pub(crate) fn serialize_range_to_string(
        &mut self,
        ns: &mut NodeSerializer<'_, '_>,
        context: &mut RangeContextSerializer,
        strategy: &dyn RangeNodeContext,
        range: &Range,
    ) -> Result<(), EncodeError> {
        if range.collapsed() {
            return Ok(());
        }
        let doc = ns.doc;
        let tree = ns.config.tree;
        let Some(common) = range.common_ancestor(doc, tree) else {
            tracing::debug!(?range, "range boundaries share no ancestor");
            return Ok(());
        };

        self.common_ancestor = Some(common);
        self.context_depth = ContextInfoDepth::default();
        self.common_inclusive_ancestors = doc.inclusive_ancestors(common);
        self.start_chain = AncestorChain::compute(doc, range.start, tree);
        self.end_chain = AncestorChain::compute(doc, range.end, tree);
        self.start_root_index = self.start_chain.position(common);
        self.end_root_index = self.end_chain.position(common);
        self.range = Some(*range);
        tracing::trace!(?common, ?range, "serializing range");

        context.start(ns, strategy, &self.common_inclusive_ancestors)?;

        let (start, end) = (range.start, range.end);
        if start.container == end.container && doc.is_text(start.container) {
            if !ns.has_invisible_parent(start.container) {
                ns.serialize_text_node(start.container, start.offset, Some(end.offset))?;
            }
        } else {
            self.serialize_range_nodes(ns, strategy, common, 0)?;
        }

        context.end(ns)
    }

    fn serialize_range_nodes(
        &mut self,
        ns: &mut NodeSerializer<'_, '_>,
        strategy: &dyn RangeNodeContext,
        node: NodeId,
        depth: usize,
    ) -> Result<(), EncodeError> {
        if ns.is_invisible(node) {
            return Ok(());
        }
        let (start_node, end_node) = self.boundary_nodes_at(depth);
        if start_node != Some(node) && end_node != Some(node) {
            return ns.serialize_to_string_recursive(node, true, None);
        }
        self.serialize_node_partially_contained(ns, strategy, node, start_node, end_node, depth)
    }

    fn serialize_node_partially_contained(
        &mut self,
        ns: &mut NodeSerializer<'_, '_>,
        strategy: &dyn RangeNodeContext,
        node: NodeId,
        start_node: Option<NodeId>,
        end_node: Option<NodeId>,
        depth: usize,
    ) -> Result<(), EncodeError> {
        let Some(range) = self.range else {
            return Ok(());
        };
        let doc = ns.doc;
        let is_start = start_node == Some(node);
        let is_end = end_node == Some(node);

        if doc.is_text(node) {
            let start = if is_start { range.start.offset } else { 0 };
            let end = is_end.then_some(range.end.offset);
            return ns.serialize_text_node(node, start, end);
        }

        let is_common = self.common_ancestor == Some(node);
        if !is_common {
            if strategy.include_in_context(doc, node) {
                self.halt_range_hint = true;
            }
            if !self.halt_range_hint {
                if is_start {
                    self.context_depth.start += 1;
                }
                if is_end {
                    self.context_depth.end += 1;
                }
            }
            ns.serialize_node_start(node, 0, None, None)?;
        }

        let start_offset = if is_start {
            Self::chain_offset(&self.start_chain, self.start_root_index, depth)
        } else {
            None
        };
        let end_offset = if is_end {
            Self::chain_offset(&self.end_chain, self.end_root_index, depth)
        } else {
            None
        };
        let start_offset = start_offset.unwrap_or(0);
        // Intermediate chain offsets point at the ancestor itself; the window
        // must reach one past it.
        let end_offset = match end_offset {
            None => doc.child_count_in(node, ns.config.tree),
            Some(offset) if node != range.end.container => offset + 1,
            Some(offset) => offset,
        };

        self.serialize_children_of_content(ns, strategy, node, start_offset, end_offset, depth)?;

        if !is_common {
            ns.serialize_node_end(node, None)?;
        }
        Ok(())
    }

    fn serialize_children_of_content(
        &mut self,
        ns: &mut NodeSerializer<'_, '_>,
        strategy: &dyn RangeNodeContext,
        node: NodeId,
        start: usize,
        end: usize,
        depth: usize,
    ) -> Result<(), EncodeError> {
        let doc = ns.doc;
        let tree = ns.config.tree;
        if tree == TreeKind::Flat {
            // Slotted light children are rendered through their slot.
            if let Some(shadow) = doc.shadow_root(node) {
                return self.serialize_range_nodes(ns, strategy, shadow, depth + 1);
            }
        }
        if end == 0 {
            return Ok(());
        }
        let children = doc.children_in(node, tree);
        for j in start..end {
            let Some(&child) = children.get(j) else {
                break;
            };
            if j == start || j == end - 1 {
                self.serialize_range_nodes(ns, strategy, child, depth + 1)?;
            } else {
                ns.serialize_to_string_recursive(child, true, None)?;
            }
        }
        Ok(())
    }

    /// Serializes every range of `selection` in order.
    ///
    /// Consecutive ranges starting in `<tr>` rows share one table context:
    /// it is opened before the first row and closed after the last, with
    /// per-range context suppressed in between. The reported start depth is
    /// the first range's.
    pub(crate) fn serialize_selection(
        &mut self,
        ns: &mut NodeSerializer<'_, '_>,
        context: &mut RangeContextSerializer,
        strategy: &dyn RangeNodeContext,
        selection: &Selection,
    ) -> Result<(), EncodeError> {
        let doc = ns.doc;
        let mut prev_row: Option<NodeId> = None;
        let mut first_start_depth = 0;

        for (i, range) in selection.ranges().iter().enumerate() {
            let node = range.start.container;
            if Some(node) != prev_row {
                if let Some(prev) = prev_row {
                    ns.serialize_node_end(prev, None)?;
                }
                if is_table_row(doc, node) {
                    if prev_row.is_none() {
                        self.common_inclusive_ancestors = parent_inclusive_ancestors(doc, node);
                        context.start(ns, strategy, &self.common_inclusive_ancestors)?;
                        context.disabled = true;
                    }
                    ns.serialize_node_start(node, 0, None, None)?;
                    prev_row = Some(node);
                } else if let Some(prev) = prev_row.take() {
                    context.disabled = false;
                    self.common_inclusive_ancestors = parent_inclusive_ancestors(doc, prev);
                    context.end(ns)?;
                }
            }

            self.serialize_range_to_string(ns, context, strategy, range)?;
            if i == 0 {
                first_start_depth = self.context_depth.start;
            }
        }
        self.context_depth.start = first_start_depth;

        if let Some(prev) = prev_row {
            ns.serialize_node_end(prev, None)?;
            context.disabled = false;
            self.common_inclusive_ancestors = parent_inclusive_ancestors(doc, prev);
            context.end(ns)?;
        }
        context.disabled = false;
        Ok(())
    }
}

/// A `<tr>` that is not nested directly in another `<tr>`.
fn is_table_row(doc: &Document, node: NodeId) -> bool {
    doc.is_element_named(node, "tr")
        && !doc
            .parent(node)
            .is_some_and(|p| doc.is_element_named(p, "tr"))
}

fn parent_inclusive_ancestors(doc: &Document, node: NodeId) -> Vec<NodeId> {
    doc.parent(node)
        .map(|parent| doc.inclusive_ancestors(parent))
        .unwrap_or_default()
}
