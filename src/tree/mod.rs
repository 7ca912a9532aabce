//! Arena-based document tree.
//!
//! All nodes live in a contiguous `Vec<NodeData>` owned by the `Document`, and
//! are referenced by `NodeId`, a newtype over `NonZeroU32`. The encoder only
//! ever borrows the tree, so parent, host and slot back-links are plain
//! indices and never form ownership cycles.
//!
//! # Light and flattened trees
//!
//! Besides the ordinary ("light") child lists, the document records shadow
//! roots attached to hosts, the nodes assigned to each `<slot>`, and the
//! content fragment of each `<template>`. The `*_in` navigation methods take a
//! [`TreeKind`] and answer either for the light tree or for the flattened
//! tree, where a shadow host's only child is its shadow root and a slot's
//! children are its assigned nodes.

pub mod markup;
mod node;

pub use node::NodeKind;

use std::collections::{HashMap, HashSet};
use std::num::NonZeroU32;

/// A typed index into the document's node arena.
///
/// `NodeId` is a newtype over `NonZeroU32`, meaning it can never be zero
/// and `Option<NodeId>` has the same size as `NodeId` (niche optimization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// Creates a `NodeId` from a raw index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0.
    #[allow(clippy::expect_used, clippy::cast_possible_truncation)]
    fn from_index(index: usize) -> Self {
        Self(NonZeroU32::new(index as u32).expect("NodeId index must be non-zero"))
    }

    fn as_index(self) -> usize {
        self.0.get() as usize
    }
}

/// Which view of the tree a walk or a boundary refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TreeKind {
    /// Ordinary child lists. Shadow roots are separate trees.
    #[default]
    Light,
    /// Shadow-including view: hosts contain their shadow root, slots contain
    /// their assigned nodes.
    Flat,
}

/// Storage for a single node in the document arena.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// What kind of node this is and its payload.
    pub kind: NodeKind,
    /// Parent node, if any. Document, fragment and shadow root nodes have none.
    pub parent: Option<NodeId>,
    /// First child node.
    pub first_child: Option<NodeId>,
    /// Last child node (for O(1) append).
    pub last_child: Option<NodeId>,
    /// Next sibling.
    pub next_sibling: Option<NodeId>,
    /// Previous sibling.
    pub prev_sibling: Option<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            prev_sibling: None,
        }
    }
}

/// An attribute on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// The attribute name as written (including any prefix).
    pub name: String,
    /// The attribute value (character references resolved).
    pub value: String,
}

impl Attribute {
    /// Creates an attribute from a name/value pair.
    #[must_use]
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// A document tree.
///
/// The `Document` owns all nodes in an arena and provides methods for
/// tree navigation and mutation.
///
/// # Examples
///
/// ```
/// use docencode::Document;
///
/// let doc = Document::parse_html("<p id=a>hi</p>").unwrap();
/// let p = doc.element_by_id("a").unwrap();
/// assert_eq!(doc.node_name(p), Some("p"));
/// ```
#[derive(Debug)]
pub struct Document {
    /// The node arena. Index 0 is unused (placeholder for `NonZeroU32`).
    nodes: Vec<NodeData>,
    root: NodeId,
    /// Whether this is an HTML document (as opposed to generic XML).
    pub is_html: bool,
    /// Whether scripting is enabled for this document.
    pub scripting_enabled: bool,
    /// Whether the whole document is editable (`designMode`).
    pub design_mode: bool,
    /// Base URL used to absolutize links.
    pub base_url: Option<String>,
    /// Character set declared by the document, if known.
    pub encoding: Option<String>,
    id_map: HashMap<String, NodeId>,
    shadow_roots: HashMap<NodeId, NodeId>,
    template_contents: HashMap<NodeId, NodeId>,
    assigned_nodes: HashMap<NodeId, Vec<NodeId>>,
    assigned_slot: HashMap<NodeId, NodeId>,
    padding_breaks: HashSet<NodeId>,
}

impl Document {
    /// Creates a new empty document containing only the Document node.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(64);
        // Index 0: placeholder (NodeId uses NonZeroU32)
        nodes.push(NodeData::new(NodeKind::Document));
        nodes.push(NodeData::new(NodeKind::Document));
        Self {
            nodes,
            root: NodeId::from_index(1),
            is_html: false,
            scripting_enabled: true,
            design_mode: false,
            base_url: None,
            encoding: None,
            id_map: HashMap::new(),
            shadow_roots: HashMap::new(),
            template_contents: HashMap::new(),
            assigned_nodes: HashMap::new(),
            assigned_slot: HashMap::new(),
            padding_breaks: HashSet::new(),
        }
    }

    /// Creates a new empty HTML document.
    #[must_use]
    pub fn new_html() -> Self {
        Self {
            is_html: true,
            ..Self::new()
        }
    }

    /// Returns the document root node id.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the first top-level element of the document.
    #[must_use]
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.root).find(|&id| self.is_element(id))
    }

    /// Returns a reference to the `NodeData` for the given node.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not refer to a valid node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.as_index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.as_index()]
    }

    /// Returns the name of an element or the target of a PI.
    #[must_use]
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { name, .. }
            | NodeKind::ProcessingInstruction { target: name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns the text of a text, comment, or CDATA node (or PI data).
    #[must_use]
    pub fn node_text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text { content }
            | NodeKind::Comment { content }
            | NodeKind::CData { content } => Some(content),
            NodeKind::ProcessingInstruction { data, .. } => data.as_deref(),
            _ => None,
        }
    }

    /// Returns the length in chars of a character-data node, or 0.
    #[must_use]
    pub fn text_len(&self, id: NodeId) -> usize {
        self.node_text(id).map_or(0, |t| t.chars().count())
    }

    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Element { .. })
    }

    /// Returns `true` for text and CDATA nodes.
    #[must_use]
    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(
            self.node(id).kind,
            NodeKind::Text { .. } | NodeKind::CData { .. }
        )
    }

    /// Returns `true` if `id` is an element whose name matches `name`
    /// (ASCII case-insensitively).
    #[must_use]
    pub fn is_element_named(&self, id: NodeId, name: &str) -> bool {
        match &self.node(id).kind {
            NodeKind::Element { name: n, .. } => n.eq_ignore_ascii_case(name),
            _ => false,
        }
    }

    /// Returns the lowercased local name of an element, or `None`.
    #[must_use]
    pub fn local_name(&self, id: NodeId) -> Option<String> {
        match &self.node(id).kind {
            NodeKind::Element { name, .. } => {
                let local = name.rsplit(':').next().unwrap_or(name);
                Some(local.to_ascii_lowercase())
            }
            _ => None,
        }
    }

    /// Returns the attributes of an element node.
    ///
    /// Returns an empty slice for non-element nodes.
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match &self.node(id).kind {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Returns the value of an attribute by name on an element node.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    // --- ID lookup ---

    /// Associates an ID value with an element node.
    pub fn set_id(&mut self, id: &str, node: NodeId) {
        self.id_map.insert(id.to_string(), node);
    }

    /// Looks up an element by its `id` attribute value.
    #[must_use]
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.id_map.get(id).copied()
    }

    // --- Light-tree navigation ---

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    /// Returns an iterator over the children of a node.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.node(id).first_child,
        }
    }

    /// Returns an iterator over a node and its ancestors (walking up to root).
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: Some(id),
        }
    }

    /// Returns an iterator over all descendants of a node (depth-first).
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            root: id,
            next: self.first_child(id),
        }
    }

    /// Collects a node and its light-tree ancestors, innermost first.
    #[must_use]
    pub fn inclusive_ancestors(&self, id: NodeId) -> Vec<NodeId> {
        self.ancestors(id).collect()
    }

    /// Returns the first child of a node, looking into the content fragment
    /// when the node is a `<template>`.
    #[must_use]
    pub fn first_child_of_template_or_node(&self, id: NodeId) -> Option<NodeId> {
        match self.template_contents.get(&id) {
            Some(&content) => self.first_child(content),
            None => self.first_child(id),
        }
    }

    // --- Mutation ---

    /// Allocates a new node in the arena and returns its `NodeId`.
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let index = self.nodes.len();
        self.nodes.push(NodeData::new(kind));
        NodeId::from_index(index)
    }

    /// Appends a child node to the end of a parent's child list.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(
            self.node(child).parent.is_none(),
            "child already has a parent; detach it first"
        );

        self.node_mut(child).parent = Some(parent);

        if let Some(last) = self.node(parent).last_child {
            self.node_mut(last).next_sibling = Some(child);
            self.node_mut(child).prev_sibling = Some(last);
            self.node_mut(parent).last_child = Some(child);
        } else {
            self.node_mut(parent).first_child = Some(child);
            self.node_mut(parent).last_child = Some(child);
        }
    }

    // --- Shadow trees, slots, templates ---

    /// Attaches a new, empty shadow root to `host` and returns it. An existing
    /// shadow root is returned unchanged.
    pub fn attach_shadow(&mut self, host: NodeId) -> NodeId {
        if let Some(&root) = self.shadow_roots.get(&host) {
            return root;
        }
        let root = self.create_node(NodeKind::ShadowRoot { host });
        self.shadow_roots.insert(host, root);
        root
    }

    /// Returns the shadow root attached to `host`, if any.
    #[must_use]
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.shadow_roots.get(&host).copied()
    }

    /// Returns the host of a shadow root, or `None` for any other node.
    #[must_use]
    pub fn shadow_host(&self, id: NodeId) -> Option<NodeId> {
        match self.node(id).kind {
            NodeKind::ShadowRoot { host } => Some(host),
            _ => None,
        }
    }

    /// Returns the content fragment of a `<template>`, creating it on first use.
    pub fn template_content_mut(&mut self, template: NodeId) -> NodeId {
        if let Some(&content) = self.template_contents.get(&template) {
            return content;
        }
        let content = self.create_node(NodeKind::DocumentFragment {
            host: Some(template),
        });
        self.template_contents.insert(template, content);
        content
    }

    #[must_use]
    pub fn template_content(&self, template: NodeId) -> Option<NodeId> {
        self.template_contents.get(&template).copied()
    }

    /// Returns the `<template>` owning a content fragment.
    #[must_use]
    pub fn template_host(&self, id: NodeId) -> Option<NodeId> {
        match self.node(id).kind {
            NodeKind::DocumentFragment { host } => host,
            _ => None,
        }
    }

    /// Returns `true` for `<slot>` elements.
    #[must_use]
    pub fn is_slot(&self, id: NodeId) -> bool {
        self.is_element_named(id, "slot")
    }

    /// Replaces the assigned nodes of `slot`.
    pub fn assign_slot(&mut self, slot: NodeId, nodes: Vec<NodeId>) {
        if let Some(previous) = self.assigned_nodes.remove(&slot) {
            for node in previous {
                self.assigned_slot.remove(&node);
            }
        }
        for &node in &nodes {
            self.assigned_slot.insert(node, slot);
        }
        self.assigned_nodes.insert(slot, nodes);
    }

    /// Recomputes slot assignment for every shadow host by name: a host child
    /// with `slot="x"` goes to the first `<slot name="x">` of the shadow tree,
    /// other element and non-whitespace text children go to the first unnamed
    /// slot.
    pub fn assign_slots(&mut self) {
        let mut hosts: Vec<(NodeId, NodeId)> =
            self.shadow_roots.iter().map(|(&h, &r)| (h, r)).collect();
        hosts.sort();
        for (host, root) in hosts {
            let slots: Vec<NodeId> = self.descendants(root).filter(|&n| self.is_slot(n)).collect();
            let mut assignment: Vec<(NodeId, Vec<NodeId>)> =
                slots.iter().map(|&s| (s, Vec::new())).collect();
            for child in self.children(host).collect::<Vec<_>>() {
                let wanted = if self.is_element(child) {
                    self.attribute(child, "slot").unwrap_or("")
                } else if self.is_text(child) && !self.text_is_only_whitespace(child) {
                    ""
                } else {
                    continue;
                };
                let target = assignment
                    .iter_mut()
                    .find(|(slot, _)| self.attribute(*slot, "name").unwrap_or("") == wanted);
                if let Some((_, nodes)) = target {
                    nodes.push(child);
                }
            }
            for (slot, nodes) in assignment {
                self.assign_slot(slot, nodes);
            }
        }
    }

    /// Returns the nodes assigned to a slot (empty if none).
    #[must_use]
    pub fn assigned_nodes(&self, slot: NodeId) -> &[NodeId] {
        self.assigned_nodes.get(&slot).map_or(&[], Vec::as_slice)
    }

    /// Returns the slot a node is assigned to, if any.
    #[must_use]
    pub fn assigned_slot(&self, id: NodeId) -> Option<NodeId> {
        self.assigned_slot.get(&id).copied()
    }

    /// Marks a `<br>` as an editor padding line break.
    pub fn mark_padding_break(&mut self, br: NodeId) {
        self.padding_breaks.insert(br);
    }

    #[must_use]
    pub fn is_padding_break(&self, id: NodeId) -> bool {
        self.padding_breaks.contains(&id)
    }

    // --- Tree-kind aware navigation ---

    /// Returns the parent of `id` in the given tree view.
    #[must_use]
    pub fn parent_in(&self, id: NodeId, tree: TreeKind) -> Option<NodeId> {
        if tree == TreeKind::Flat {
            if let Some(slot) = self.assigned_slot(id) {
                return Some(slot);
            }
            if let Some(host) = self.shadow_host(id) {
                return Some(host);
            }
        }
        self.parent(id)
    }

    /// Collects the children of `id` in the given tree view.
    ///
    /// In the flattened tree a slot without assigned nodes shows its fallback
    /// (light) children.
    #[must_use]
    pub fn children_in(&self, id: NodeId, tree: TreeKind) -> Vec<NodeId> {
        if tree == TreeKind::Flat {
            if let Some(root) = self.shadow_root(id) {
                return vec![root];
            }
            let assigned = self.assigned_nodes(id);
            if !assigned.is_empty() {
                return assigned.to_vec();
            }
        }
        self.children(id).collect()
    }

    #[must_use]
    pub fn child_count_in(&self, id: NodeId, tree: TreeKind) -> usize {
        match tree {
            TreeKind::Light => self.children(id).count(),
            TreeKind::Flat => self.children_in(id, tree).len(),
        }
    }

    #[must_use]
    pub fn child_at_in(&self, id: NodeId, index: usize, tree: TreeKind) -> Option<NodeId> {
        match tree {
            TreeKind::Light => self.children(id).nth(index),
            TreeKind::Flat => self.children_in(id, tree).get(index).copied(),
        }
    }

    /// Returns the position of `child` among the children of `parent`, or
    /// `None` when `child` is not a child of `parent` in that view.
    #[must_use]
    pub fn index_in(&self, parent: NodeId, child: NodeId, tree: TreeKind) -> Option<usize> {
        match tree {
            TreeKind::Light => self.children(parent).position(|c| c == child),
            TreeKind::Flat => self.children_in(parent, tree).iter().position(|&c| c == child),
        }
    }

    /// Returns `true` if `id` has any child in the given view.
    #[must_use]
    pub fn has_children_in(&self, id: NodeId, tree: TreeKind) -> bool {
        match tree {
            TreeKind::Light => self.first_child(id).is_some(),
            TreeKind::Flat => !self.children_in(id, tree).is_empty(),
        }
    }

    // --- Content predicates ---

    /// Returns `true` for a text node made only of HTML whitespace.
    ///
    /// Elements and other node kinds are never whitespace-only.
    #[must_use]
    pub fn text_is_only_whitespace(&self, id: NodeId) -> bool {
        match &self.node(id).kind {
            NodeKind::Text { content } => content.chars().all(is_html_whitespace),
            _ => false,
        }
    }

    /// Returns `true` if the node is editable: inside a `contenteditable`
    /// region or in a document in design mode.
    #[must_use]
    pub fn is_editable(&self, id: NodeId) -> bool {
        if self.design_mode {
            return true;
        }
        for ancestor in self.ancestors(id) {
            match self.attribute(ancestor, "contenteditable") {
                Some(v) if v.eq_ignore_ascii_case("false") => return false,
                Some(_) => return true,
                None => {}
            }
        }
        false
    }

    /// Returns `true` for the outermost element of an editable region.
    #[must_use]
    pub fn is_editing_host(&self, id: NodeId) -> bool {
        if !self.is_element(id) || !self.is_editable(id) {
            return false;
        }
        if self.design_mode {
            return self.is_element_named(id, "body");
        }
        self.parent(id).map_or(true, |p| !self.is_editable(p))
    }

    /// Returns `true` for an HTML block-level element.
    #[must_use]
    pub fn is_block_element(&self, id: NodeId) -> bool {
        self.local_name(id)
            .is_some_and(|name| crate::html::is_block_element(&name))
    }

    /// Returns `true` for a `<br>` that renders nothing: a padding break, or
    /// the last significant child of a block.
    #[must_use]
    pub fn is_invisible_break(&self, id: NodeId) -> bool {
        if !self.is_element_named(id, "br") {
            return false;
        }
        if self.is_padding_break(id) {
            return true;
        }
        let mut next = self.next_sibling(id);
        while let Some(sibling) = next {
            let insignificant = self.text_is_only_whitespace(sibling)
                || matches!(self.node(sibling).kind, NodeKind::Comment { .. });
            if !insignificant {
                return false;
            }
            next = self.next_sibling(sibling);
        }
        self.parent(id).map_or(true, |p| self.is_block_element(p))
    }

    /// Returns the total number of nodes in the arena (excluding placeholder).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// HTML whitespace: space, tab, LF, FF, CR.
#[must_use]
pub fn is_html_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0C' | '\r')
}

// --- Iterators ---

/// Iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).next_sibling;
        Some(current)
    }
}

/// Iterator over a node and its ancestors.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).parent;
        Some(current)
    }
}

/// Depth-first iterator over all descendants of a node.
pub struct Descendants<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        if let Some(child) = self.doc.first_child(current) {
            self.next = Some(child);
            return Some(current);
        }

        if let Some(sibling) = self.doc.next_sibling(current) {
            self.next = Some(sibling);
            return Some(current);
        }

        let mut ancestor = self.doc.parent(current);
        while let Some(anc) = ancestor {
            if anc == self.root {
                self.next = None;
                return Some(current);
            }
            if let Some(sibling) = self.doc.next_sibling(anc) {
                self.next = Some(sibling);
                return Some(current);
            }
            ancestor = self.doc.parent(anc);
        }

        self.next = None;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(doc: &mut Document, parent: NodeId, name: &str) -> NodeId {
        let id = doc.create_node(NodeKind::element(name, Vec::new()));
        doc.append_child(parent, id);
        id
    }

    fn text(doc: &mut Document, parent: NodeId, content: &str) -> NodeId {
        let id = doc.create_node(NodeKind::text(content));
        doc.append_child(parent, id);
        id
    }

    #[test]
    fn test_new_document_has_root() {
        let doc = Document::new();
        assert!(matches!(doc.node(doc.root()).kind, NodeKind::Document));
        assert_eq!(doc.node_count(), 1);
    }

    #[test]
    fn test_append_multiple_children() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = element(&mut doc, root, "a");
        let b = element(&mut doc, root, "b");
        let c = element(&mut doc, root, "c");
        assert_eq!(doc.children(root).collect::<Vec<_>>(), vec![a, b, c]);
        assert_eq!(doc.prev_sibling(c), Some(b));
        assert_eq!(doc.child_at_in(root, 1, TreeKind::Light), Some(b));
        assert_eq!(doc.index_in(root, c, TreeKind::Light), Some(2));
    }

    #[test]
    fn test_ancestors_iterator() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = element(&mut doc, root, "a");
        let b = element(&mut doc, a, "b");
        let t = text(&mut doc, b, "x");
        assert_eq!(doc.inclusive_ancestors(t), vec![t, b, a, root]);
    }

    #[test]
    fn test_flat_tree_navigation() {
        let mut doc = Document::new();
        let root = doc.root();
        let host = element(&mut doc, root, "div");
        let light = element(&mut doc, host, "span");
        let shadow = doc.attach_shadow(host);
        let slot = element(&mut doc, shadow, "slot");
        doc.assign_slots();

        assert_eq!(doc.assigned_nodes(slot), &[light]);
        assert_eq!(doc.children_in(host, TreeKind::Flat), vec![shadow]);
        assert_eq!(doc.children_in(slot, TreeKind::Flat), vec![light]);
        assert_eq!(doc.parent_in(light, TreeKind::Flat), Some(slot));
        assert_eq!(doc.parent_in(shadow, TreeKind::Flat), Some(host));
        assert_eq!(doc.parent_in(shadow, TreeKind::Light), None);
        assert_eq!(doc.index_in(host, light, TreeKind::Flat), None);
    }

    #[test]
    fn test_named_slot_assignment() {
        let mut doc = Document::new();
        let root = doc.root();
        let host = element(&mut doc, root, "div");
        let titled = doc.create_node(NodeKind::element(
            "h1",
            vec![Attribute::new("slot", "title")],
        ));
        doc.append_child(host, titled);
        let body = element(&mut doc, host, "p");
        let shadow = doc.attach_shadow(host);
        let default_slot = element(&mut doc, shadow, "slot");
        let named = doc.create_node(NodeKind::element(
            "slot",
            vec![Attribute::new("name", "title")],
        ));
        doc.append_child(shadow, named);
        doc.assign_slots();

        assert_eq!(doc.assigned_nodes(named), &[titled]);
        assert_eq!(doc.assigned_nodes(default_slot), &[body]);
    }

    #[test]
    fn test_template_first_child() {
        let mut doc = Document::new();
        let root = doc.root();
        let template = element(&mut doc, root, "template");
        let content = doc.template_content_mut(template);
        let inner = element(&mut doc, content, "b");
        assert_eq!(doc.first_child_of_template_or_node(template), Some(inner));
        assert_eq!(doc.template_host(content), Some(template));
        assert_eq!(doc.first_child(template), None);
    }

    #[test]
    fn test_editability() {
        let mut doc = Document::new();
        let root = doc.root();
        let host = doc.create_node(NodeKind::element(
            "div",
            vec![Attribute::new("contenteditable", "")],
        ));
        doc.append_child(root, host);
        let inner = element(&mut doc, host, "b");
        let locked = doc.create_node(NodeKind::element(
            "span",
            vec![Attribute::new("contenteditable", "false")],
        ));
        doc.append_child(host, locked);

        assert!(doc.is_editable(inner));
        assert!(doc.is_editing_host(host));
        assert!(!doc.is_editing_host(inner));
        assert!(!doc.is_editable(locked));
        assert!(!doc.is_editable(root));
    }

    #[test]
    fn test_invisible_break() {
        let mut doc = Document::new();
        let root = doc.root();
        let p = element(&mut doc, root, "p");
        text(&mut doc, p, "line");
        let inner = element(&mut doc, p, "br");
        text(&mut doc, p, "more");
        let trailing = element(&mut doc, p, "br");
        text(&mut doc, p, "  ");
        assert!(!doc.is_invisible_break(inner));
        assert!(doc.is_invisible_break(trailing));
    }

    #[test]
    fn test_whitespace_only_text() {
        let mut doc = Document::new();
        let root = doc.root();
        let blank = text(&mut doc, root, " \n\t");
        let word = text(&mut doc, root, " a ");
        let el = element(&mut doc, root, "a");
        assert!(doc.text_is_only_whitespace(blank));
        assert!(!doc.text_is_only_whitespace(word));
        assert!(!doc.text_is_only_whitespace(el));
    }
}
