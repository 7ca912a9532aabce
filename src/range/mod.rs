//! Boundaries, ranges and selections.
//!
//! A [`Boundary`] is a (container, offset) point: a char offset inside a
//! character-data node, or a child index inside any other node. A [`Range`]
//! pairs two boundaries and records which [`TreeKind`] its offsets refer to.
//! [`AncestorChain`] is the per-boundary list of inclusive ancestors and the
//! offsets taken at each level, which drives the range walk.

use crate::tree::{Document, NodeId, TreeKind};

/// A point in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Boundary {
    pub container: NodeId,
    pub offset: usize,
}

impl Boundary {
    #[must_use]
    pub fn new(container: NodeId, offset: usize) -> Self {
        Self { container, offset }
    }

    /// The point immediately before `node` in its parent.
    #[must_use]
    pub fn before(doc: &Document, node: NodeId, tree: TreeKind) -> Option<Self> {
        let parent = doc.parent_in(node, tree)?;
        let index = doc.index_in(parent, node, tree)?;
        Some(Self::new(parent, index))
    }

    /// The point immediately after `node` in its parent.
    #[must_use]
    pub fn after(doc: &Document, node: NodeId, tree: TreeKind) -> Option<Self> {
        Self::before(doc, node, tree).map(|b| Self::new(b.container, b.offset + 1))
    }

    /// Whether the offset lies within the container.
    #[must_use]
    pub fn is_valid(&self, doc: &Document, tree: TreeKind) -> bool {
        self.offset <= node_length(doc, self.container, tree)
    }
}

/// The DOM "length" of a node: chars for character data, children otherwise.
#[must_use]
pub fn node_length(doc: &Document, node: NodeId, tree: TreeKind) -> usize {
    if doc.node_text(node).is_some() {
        doc.text_len(node)
    } else {
        doc.child_count_in(node, tree)
    }
}

/// An ordered pair of boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: Boundary,
    pub end: Boundary,
    /// The tree view the boundary offsets are expressed in. A `Flat` range
    /// may have its boundaries in different shadow trees.
    pub tree: TreeKind,
}

impl Range {
    /// A light-tree range.
    #[must_use]
    pub fn new(start: Boundary, end: Boundary) -> Self {
        Self {
            start,
            end,
            tree: TreeKind::Light,
        }
    }

    /// A range whose offsets refer to `tree`.
    #[must_use]
    pub fn in_tree(start: Boundary, end: Boundary, tree: TreeKind) -> Self {
        Self { start, end, tree }
    }

    /// A range selecting `node` itself.
    #[must_use]
    pub fn select_node(doc: &Document, node: NodeId) -> Option<Self> {
        let start = Boundary::before(doc, node, TreeKind::Light)?;
        Some(Self::new(start, Boundary::new(start.container, start.offset + 1)))
    }

    /// A range selecting all of `node`'s content.
    #[must_use]
    pub fn select_node_contents(doc: &Document, node: NodeId) -> Self {
        Self::new(
            Boundary::new(node, 0),
            Boundary::new(node, node_length(doc, node, TreeKind::Light)),
        )
    }

    #[must_use]
    pub fn collapsed(&self) -> bool {
        self.start == self.end
    }

    /// The closest node that is an inclusive ancestor of both boundary
    /// containers in `tree`, or `None` if they are in disjoint trees.
    #[must_use]
    pub fn common_ancestor(&self, doc: &Document, tree: TreeKind) -> Option<NodeId> {
        let start_chain = inclusive_ancestors_in(doc, self.start.container, tree);
        let mut node = Some(self.end.container);
        while let Some(current) = node {
            if start_chain.contains(&current) {
                return Some(current);
            }
            node = doc.parent_in(current, tree);
        }
        None
    }
}

/// A node and its ancestors in `tree`, innermost first.
#[must_use]
pub fn inclusive_ancestors_in(doc: &Document, node: NodeId, tree: TreeKind) -> Vec<NodeId> {
    std::iter::successors(Some(node), |&n| doc.parent_in(n, tree)).collect()
}

/// The inclusive ancestors of a boundary container paired with offsets.
///
/// `offsets[0]` is the boundary offset itself; `offsets[i]` for `i > 0` is
/// the index of `nodes[i - 1]` within `nodes[i]`, or `None` when that index
/// cannot be resolved in the tree view (an unassigned light child of a
/// shadow host seen through the flattened tree).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AncestorChain {
    pub nodes: Vec<NodeId>,
    pub offsets: Vec<Option<usize>>,
}

impl AncestorChain {
    #[must_use]
    pub fn compute(doc: &Document, boundary: Boundary, tree: TreeKind) -> Self {
        let mut nodes = vec![boundary.container];
        let mut offsets = vec![Some(boundary.offset)];
        let mut child = boundary.container;
        while let Some(parent) = doc.parent_in(child, tree) {
            nodes.push(parent);
            offsets.push(doc.index_in(parent, child, tree));
            child = parent;
        }
        Self { nodes, offsets }
    }

    /// Index of `node` in the chain.
    #[must_use]
    pub fn position(&self, node: NodeId) -> Option<usize> {
        self.nodes.iter().position(|&n| n == node)
    }
}

/// An ordered set of ranges.
///
/// More than one range only occurs for table cell selections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ranges: Vec<Range>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_range(&mut self, range: Range) {
        self.ranges.push(range);
    }

    #[must_use]
    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl From<Range> for Selection {
    fn from(range: Range) -> Self {
        Self {
            ranges: vec![range],
        }
    }
}

impl FromIterator<Range> for Selection {
    fn from_iter<I: IntoIterator<Item = Range>>(iter: I) -> Self {
        Self {
            ranges: iter.into_iter().collect(),
        }
    }
}
