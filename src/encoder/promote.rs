//! Range promotion for copy.
//!
//! Before a selection is copied, each range is widened so that an element
//! whose whole content is selected is selected itself: selecting all of
//! `<b>world</b>`'s text copies the `<b>` too. Promotion climbs one parent
//! at a time and stops at `body`, table cells and slots, at the range's
//! common ancestor, and (for the joint climb) at editability changes.

use crate::error::EncodeError;
use crate::html::is_promotion_root;
use crate::range::{Boundary, Range};
use crate::tree::{is_html_whitespace, Document, NodeId, TreeKind};

/// Widens ranges to their fully selected ancestors.
#[derive(Debug, Clone, Copy)]
pub struct RangePromoter<'d> {
    doc: &'d Document,
    tree: TreeKind,
}

impl<'d> RangePromoter<'d> {
    #[must_use]
    pub fn new(doc: &'d Document, tree: TreeKind) -> Self {
        Self { doc, tree }
    }

    /// Returns `range` with both boundaries promoted.
    ///
    /// # Errors
    ///
    /// Returns `PromotionFailed` when a boundary is out of bounds, the
    /// boundaries share no ancestor, or a climb reaches a node whose index
    /// in its parent cannot be resolved. The input range is never modified.
    pub fn promote(&self, range: &Range) -> Result<Range, EncodeError> {
        if !range.start.is_valid(self.doc, self.tree) || !range.end.is_valid(self.doc, self.tree) {
            return Err(EncodeError::PromotionFailed(
                "range boundary offset out of bounds".to_string(),
            ));
        }
        let common = range.common_ancestor(self.doc, self.tree).ok_or_else(|| {
            EncodeError::PromotionFailed("range boundaries share no ancestor".to_string())
        })?;

        let mut start = self.promote_start(range.start, common)?;
        let mut end = self.promote_end(range.end, common)?;
        if start.container == common && end.container == common {
            (start, end) = self.promote_ancestor_chain(common, start.offset, end.offset)?;
        }
        tracing::trace!(?range, ?start, ?end, "promoted range");
        Ok(Range::in_tree(start, end, self.tree))
    }

    /// Climbs both boundaries together while each lands on the same parent
    /// and the parent's editability matches the starting container's.
    fn promote_ancestor_chain(
        &self,
        container: NodeId,
        start_offset: usize,
        end_offset: usize,
    ) -> Result<(Boundary, Boundary), EncodeError> {
        let editable = self.doc.is_editable(container);
        let mut start = Boundary::new(container, start_offset);
        let mut end = Boundary::new(container, end_offset);
        while let Some(parent) = self.doc.parent_in(start.container, self.tree) {
            let promoted_start = self.promote_start(start, parent)?;
            let promoted_end = self.promote_end(end, parent)?;
            if promoted_start.container != parent
                || promoted_end.container != parent
                || self.doc.is_editable(parent) != editable
            {
                break;
            }
            start = promoted_start;
            end = promoted_end;
        }
        Ok((start, end))
    }

    /// Moves a start boundary up while everything before it in each
    /// container is insignificant.
    pub fn promote_start(&self, point: Boundary, limit: NodeId) -> Result<Boundary, EncodeError> {
        if point.container == limit {
            return Ok(point);
        }
        let doc = self.doc;
        let mut reset = false;

        let mut current = if doc.is_text(point.container) {
            if point.offset != 0 {
                if !text_before_is_whitespace(doc, point.container, point.offset) {
                    return Ok(point);
                }
                reset = true;
            }
            let parent = self.parent_point(point.container)?;
            if parent.container == limit {
                return Ok(point);
            }
            parent
        } else if point.offset < doc.child_count_in(point.container, self.tree) {
            point
        } else {
            self.parent_point(point.container)?
        };

        let Some(child) = doc.child_at_in(current.container, current.offset, self.tree) else {
            return Ok(point);
        };
        if self.is_root(child) {
            return Ok(point);
        }

        while current.container != limit
            && !self.is_root(current.container)
            && self.child_is_first_node(current)
        {
            // Whitespace skipped at the start only counts once a block is left.
            if reset && doc.is_block_element(current.container) {
                reset = false;
            }
            current = self.parent_point(current.container)?;
        }

        Ok(if reset { point } else { current })
    }

    /// Moves an end boundary up while everything after it in each container
    /// is insignificant. The result sits after the last climbed node.
    pub fn promote_end(&self, point: Boundary, limit: NodeId) -> Result<Boundary, EncodeError> {
        if point.container == limit {
            return Ok(point);
        }
        let doc = self.doc;
        let mut reset = false;

        let mut current = if doc.is_text(point.container) {
            if point.offset < doc.text_len(point.container) {
                if !text_after_is_whitespace(doc, point.container, point.offset) {
                    return Ok(point);
                }
                reset = true;
            }
            let parent = self.parent_point(point.container)?;
            if parent.container == limit {
                return Ok(point);
            }
            parent
        } else if doc.has_children_in(point.container, self.tree) {
            Boundary::new(point.container, point.offset.saturating_sub(1))
        } else {
            self.parent_point(point.container)?
        };

        let Some(child) = doc.child_at_in(current.container, current.offset, self.tree) else {
            return Ok(point);
        };
        if self.is_root(child) {
            return Ok(point);
        }

        while current.container != limit
            && !self.is_root(current.container)
            && self.child_is_last_node(current)
        {
            if reset && doc.is_block_element(current.container) {
                reset = false;
            }
            current = self.parent_point(current.container)?;
        }

        if reset {
            return Ok(point);
        }
        Ok(Boundary::new(current.container, current.offset + 1))
    }

    /// The point just before `node` in its parent. In the flattened tree a
    /// shadow root resolves to the point before its host.
    fn parent_point(&self, node: NodeId) -> Result<Boundary, EncodeError> {
        let doc = self.doc;
        if self.tree == TreeKind::Flat {
            if let Some(host) = doc.shadow_host(node) {
                return Boundary::before(doc, host, self.tree).ok_or_else(|| {
                    EncodeError::PromotionFailed(format!(
                        "shadow host {host:?} has no position in its parent"
                    ))
                });
            }
        }
        let parent = doc
            .parent_in(node, self.tree)
            .ok_or_else(|| EncodeError::PromotionFailed(format!("{node:?} has no parent")))?;
        let index = doc.index_in(parent, node, self.tree).ok_or_else(|| {
            EncodeError::PromotionFailed(format!("{node:?} has no index in {parent:?}"))
        })?;
        Ok(Boundary::new(parent, index))
    }

    fn is_root(&self, node: NodeId) -> bool {
        self.doc.local_name(node).is_some_and(|name| is_promotion_root(&name))
    }

    /// Whether every sibling before the child at `point` is whitespace-only
    /// text.
    fn child_is_first_node(&self, point: Boundary) -> bool {
        let siblings = self.doc.children_in(point.container, self.tree);
        siblings
            .iter()
            .take(point.offset)
            .all(|&sibling| self.doc.text_is_only_whitespace(sibling))
    }

    /// Whether every sibling after the child at `point` is whitespace-only
    /// text or a padding line break.
    fn child_is_last_node(&self, point: Boundary) -> bool {
        let siblings = self.doc.children_in(point.container, self.tree);
        siblings.iter().skip(point.offset + 1).all(|&sibling| {
            self.doc.is_padding_break(sibling) || self.doc.text_is_only_whitespace(sibling)
        })
    }
}

fn text_before_is_whitespace(doc: &Document, text: NodeId, offset: usize) -> bool {
    doc.node_text(text)
        .unwrap_or_default()
        .chars()
        .take(offset)
        .all(is_html_whitespace)
}

fn text_after_is_whitespace(doc: &Document, text: NodeId, offset: usize) -> bool {
    doc.node_text(text)
        .unwrap_or_default()
        .chars()
        .skip(offset)
        .all(is_html_whitespace)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MARKUP: &str = "<body><p id=p>Hello <b id=b>world</b>!</p></body>";

    fn promoter(doc: &Document) -> RangePromoter<'_> {
        RangePromoter::new(doc, TreeKind::Light)
    }

    #[test]
    fn test_bold_contents_promote_to_bold() {
        let doc = Document::parse_html(MARKUP).unwrap();
        let p = doc.element_by_id("p").unwrap();
        let b = doc.element_by_id("b").unwrap();
        let promoted = promoter(&doc)
            .promote(&Range::select_node_contents(&doc, b))
            .unwrap();
        assert_eq!(promoted.start, Boundary::new(p, 1));
        assert_eq!(promoted.end, Boundary::new(p, 2));
    }

    #[test]
    fn test_end_climbs_out_of_fully_selected_bold() {
        let doc = Document::parse_html(MARKUP).unwrap();
        let p = doc.element_by_id("p").unwrap();
        let b = doc.element_by_id("b").unwrap();
        let text = doc.first_child(b).unwrap();
        let hello = doc.first_child(p).unwrap();
        let range = Range::new(Boundary::new(hello, 0), Boundary::new(text, 5));
        let promoted = promoter(&doc).promote(&range).unwrap();
        // A start at the very beginning of the common ancestor stays put.
        assert_eq!(promoted.start, Boundary::new(hello, 0));
        assert_eq!(promoted.end, Boundary::new(p, 2));
    }

    #[test]
    fn test_partial_text_is_not_promoted() {
        let doc = Document::parse_html(MARKUP).unwrap();
        let b = doc.element_by_id("b").unwrap();
        let text = doc.first_child(b).unwrap();
        let range = Range::new(Boundary::new(text, 1), Boundary::new(text, 3));
        assert_eq!(promoter(&doc).promote(&range).unwrap(), range);
    }

    #[test]
    fn test_stops_at_body() {
        let doc = Document::parse_html("<body id=body><p id=p>all</p></body>").unwrap();
        let body = doc.element_by_id("body").unwrap();
        let p = doc.element_by_id("p").unwrap();
        let promoted = promoter(&doc)
            .promote(&Range::select_node_contents(&doc, p))
            .unwrap();
        assert_eq!(promoted.start, Boundary::new(body, 0));
        assert_eq!(promoted.end, Boundary::new(body, 1));
    }

    #[test]
    fn test_stops_at_table_cell() {
        let markup = "<table><tr><td id=td><i id=i>x</i></td></tr></table>";
        let doc = Document::parse_html(markup).unwrap();
        let td = doc.element_by_id("td").unwrap();
        let i = doc.element_by_id("i").unwrap();
        let promoted = promoter(&doc)
            .promote(&Range::select_node_contents(&doc, i))
            .unwrap();
        assert_eq!(promoted.start, Boundary::new(td, 0));
        assert_eq!(promoted.end, Boundary::new(td, 1));
    }

    #[test]
    fn test_whitespace_siblings_are_insignificant() {
        let markup = "<body id=body><div> <span id=s>x</span> </div></body>";
        let doc = Document::parse_html(markup).unwrap();
        let body = doc.element_by_id("body").unwrap();
        let span = doc.element_by_id("s").unwrap();
        let promoted = promoter(&doc)
            .promote(&Range::select_node_contents(&doc, span))
            .unwrap();
        assert_eq!(promoted.start, Boundary::new(body, 0));
        assert_eq!(promoted.end, Boundary::new(body, 1));
    }

    #[test]
    fn test_editability_change_stops_joint_climb() {
        let doc = Document::parse_html(
            "<body><div id=outer><div id=edit contenteditable><b id=b>x</b></div></div></body>",
        )
        .unwrap();
        let edit = doc.element_by_id("edit").unwrap();
        let b = doc.element_by_id("b").unwrap();
        let promoted = promoter(&doc)
            .promote(&Range::select_node_contents(&doc, b))
            .unwrap();
        assert_eq!(promoted.start, Boundary::new(edit, 0));
        assert_eq!(promoted.end, Boundary::new(edit, 1));
    }

    #[test]
    fn test_leading_whitespace_inside_inline_resets() {
        let doc = Document::parse_html("<body><p id=p>a<b id=b>  x</b></p></body>").unwrap();
        let b = doc.element_by_id("b").unwrap();
        let text = doc.first_child(b).unwrap();
        let point = Boundary::new(text, 2);
        let p = doc.element_by_id("p").unwrap();
        assert_eq!(promoter(&doc).promote_start(point, p).unwrap(), point);
    }

    #[test]
    fn test_leading_whitespace_is_dropped_once_a_block_is_left() {
        let doc = Document::parse_html("<body id=body><div id=d><p>  x</p></div></body>").unwrap();
        let body = doc.element_by_id("body").unwrap();
        let d = doc.element_by_id("d").unwrap();
        let text = doc.first_child(doc.first_child(d).unwrap()).unwrap();
        let promoted = promoter(&doc)
            .promote_start(Boundary::new(text, 2), body)
            .unwrap();
        assert_eq!(promoted, Boundary::new(body, 0));
    }

    #[test]
    fn test_trailing_whitespace_is_dropped_once_a_block_is_left() {
        let doc = Document::parse_html("<body id=body><div id=d><p>x  </p></div></body>").unwrap();
        let body = doc.element_by_id("body").unwrap();
        let d = doc.element_by_id("d").unwrap();
        let text = doc.first_child(doc.first_child(d).unwrap()).unwrap();
        let promoted = promoter(&doc)
            .promote_end(Boundary::new(text, 1), body)
            .unwrap();
        assert_eq!(promoted, Boundary::new(body, 1));
    }

    #[test]
    fn test_trailing_whitespace_inside_inline_resets() {
        let doc = Document::parse_html("<body><p id=p><b id=b>x  </b>a</p></body>").unwrap();
        let b = doc.element_by_id("b").unwrap();
        let text = doc.first_child(b).unwrap();
        let point = Boundary::new(text, 1);
        let p = doc.element_by_id("p").unwrap();
        assert_eq!(promoter(&doc).promote_end(point, p).unwrap(), point);
    }

    #[test]
    fn test_end_climbs_past_padding_break() {
        let markup = "<div id=d><p id=p><b>x</b><br></p></div>";
        let mut doc = Document::parse_html(markup).unwrap();
        let d = doc.element_by_id("d").unwrap();
        let p = doc.element_by_id("p").unwrap();
        let text = doc.first_child(doc.first_child(p).unwrap()).unwrap();
        let br = doc.last_child(p).unwrap();

        // An ordinary trailing break is content.
        let promoted = promoter(&doc).promote_end(Boundary::new(text, 1), d).unwrap();
        assert_eq!(promoted, Boundary::new(p, 1));

        doc.mark_padding_break(br);
        let promoted = promoter(&doc).promote_end(Boundary::new(text, 1), d).unwrap();
        assert_eq!(promoted, Boundary::new(d, 1));
    }

    #[test]
    fn test_out_of_bounds_boundary_fails() {
        let doc = Document::parse_html(MARKUP).unwrap();
        let b = doc.element_by_id("b").unwrap();
        let range = Range::new(Boundary::new(b, 0), Boundary::new(b, 7));
        assert!(matches!(
            promoter(&doc).promote(&range),
            Err(EncodeError::PromotionFailed(_))
        ));
    }

    #[test]
    fn test_unassigned_light_child_fails_in_flat_tree() {
        let doc = Document::parse_html(
            "<div id=host><template shadowrootmode=open><i>shadow</i></template>\
<b id=light>x</b></div>",
        )
        .unwrap();
        let light = doc.element_by_id("light").unwrap();
        let text = doc.first_child(light).unwrap();
        let range = Range::new(Boundary::new(text, 0), Boundary::new(text, 1));
        let promoter = RangePromoter::new(&doc, TreeKind::Flat);
        assert!(matches!(
            promoter.promote_start(Boundary::new(text, 0), doc.root()),
            Err(EncodeError::PromotionFailed(_))
        ));
        assert!(promoter.promote(&range).is_ok());
    }
}
