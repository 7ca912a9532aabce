//! Plain-text serializer.
//!
//! Produces the rendered text of a tree: whitespace collapses outside
//! preformatted elements, block boundaries become line breaks, `<br>` is a
//! newline and table cells in a row are separated by tabs. Content of
//! non-rendered elements (head, script, style, ...) is dropped, as is
//! `<noscript>` content unless `OUTPUT_NO_SCRIPT_CONTENT` is set. With
//! `OUTPUT_WRAP` lines are broken at word boundaries before the wrap column.

use crate::encoder::EncoderFlags;
use crate::error::EncodeError;
use crate::html::{is_block_element, is_non_rendered_element, is_preformatted_element};
use crate::tree::{is_html_whitespace, Document, NodeId};

use super::{char_slice, ContentSerializer, SerializerInit};

/// Writes plain text.
#[derive(Debug, Default)]
pub struct PlainTextSerializer {
    flags: EncoderFlags,
    wrap_column: usize,
    /// One entry per scanned element: whether it is (inside) preformatted
    /// content.
    preformat_stack: Vec<bool>,
    /// Chars on the current output line.
    column: usize,
    /// Line breaks owed by a block boundary, emitted before the next text.
    pending_breaks: usize,
    /// Collapsed whitespace owed before the next word.
    pending_space: bool,
    has_output: bool,
}

impl PlainTextSerializer {
    fn in_pre(&self) -> bool {
        self.flags.contains(EncoderFlags::OUTPUT_PREFORMATTED)
            || self.preformat_stack.last().copied().unwrap_or(false)
    }

    fn wraps(&self) -> bool {
        self.flags.contains(EncoderFlags::OUTPUT_WRAP) && self.wrap_column > 0
    }

    /// Whether `node` sits inside content that is never rendered as text.
    fn is_suppressed(&self, doc: &Document, node: NodeId) -> bool {
        doc.ancestors(node).any(|ancestor| {
            doc.local_name(ancestor).is_some_and(|name| {
                let keep_noscript = self.flags.contains(EncoderFlags::OUTPUT_NO_SCRIPT_CONTENT);
                is_non_rendered_element(&name) || (name == "noscript" && !keep_noscript)
            })
        }) || doc
            .template_host(doc.ancestors(node).last().unwrap_or(node))
            .is_some()
    }

    fn block_boundary(&mut self) {
        if self.has_output && self.column > 0 {
            self.pending_breaks = self.pending_breaks.max(1);
        }
        self.pending_space = false;
    }

    fn emit_pending_breaks(&mut self, out: &mut String) {
        for _ in 0..self.pending_breaks {
            out.push('\n');
        }
        if self.pending_breaks > 0 {
            self.column = 0;
        }
        self.pending_breaks = 0;
    }

    fn newline(&mut self, out: &mut String) {
        out.push('\n');
        self.column = 0;
        self.pending_space = false;
    }

    fn write_preformatted(&mut self, text: &str, out: &mut String) {
        if text.is_empty() {
            return;
        }
        self.emit_pending_breaks(out);
        if self.pending_space && self.column > 0 {
            out.push(' ');
            self.column += 1;
        }
        self.pending_space = false;
        out.push_str(text);
        match text.rfind('\n') {
            Some(pos) => self.column = text[pos + 1..].chars().count(),
            None => self.column += text.chars().count(),
        }
        self.has_output = true;
    }

    fn write_collapsed(&mut self, text: &str, out: &mut String) {
        if text.starts_with(is_html_whitespace) {
            self.pending_space = true;
        }
        let mut words = text.split(is_html_whitespace).filter(|w| !w.is_empty()).peekable();
        while let Some(word) = words.next() {
            self.emit_pending_breaks(out);
            let len = word.chars().count();
            if self.column > 0 && self.pending_space {
                if self.wraps() && self.column + 1 + len > self.wrap_column {
                    self.newline(out);
                } else {
                    out.push(' ');
                    self.column += 1;
                }
            }
            out.push_str(word);
            self.column += len;
            self.has_output = true;
            self.pending_space = words.peek().is_some();
        }
        if text.ends_with(is_html_whitespace) && !text.trim_matches(is_html_whitespace).is_empty() {
            self.pending_space = true;
        }
    }
}

impl ContentSerializer for PlainTextSerializer {
    fn init(&mut self, init: &SerializerInit) -> bool {
        *self = Self {
            flags: init.flags,
            wrap_column: init.wrap_column,
            ..Self::default()
        };
        true
    }

    fn append_element_start(
        &mut self,
        doc: &Document,
        element: NodeId,
        _original: NodeId,
        out: &mut String,
    ) -> Result<(), EncodeError> {
        if self.is_suppressed(doc, element) {
            return Ok(());
        }
        let Some(name) = doc.local_name(element) else {
            return Ok(());
        };
        match name.as_str() {
            "br" => {
                self.emit_pending_breaks(out);
                self.newline(out);
            }
            "td" | "th" => {
                let follows_cell =
                    std::iter::successors(doc.prev_sibling(element), |&s| doc.prev_sibling(s))
                        .any(|s| doc.is_element_named(s, "td") || doc.is_element_named(s, "th"));
                if follows_cell {
                    self.emit_pending_breaks(out);
                    out.push('\t');
                    self.column += 1;
                    self.pending_space = false;
                }
            }
            _ if is_block_element(&name) => self.block_boundary(),
            _ => {}
        }
        Ok(())
    }

    fn append_element_end(
        &mut self,
        doc: &Document,
        element: NodeId,
        _original: NodeId,
        _out: &mut String,
    ) -> Result<(), EncodeError> {
        let is_block = doc.local_name(element).is_some_and(|name| {
            is_block_element(&name) && !matches!(name.as_str(), "td" | "th")
        });
        if is_block {
            self.block_boundary();
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
        if self.is_suppressed(doc, text) {
            return Ok(());
        }
        let content = char_slice(doc.node_text(text).unwrap_or_default(), start, end);
        if self.in_pre() {
            self.write_preformatted(content, out);
        } else {
            self.write_collapsed(content, out);
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
        self.append_text(doc, cdata, start, end, out)
    }

    fn append_processing_instruction(
        &mut self,
        _doc: &Document,
        _pi: NodeId,
        _start: usize,
        _end: Option<usize>,
        _out: &mut String,
    ) -> Result<(), EncodeError> {
        Ok(())
    }

    fn append_comment(
        &mut self,
        _doc: &Document,
        _comment: NodeId,
        _start: usize,
        _end: Option<usize>,
        _out: &mut String,
    ) -> Result<(), EncodeError> {
        Ok(())
    }

    fn append_doctype(
        &mut self,
        _doc: &Document,
        _doctype: NodeId,
        _out: &mut String,
    ) -> Result<(), EncodeError> {
        Ok(())
    }

    fn scan_element_for_preformat(&mut self, doc: &Document, element: NodeId) {
        let pre = doc
            .ancestors(element)
            .any(|a| doc.local_name(a).is_some_and(|name| is_preformatted_element(&name)));
        self.preformat_stack.push(pre);
    }

    fn forget_element_for_preformat(&mut self, _doc: &Document, _element: NodeId) {
        self.preformat_stack.pop();
    }

    fn finish(&mut self, _out: &mut String) -> Result<(), EncodeError> {
        // Trailing block breaks are never written.
        self.pending_breaks = 0;
        self.pending_space = false;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tree::NodeKind;

    /// Replays a subtree walk into the serializer the way the encoder does.
    fn render(doc: &Document, node: NodeId, s: &mut PlainTextSerializer, out: &mut String) {
        match &doc.node(node).kind {
            NodeKind::Element { .. } => {
                s.scan_element_for_preformat(doc, node);
                s.append_element_start(doc, node, node, out).unwrap();
                let mut child = doc.first_child_of_template_or_node(node);
                while let Some(c) = child {
                    render(doc, c, s, out);
                    child = doc.next_sibling(c);
                }
                s.append_element_end(doc, node, node, out).unwrap();
                s.forget_element_for_preformat(doc, node);
            }
            NodeKind::Text { .. } => s.append_text(doc, node, 0, None, out).unwrap(),
            _ => {
                for c in doc.children(node).collect::<Vec<_>>() {
                    render(doc, c, s, out);
                }
            }
        }
    }

    fn to_text(markup: &str, flags: EncoderFlags, wrap_column: usize) -> String {
        let doc = Document::parse_html(markup).unwrap();
        let mut s = PlainTextSerializer::default();
        s.init(&SerializerInit {
            flags,
            wrap_column,
            encoding: encoding_rs::UTF_8,
            is_copy: false,
            rewrite_encoding_declaration: false,
        });
        let mut out = String::new();
        render(&doc, doc.root(), &mut s, &mut out);
        s.flush_and_finish(&mut out).unwrap();
        out
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(
            to_text("<p>  Hello \n  <b>big</b>   world </p>", EncoderFlags::empty(), 0),
            "Hello big world"
        );
    }

    #[test]
    fn test_blocks_become_lines() {
        assert_eq!(
            to_text("<div><p>one</p><p>two</p></div><p>three</p>", EncoderFlags::empty(), 0),
            "one\ntwo\nthree"
        );
    }

    #[test]
    fn test_pre_keeps_whitespace() {
        assert_eq!(
            to_text("<p>a</p><pre>  x\n   y</pre>", EncoderFlags::empty(), 0),
            "a\n  x\n   y"
        );
    }

    #[test]
    fn test_br_and_cells() {
        assert_eq!(
            to_text(
                "<table><tr><td>a</td><td>b</td></tr><tr><td>c</td></tr></table>x<br>y",
                EncoderFlags::empty(),
                0
            ),
            "a\tb\nc\nx\ny"
        );
    }

    #[test]
    fn test_script_and_noscript_dropped() {
        let markup = "<p>a<script>var x;</script><noscript>nojs</noscript>b</p>";
        assert_eq!(to_text(markup, EncoderFlags::empty(), 0), "ab");
        assert_eq!(
            to_text(markup, EncoderFlags::OUTPUT_NO_SCRIPT_CONTENT, 0),
            "anojsb"
        );
    }

    #[test]
    fn test_wrapping() {
        assert_eq!(
            to_text("<p>the quick brown fox jumps</p>", EncoderFlags::OUTPUT_WRAP, 10),
            "the quick\nbrown fox\njumps"
        );
        assert_eq!(
            to_text("<p>the quick brown fox jumps</p>", EncoderFlags::empty(), 10),
            "the quick brown fox jumps"
        );
    }
}
