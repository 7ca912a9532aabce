//! A small, tolerant markup reader.
//!
//! Builds a [`Document`] from HTML- or XML-flavoured markup. It understands
//! elements and attributes, text with character references, comments, CDATA
//! sections, processing instructions and doctypes. In HTML mode names are
//! lowercased, void elements never take children, raw-text elements swallow
//! everything up to their end tag, `<template>` children go into the content
//! fragment and `<template shadowrootmode="...">` attaches its children as a
//! shadow root of the enclosing element. Slots are assigned once reading is
//! complete.
//!
//! Mismatched end tags close back to the nearest matching open element and
//! stray end tags are ignored; only lexically broken input (an unterminated
//! comment, tag or attribute value) is an error.

use crate::error::{ParseError, SourceLocation};
use crate::html;

use super::{Attribute, Document, NodeId, NodeKind};

impl Document {
    /// Reads an HTML document.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` for lexically broken markup.
    ///
    /// # Examples
    ///
    /// ```
    /// use docencode::Document;
    ///
    /// let doc = Document::parse_html("<p>Hello <b>world</b></p>").unwrap();
    /// assert!(doc.is_html);
    /// ```
    pub fn parse_html(input: &str) -> Result<Self, ParseError> {
        let mut doc = Self::new_html();
        MarkupReader::new(input, true).read_into(&mut doc)?;
        Ok(doc)
    }

    /// Reads a generic XML document (names keep their case, no void elements).
    ///
    /// # Errors
    ///
    /// Returns `ParseError` for lexically broken markup.
    pub fn parse_xml(input: &str) -> Result<Self, ParseError> {
        let mut doc = Self::new();
        MarkupReader::new(input, false).read_into(&mut doc)?;
        Ok(doc)
    }
}

/// An open element on the reader's stack.
struct OpenElement {
    name: String,
    /// Where children of this element are appended (the element itself, a
    /// template content fragment, or a shadow root).
    container: NodeId,
}

struct MarkupReader<'a> {
    input: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    html: bool,
}

impl<'a> MarkupReader<'a> {
    fn new(input: &'a str, html: bool) -> Self {
        Self {
            input: input.strip_prefix('\u{FEFF}').unwrap_or(input),
            pos: 0,
            line: 1,
            column: 1,
            html,
        }
    }

    fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.pos,
        }
    }

    fn fatal(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            location: self.location(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Advances by `len` bytes, updating line/column.
    fn advance(&mut self, len: usize) {
        let consumed = &self.input[self.pos..self.pos + len];
        for c in consumed.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.pos += len;
    }

    /// Consumes input up to `terminator`, returning the text before it.
    fn take_until(&mut self, terminator: &str, what: &str) -> Result<&'a str, ParseError> {
        let rest = self.rest();
        let Some(end) = rest.find(terminator) else {
            return Err(self.fatal(format!("unterminated {what}")));
        };
        let taken = &rest[..end];
        self.advance(end + terminator.len());
        Ok(taken)
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start_matches(super::is_html_whitespace);
        self.advance(rest.len() - trimmed.len());
    }

    fn normalize_name(&self, name: &str) -> String {
        if self.html {
            name.to_ascii_lowercase()
        } else {
            name.to_string()
        }
    }

    fn read_name(&mut self) -> String {
        let rest = self.rest();
        let end = rest
            .find(|c: char| super::is_html_whitespace(c) || matches!(c, '/' | '>' | '='))
            .unwrap_or(rest.len());
        let name = &rest[..end];
        self.advance(end);
        self.normalize_name(name)
    }

    fn read_into(mut self, doc: &mut Document) -> Result<(), ParseError> {
        let mut stack: Vec<OpenElement> = Vec::new();
        while !self.at_end() {
            let parent = stack.last().map_or(doc.root(), |open| open.container);
            let rest = self.rest();
            if rest.starts_with("<!--") {
                self.advance(4);
                let content = self.take_until("-->", "comment")?;
                let node = doc.create_node(NodeKind::Comment {
                    content: content.to_string(),
                });
                doc.append_child(parent, node);
            } else if rest.starts_with("<![CDATA[") {
                self.advance(9);
                let content = self.take_until("]]>", "CDATA section")?;
                let node = doc.create_node(NodeKind::CData {
                    content: content.to_string(),
                });
                doc.append_child(parent, node);
            } else if rest.starts_with("<!") {
                self.advance(2);
                let decl = self.take_until(">", "doctype")?;
                if let Some(kind) = parse_doctype(decl) {
                    let node = doc.create_node(kind);
                    doc.append_child(parent, node);
                }
            } else if rest.starts_with("<?") {
                self.advance(2);
                let body = self.take_until("?>", "processing instruction")?;
                processing_instruction(doc, parent, body);
            } else if rest.starts_with("</") {
                self.advance(2);
                let name = self.read_name();
                self.take_until(">", "end tag")?;
                if let Some(depth) = stack.iter().rposition(|open| open.name == name) {
                    stack.truncate(depth);
                }
            } else if rest.starts_with('<')
                && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic())
            {
                self.advance(1);
                if let Some(open) = self.start_tag(doc, parent)? {
                    stack.push(open);
                }
            } else {
                self.text(doc, parent);
            }
        }
        doc.assign_slots();
        Ok(())
    }

    fn start_tag(
        &mut self,
        doc: &mut Document,
        parent: NodeId,
    ) -> Result<Option<OpenElement>, ParseError> {
        let name = self.read_name();
        let mut attributes: Vec<Attribute> = Vec::new();
        let self_closing = loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                return Err(self.fatal(format!("unterminated start tag <{name}>")));
            }
            if rest.starts_with("/>") {
                self.advance(2);
                break true;
            }
            if rest.starts_with('>') {
                self.advance(1);
                break false;
            }
            if rest.starts_with('/') {
                self.advance(1);
                continue;
            }
            let attr_name = self.read_name();
            self.skip_whitespace();
            let value = if self.rest().starts_with('=') {
                self.advance(1);
                self.skip_whitespace();
                self.attribute_value()?
            } else {
                String::new()
            };
            if !attributes.iter().any(|a| a.name == attr_name) {
                attributes.push(Attribute {
                    name: attr_name,
                    value,
                });
            }
        };

        let local = name.to_ascii_lowercase();
        if self.html
            && local == "template"
            && doc.is_element(parent)
            && attributes.iter().any(|a| a.name == "shadowrootmode")
        {
            let shadow = doc.attach_shadow(parent);
            return Ok(Some(OpenElement {
                name,
                container: shadow,
            }));
        }

        let id = attributes
            .iter()
            .find(|a| a.name == "id")
            .map(|a| a.value.clone());
        if self.html {
            note_document_metadata(doc, &local, &attributes);
        }
        let element = doc.create_node(NodeKind::Element {
            name: name.clone(),
            namespace: None,
            attributes,
        });
        doc.append_child(parent, element);
        if let Some(id) = id {
            doc.set_id(&id, element);
        }

        if self_closing || (self.html && html::is_void_element(&local)) {
            return Ok(None);
        }
        if self.html && html::is_raw_text_element(&local) {
            self.raw_text(doc, element, &local)?;
            return Ok(None);
        }
        let container = if self.html && local == "template" {
            doc.template_content_mut(element)
        } else {
            element
        };
        Ok(Some(OpenElement { name, container }))
    }

    fn attribute_value(&mut self) -> Result<String, ParseError> {
        let rest = self.rest();
        if let Some(quote) = rest.chars().next().filter(|&c| c == '"' || c == '\'') {
            self.advance(1);
            let raw = self.take_until(&quote.to_string(), "attribute value")?;
            return Ok(decode_references(raw));
        }
        let end = rest
            .find(|c: char| super::is_html_whitespace(c) || c == '>')
            .unwrap_or(rest.len());
        let raw = &rest[..end];
        self.advance(end);
        Ok(decode_references(raw))
    }

    fn raw_text(
        &mut self,
        doc: &mut Document,
        element: NodeId,
        local: &str,
    ) -> Result<(), ParseError> {
        let rest = self.rest();
        let lowered = rest.to_ascii_lowercase();
        let close = format!("</{local}");
        let end = lowered.find(&close).unwrap_or(rest.len());
        let content = &rest[..end];
        self.advance(end);
        if !content.is_empty() {
            let text = doc.create_node(NodeKind::text(content));
            doc.append_child(element, text);
        }
        if !self.at_end() {
            self.take_until(">", "end tag")?;
        }
        Ok(())
    }

    fn text(&mut self, doc: &mut Document, parent: NodeId) {
        let rest = self.rest();
        let mut end = rest.len();
        for (i, _) in rest.match_indices('<').filter(|&(i, _)| i > 0) {
            let next = rest[i + 1..].chars().next();
            if next.is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?')) {
                end = i;
                break;
            }
        }
        let raw = &rest[..end];
        self.advance(end);
        let node = doc.create_node(NodeKind::text(&decode_references(raw)));
        doc.append_child(parent, node);
    }
}

fn processing_instruction(doc: &mut Document, parent: NodeId, body: &str) {
    let (target, data) = match body.find(super::is_html_whitespace) {
        Some(split) => (&body[..split], body[split..].trim()),
        None => (body, ""),
    };
    if target == "xml" {
        doc.encoding = pseudo_attribute(data, "encoding");
        return;
    }
    let node = doc.create_node(NodeKind::ProcessingInstruction {
        target: target.to_string(),
        data: (!data.is_empty()).then(|| data.to_string()),
    });
    doc.append_child(parent, node);
}

fn note_document_metadata(doc: &mut Document, local: &str, attributes: &[Attribute]) {
    let find = |key: &str| attributes.iter().find(|a| a.name == key).map(|a| a.value.clone());
    match local {
        "base" if doc.base_url.is_none() => doc.base_url = find("href"),
        "meta" if doc.encoding.is_none() => doc.encoding = find("charset"),
        _ => {}
    }
}

/// Parses the inside of `<!DOCTYPE ...>`.
fn parse_doctype(decl: &str) -> Option<NodeKind> {
    let body = decl.get(7..)?;
    if !decl[..7].eq_ignore_ascii_case("doctype") {
        return None;
    }
    let mut parts = body.trim().splitn(2, super::is_html_whitespace);
    let name = parts.next().unwrap_or_default().to_string();
    let tail = parts.next().unwrap_or_default().trim();
    let quoted: Vec<&str> = tail.split(['"', '\'']).skip(1).step_by(2).collect();
    let keyword = tail.split(super::is_html_whitespace).next().unwrap_or_default();
    let (public_id, system_id) = if keyword.eq_ignore_ascii_case("public") {
        (quoted.first(), quoted.get(1))
    } else if keyword.eq_ignore_ascii_case("system") {
        (None, quoted.first())
    } else {
        (None, None)
    };
    Some(NodeKind::DocumentType {
        name,
        public_id: public_id.map(|s| (*s).to_string()),
        system_id: system_id.map(|s| (*s).to_string()),
    })
}

/// Extracts `key="value"` from the data of an XML declaration.
fn pseudo_attribute(data: &str, key: &str) -> Option<String> {
    let start = data.find(key)? + key.len();
    let after = data[start..].trim_start().strip_prefix('=')?.trim_start();
    let quote = after.chars().next().filter(|&c| c == '"' || c == '\'')?;
    let value = &after[1..];
    let end = value.find(quote)?;
    Some(value[..end].to_string())
}

/// Resolves numeric and the common named character references. Unknown
/// references are kept literally.
fn decode_references(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let resolved = rest.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let name = &rest[1..semi];
            let c = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{A0}'),
                _ => {
                    let code = if let Some(hex) =
                        name.strip_prefix("#x").or_else(|| name.strip_prefix("#X"))
                    {
                        u32::from_str_radix(hex, 16).ok()
                    } else if let Some(dec) = name.strip_prefix('#') {
                        dec.parse::<u32>().ok()
                    } else {
                        None
                    };
                    code.and_then(char::from_u32)
                }
            };
            c.map(|c| (c, semi))
        });
        match resolved {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
