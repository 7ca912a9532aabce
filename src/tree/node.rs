//! Node type definitions.
//!
//! The `NodeKind` enum represents every node type the encoder can walk.
//! Each variant carries the node-type-specific payload (element name and
//! attributes, text content, shadow host, ...).

use super::{Attribute, NodeId};

/// The kind of a document node and its associated data.
///
/// Navigation links (parent, children, siblings) are stored in `NodeData`,
/// not here.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// The document node. There is exactly one per `Document`.
    Document,

    /// A detached fragment. Template contents are fragments whose `host` is
    /// the owning `<template>` element.
    DocumentFragment {
        /// The template element this fragment is the content of, if any.
        host: Option<NodeId>,
    },

    /// The root of a shadow tree attached to `host`.
    ShadowRoot {
        /// The shadow host element.
        host: NodeId,
    },

    /// An element node, e.g., `<div class="x">`.
    Element {
        /// The element's qualified name as written.
        name: String,
        /// Namespace URI, if any.
        namespace: Option<String>,
        /// Attributes on this element.
        attributes: Vec<Attribute>,
    },

    /// A text node containing character data.
    Text {
        /// The text content (character references resolved).
        content: String,
    },

    /// A CDATA section, e.g., `<![CDATA[...]]>`.
    CData {
        /// The CDATA content (no escaping applied).
        content: String,
    },

    /// A comment node, e.g., `<!-- ... -->`.
    Comment {
        /// The comment text (without the `<!--` and `-->` delimiters).
        content: String,
    },

    /// A processing instruction, e.g., `<?target data?>`.
    ProcessingInstruction {
        /// The PI target (e.g., `"xml-stylesheet"`).
        target: String,
        /// The PI data, if any.
        data: Option<String>,
    },

    /// A document type declaration node, e.g., `<!DOCTYPE html>`.
    DocumentType {
        /// The root element name declared in the DOCTYPE.
        name: String,
        /// The PUBLIC identifier, if any.
        public_id: Option<String>,
        /// The SYSTEM identifier (URI), if any.
        system_id: Option<String>,
    },
}

impl NodeKind {
    /// Convenience constructor for an element without namespace.
    #[must_use]
    pub fn element(name: &str, attributes: Vec<Attribute>) -> Self {
        Self::Element {
            name: name.to_string(),
            namespace: None,
            attributes,
        }
    }

    /// Convenience constructor for a text node.
    #[must_use]
    pub fn text(content: &str) -> Self {
        Self::Text {
            content: content.to_string(),
        }
    }
}
