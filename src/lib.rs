//! # docencode
//!
//! Serializes an in-memory document tree, or a part of it, to HTML, XML or
//! plain text. The part can be a single node, a node's children, a range
//! between two boundary points, or a multi-range selection. Output goes to a
//! `String` or is transcoded and streamed into any [`std::io::Write`] sink.
//!
//! [`CopyEncoder`] is the clipboard flavour: it widens ranges to the
//! elements whose content is fully selected and reports the ancestor markup
//! a paste target needs to rebuild the fragment's formatting.
//!
//! ## Quick Start
//!
//! ```
//! use docencode::{Boundary, CopyEncoder, Document, EncoderFlags, Range, Selection};
//!
//! let doc = Document::parse_html("<body><p>Hello <b>world</b>!</p></body>").unwrap();
//! let b = doc.descendants(doc.root()).find(|&n| doc.is_element_named(n, "b")).unwrap();
//! let text = doc.first_child(b).unwrap();
//!
//! let mut encoder = CopyEncoder::new();
//! encoder.init(&doc, "text/html", EncoderFlags::empty());
//! encoder
//!     .set_selection(&Selection::from(Range::new(Boundary::new(text, 0), Boundary::new(text, 5))))
//!     .unwrap();
//! let copied = encoder.encode_with_context().unwrap();
//! assert_eq!(copied.fragment, "world");
//! assert_eq!(copied.context, "<b></b>");
//! assert_eq!(copied.info, "0,0");
//! ```

pub mod encoder;
pub mod encoding;
pub mod error;
pub mod html;
pub mod range;
pub mod serial;
pub mod tree;

// Re-export primary types at the crate root for convenience.
pub use encoder::{CopyEncoder, DocumentEncoder, EncoderFlags, EncodingScope};
pub use error::EncodeError;
pub use range::{Boundary, Range, Selection};
pub use tree::{Attribute, Document, NodeId, NodeKind, TreeKind};
