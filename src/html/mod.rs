//! HTML element classification.
//!
//! Name tables used by the markup reader, the content serializers and the
//! range promoter. All functions expect lowercase local names.

/// Returns true if `tag` is a void element (never has an end tag).
#[must_use]
pub fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
            | "basefont"
            | "frame"
            | "keygen"
    )
}

/// Returns true if `tag` holds raw text whose content is never escaped.
#[must_use]
pub fn is_raw_text_element(tag: &str) -> bool {
    matches!(
        tag,
        "script" | "style" | "xmp" | "iframe" | "noembed" | "noframes" | "plaintext"
    )
}

/// Returns true if `tag` is laid out as a block (starts on a new line).
#[must_use]
pub fn is_block_element(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "body"
            | "caption"
            | "center"
            | "dd"
            | "details"
            | "dialog"
            | "dir"
            | "div"
            | "dl"
            | "dt"
            | "fieldset"
            | "figcaption"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hgroup"
            | "hr"
            | "html"
            | "li"
            | "listing"
            | "main"
            | "menu"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "summary"
            | "table"
            | "tbody"
            | "td"
            | "tfoot"
            | "th"
            | "thead"
            | "tr"
            | "ul"
            | "xmp"
    )
}

/// Returns true for elements whose content preserves whitespace.
#[must_use]
pub fn is_preformatted_element(tag: &str) -> bool {
    matches!(tag, "pre" | "listing" | "xmp" | "plaintext" | "textarea")
}

/// Returns true for elements whose content is never rendered as text.
#[must_use]
pub fn is_non_rendered_element(tag: &str) -> bool {
    matches!(
        tag,
        "head" | "script" | "style" | "title" | "template" | "noframes"
    )
}

/// Returns true for table structure elements that are always carried as
/// immediate context when copying rows or cells.
#[must_use]
pub fn is_table_structure_element(tag: &str) -> bool {
    matches!(tag, "tr" | "thead" | "tbody" | "tfoot" | "table")
}

/// Returns true for inline formatting elements that wrap a copied fragment
/// as paste context.
#[must_use]
pub fn is_formatting_context_element(tag: &str) -> bool {
    matches!(
        tag,
        "b" | "i"
            | "u"
            | "a"
            | "tt"
            | "s"
            | "big"
            | "small"
            | "strike"
            | "em"
            | "strong"
            | "dfn"
            | "code"
            | "cite"
            | "var"
            | "abbr"
            | "font"
            | "script"
            | "span"
            | "pre"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
    )
}

/// Returns true for elements range promotion never climbs out of.
#[must_use]
pub fn is_promotion_root(tag: &str) -> bool {
    matches!(tag, "body" | "td" | "th" | "slot")
}

/// Attributes holding URLs that are absolutized when links are rewritten.
#[must_use]
pub fn is_link_attribute(attr: &str) -> bool {
    matches!(
        attr,
        "href" | "src" | "action" | "cite" | "background" | "longdesc" | "usemap" | "poster"
    )
}
