//! Compact HTML serialization for the arena tree.
//!
//! Output is markup-getter style: no indentation, no inserted whitespace,
//! text and attribute values escaped. The `id`, `class`, and `style`
//! attributes are re-synthesized from element state and always lead the
//! attribute list, so serialized markup reflects mutations.

use memchr::{memchr, memchr3};

use super::arena::{ElementData, NodeData, NodeId, Tree};
use super::style;

/// Serialize a node's children (markup between its tags).
pub(crate) fn serialize_inner(tree: &Tree, node: NodeId) -> String {
    let mut out = String::new();
    let raw = tree
        .as_element(node)
        .is_some_and(|data| is_raw_text(data.name.local.as_ref()));
    for child in tree.children(node) {
        write_node(&mut out, tree, child, raw);
    }
    out
}

/// Serialize a node including its own tags.
pub(crate) fn serialize_outer(tree: &Tree, node: NodeId) -> String {
    let mut out = String::new();
    write_node(&mut out, tree, node, false);
    out
}

/// Serialize the whole document.
pub(crate) fn serialize_document(tree: &Tree) -> String {
    let mut out = String::with_capacity(tree.len() * 16);
    for child in tree.children(tree.document()) {
        write_node(&mut out, tree, child, false);
    }
    out
}

fn write_node(out: &mut String, tree: &Tree, id: NodeId, raw: bool) {
    let Some(node) = tree.get(id) else { return };
    match &node.data {
        NodeData::Document => {
            for child in tree.children(id) {
                write_node(out, tree, child, false);
            }
        }
        NodeData::Element(data) => write_element(out, tree, id, data),
        NodeData::Text(text) => {
            if raw {
                out.push_str(text);
            } else {
                escape_text_into(out, text);
            }
        }
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Doctype {
            name,
            public_id,
            system_id,
        } => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            if !public_id.is_empty() {
                out.push_str(" PUBLIC \"");
                out.push_str(public_id);
                out.push('"');
                if !system_id.is_empty() {
                    out.push_str(" \"");
                    out.push_str(system_id);
                    out.push('"');
                }
            } else if !system_id.is_empty() {
                out.push_str(" SYSTEM \"");
                out.push_str(system_id);
                out.push('"');
            }
            out.push('>');
        }
    }
}

fn write_element(out: &mut String, tree: &Tree, id: NodeId, data: &ElementData) {
    let tag = data.name.local.as_ref();

    out.push('<');
    out.push_str(tag);
    if let Some(elem_id) = &data.id {
        out.push_str(" id=\"");
        escape_attr_into(out, elem_id);
        out.push('"');
    }
    if !data.classes.is_empty() {
        out.push_str(" class=\"");
        escape_attr_into(out, &data.classes.join(" "));
        out.push('"');
    }
    if !data.style.is_empty() {
        out.push_str(" style=\"");
        escape_attr_into(out, &style::style_to_attr(&data.style));
        out.push('"');
    }
    for attr in &data.attrs {
        out.push(' ');
        out.push_str(attr.name.local.as_ref());
        out.push_str("=\"");
        escape_attr_into(out, &attr.value);
        out.push('"');
    }
    out.push('>');

    if is_void(tag) {
        return;
    }

    let raw = is_raw_text(tag);
    for child in tree.children(id) {
        write_node(out, tree, child, raw);
    }

    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Void elements take no closing tag and never have children.
fn is_void(tag: &str) -> bool {
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
    )
}

/// Raw text elements whose children serialize unescaped.
fn is_raw_text(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

/// Escape text content. The fast path handles the common case of nothing
/// to escape with a single SIMD scan.
fn escape_text_into(out: &mut String, text: &str) {
    if memchr3(b'&', b'<', b'>', text.as_bytes()).is_none() {
        out.push_str(text);
        return;
    }
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

/// Escape an attribute value for double-quoted emission.
fn escape_attr_into(out: &mut String, value: &str) {
    let bytes = value.as_bytes();
    if memchr3(b'&', b'<', b'"', bytes).is_none() && memchr(b'>', bytes).is_none() {
        out.push_str(value);
        return;
    }
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}
