//! Canonical XML serialization.
//!
//! The canonical form is fixed: attributes appear in stored order with double
//! quotes, nested elements are indented by two spaces, and empty elements
//! self-close. An element holding any text child is written inline with no
//! inserted whitespace so its text survives a parse/render cycle unchanged.

use super::{Dom, DomResult, NodeData, NodeId};

const INDENT: &str = "  ";

/// XML declaration written at the top of full documents.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

#[derive(Clone, Copy)]
enum Layout {
    Indented(usize),
    Inline,
}

/// Renders a whole document rooted at `root`, including the XML declaration.
pub fn render_document(dom: &Dom, root: NodeId) -> DomResult<String> {
    let mut out = String::from(XML_DECLARATION);
    out.push('\n');
    write_node(dom, root, Layout::Indented(0), &mut out)?;
    out.push('\n');
    Ok(out)
}

/// Renders a single node (and its subtree) in canonical form.
pub fn render_node(dom: &Dom, id: NodeId) -> DomResult<String> {
    let mut out = String::new();
    write_node(dom, id, Layout::Indented(0), &mut out)?;
    Ok(out)
}

/// Renders the children of an element as a fragment, one top-level node per line.
pub fn render_children(dom: &Dom, id: NodeId) -> DomResult<String> {
    let children = dom.children(id)?;
    if children.iter().any(|c| matches!(dom.data(*c), Ok(NodeData::Text(_)))) {
        let mut out = String::new();
        for child in children {
            write_node(dom, *child, Layout::Inline, &mut out)?;
        }
        return Ok(out);
    }
    let mut parts = Vec::with_capacity(children.len());
    for child in children {
        parts.push(render_node(dom, *child)?);
    }
    Ok(parts.join("\n"))
}

fn write_node(dom: &Dom, id: NodeId, layout: Layout, out: &mut String) -> DomResult<()> {
    if let Layout::Indented(depth) = layout {
        out.push_str(&INDENT.repeat(depth));
    }
    match dom.data(id)? {
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Text(text) => escape_text(text, out),
        NodeData::Element(element) => {
            out.push('<');
            out.push_str(element.name());
            for (name, value) in element.attributes() {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_attribute(value, out);
                out.push('"');
            }
            let children = element.children();
            if children.is_empty() {
                out.push_str(" />");
                return Ok(());
            }
            out.push('>');
            let mixed = children
                .iter()
                .any(|c| matches!(dom.data(*c), Ok(NodeData::Text(_))));
            match layout {
                Layout::Indented(depth) if !mixed => {
                    for child in children {
                        out.push('\n');
                        write_node(dom, *child, Layout::Indented(depth + 1), out)?;
                    }
                    out.push('\n');
                    out.push_str(&INDENT.repeat(depth));
                }
                _ => {
                    for child in children {
                        write_node(dom, *child, Layout::Inline, out)?;
                    }
                }
            }
            out.push_str("</");
            out.push_str(element.name());
            out.push('>');
        }
    }
    Ok(())
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(ch),
        }
    }
}

pub(crate) fn escape_attribute(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push(ch),
        }
    }
}
