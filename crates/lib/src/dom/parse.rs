//! Reading XML text into the arena.
//!
//! Parsing applies the one fixed normalization of this crate: text nodes that
//! contain only whitespace are dropped, except inside native `<string>`
//! elements where whitespace is the value. Comments, attribute order,
//! namespace declarations and prefixes are preserved. Processing instructions
//! and the XML declaration are discarded.

use roxmltree::NodeType;

use super::{Dom, DomError, DomResult, NodeId, render::escape_attribute};
use crate::constants::NATIVE_STRING;

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
const FRAGMENT_ROOT: &str = "cfgdoc-fragment";

/// Parses a complete document into a fresh arena, returning the root element.
pub fn parse_document(xml: &str) -> DomResult<(Dom, NodeId)> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| DomError::MalformedXml {
        reason: e.to_string(),
    })?;
    let mut dom = Dom::new();
    let root = import_node(&mut dom, doc.root_element(), false)?.ok_or(DomError::MalformedXml {
        reason: "document has no root element".to_string(),
    })?;
    Ok((dom, root))
}

/// Parses a sequence of sibling nodes into detached nodes of an existing arena.
///
/// `bindings` are the namespace declarations in scope where the fragment will
/// be attached (see [`super::namespace_bindings`]); prefixes they bind may be
/// used in `xml` without being redeclared. Nothing is allocated in `dom`
/// unless the whole fragment is well-formed.
pub fn parse_fragment(
    dom: &mut Dom,
    xml: &str,
    bindings: &[(String, String)],
) -> DomResult<Vec<NodeId>> {
    let mut wrapped = format!("<{FRAGMENT_ROOT}");
    for (name, uri) in bindings {
        wrapped.push(' ');
        wrapped.push_str(name);
        wrapped.push_str("=\"");
        escape_attribute(uri, &mut wrapped);
        wrapped.push('"');
    }
    wrapped.push('>');
    wrapped.push_str(xml);
    wrapped.push_str("</");
    wrapped.push_str(FRAGMENT_ROOT);
    wrapped.push('>');
    let doc = roxmltree::Document::parse(&wrapped).map_err(|e| DomError::MalformedXml {
        reason: e.to_string(),
    })?;
    let mut nodes = Vec::new();
    for child in doc.root_element().children() {
        if let Some(id) = import_node(dom, child, false)? {
            nodes.push(id);
        }
    }
    Ok(nodes)
}

/// Imports `node`; `keep_whitespace` is set for the children of a `<string>`
fn import_node(
    dom: &mut Dom,
    node: roxmltree::Node<'_, '_>,
    keep_whitespace: bool,
) -> DomResult<Option<NodeId>> {
    match node.node_type() {
        NodeType::Element => {
            let tag = node.tag_name();
            let is_string = tag.name() == NATIVE_STRING;
            let id = dom.create_element(qualified_name(node, tag.namespace(), tag.name()));
            for (prefix, uri) in declared_namespaces(node) {
                let attr = match prefix {
                    Some(prefix) => format!("xmlns:{prefix}"),
                    None => "xmlns".to_string(),
                };
                dom.set_attribute(id, attr, uri)?;
            }
            for attr in node.attributes() {
                let name = qualified_name(node, attr.namespace(), attr.name());
                dom.set_attribute(id, name, attr.value())?;
            }
            for child in node.children() {
                if let Some(child_id) = import_node(dom, child, is_string)? {
                    dom.append_child(id, child_id)?;
                }
            }
            Ok(Some(id))
        }
        NodeType::Text => match node.text() {
            Some(text) if keep_whitespace || !text.trim().is_empty() => Ok(Some(dom.create_text(text))),
            _ => Ok(None),
        },
        NodeType::Comment => Ok(Some(dom.create_comment(node.text().unwrap_or_default()))),
        _ => Ok(None),
    }
}

/// Namespace bindings introduced on this element rather than inherited.
fn declared_namespaces(node: roxmltree::Node<'_, '_>) -> Vec<(Option<String>, String)> {
    let bindings = |n: roxmltree::Node<'_, '_>| -> Vec<(Option<String>, String)> {
        n.namespaces()
            .map(|ns| (ns.name().map(str::to_string), ns.uri().to_string()))
            .collect()
    };
    let inherited = node.parent_element().map(bindings).unwrap_or_default();
    bindings(node)
        .into_iter()
        .filter(|(prefix, uri)| {
            prefix.as_deref() != Some("xml")
                && uri != XML_NAMESPACE
                && !inherited.contains(&(prefix.clone(), uri.clone()))
        })
        .collect()
}

fn qualified_name(node: roxmltree::Node<'_, '_>, namespace: Option<&str>, local: &str) -> String {
    let Some(uri) = namespace else {
        return local.to_string();
    };
    if uri == XML_NAMESPACE {
        return format!("xml:{local}");
    }
    let prefix = node
        .namespaces()
        .filter(|ns| ns.uri() == uri)
        .find_map(|ns| ns.name());
    match prefix {
        Some(prefix) => format!("{prefix}:{local}"),
        // Unprefixed names sit in the default namespace
        None => local.to_string(),
    }
}
