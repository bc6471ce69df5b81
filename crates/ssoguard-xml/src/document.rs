#![forbid(unsafe_code)]

//! Document helpers over roxmltree: ID registration and element lookup.

use ssoguard_core::{ns, Error};
use std::collections::HashMap;

/// Build the ID → NodeId mapping for a parsed document.
///
/// `ID`, `Id` and `id` attributes are registered.  The same value on two
/// elements makes a same-document reference ambiguous, so it is an error.
pub fn build_id_map(doc: &roxmltree::Document<'_>) -> Result<HashMap<String, roxmltree::NodeId>, Error> {
    let mut map = HashMap::new();
    for node in doc.descendants().filter(|n| n.is_element()) {
        for attr_name in ns::attr::ID_ATTRS {
            if let Some(val) = node.attribute(attr_name) {
                if let Some(previous) = map.insert(val.to_owned(), node.id()) {
                    if previous != node.id() {
                        return Err(Error::XmlStructure(format!("duplicate ID value: {val}")));
                    }
                }
            }
        }
    }
    Ok(map)
}

/// The identifier of an element, if it carries one.
pub fn element_id<'a>(node: roxmltree::Node<'a, '_>) -> Option<&'a str> {
    ns::attr::ID_ATTRS.iter().find_map(|name| node.attribute(*name))
}

/// Parse a same-document reference (e.g., `#foo` → `foo`).
pub fn parse_same_document_ref(uri: &str) -> Option<&str> {
    uri.strip_prefix('#').filter(|id| !id.is_empty())
}

/// Whether `node` is an element with the given namespace and local name.
pub fn is_element(node: roxmltree::Node<'_, '_>, ns_uri: &str, local_name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local_name
        && node.tag_name().namespace().unwrap_or("") == ns_uri
}

pub fn find_child_element<'a, 'input>(
    parent: roxmltree::Node<'a, 'input>,
    ns_uri: &str,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    parent.children().find(|n| is_element(*n, ns_uri, local_name))
}

pub fn find_child_elements<'a, 'input>(
    parent: roxmltree::Node<'a, 'input>,
    ns_uri: &str,
    local_name: &str,
) -> Vec<roxmltree::Node<'a, 'input>> {
    parent
        .children()
        .filter(|n| is_element(*n, ns_uri, local_name))
        .collect()
}

/// Text content of an element with all whitespace removed.
///
/// Base64 payloads in XML-DSig and metadata are routinely line-wrapped.
pub fn compact_text(node: roxmltree::Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .flat_map(|t| t.chars())
        .filter(|c| !c.is_whitespace())
        .collect()
}
