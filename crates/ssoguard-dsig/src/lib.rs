#![forbid(unsafe_code)]

//! XML Digital Signature (XML-DSig) validation and signing.
//!
//! Validation is deliberately narrow: one enveloped signature attached to
//! the element being validated, one reference pointing back at that element,
//! and a signer certificate taken from a fixed trust store.

pub mod context;
pub mod reference;
pub mod sign;
pub mod verify;

pub use context::ValidationContext;
pub use reference::ReferenceTransform;
pub use sign::{sign_element, sign_enveloped, SignOptions};
pub use verify::Verified;

use ssoguard_core::{ns, Error};
use ssoguard_xml::document::is_element;

/// `InclusiveNamespaces PrefixList` of a C14N method or transform element.
pub(crate) fn read_inclusive_prefixes(node: roxmltree::Node<'_, '_>) -> Vec<String> {
    for child in node.children() {
        if is_element(child, ns::EXC_C14N, ns::node::INCLUSIVE_NAMESPACES) {
            if let Some(prefix_list) = child.attribute(ns::attr::PREFIX_LIST) {
                return prefix_list
                    .split_whitespace()
                    .map(|s| s.to_owned())
                    .collect();
            }
        }
    }
    Vec::new()
}

/// Value of the mandatory `Algorithm` attribute of `node`.
pub(crate) fn algorithm_attr<'a>(node: roxmltree::Node<'a, '_>, what: &str) -> Result<&'a str, Error> {
    node.attribute(ns::attr::ALGORITHM)
        .ok_or_else(|| Error::MissingAttribute(format!("Algorithm on {what}")))
}
