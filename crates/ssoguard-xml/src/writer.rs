#![forbid(unsafe_code)]

//! Subtree detachment and in-place replacement over raw document text.
//!
//! Both operations keep the original bytes of every element they copy, so
//! a signature computed over an element still verifies after the element
//! has been moved into (or out of) a document.

use crate::tag;
use ssoguard_core::Error;
use std::ops::Range;

/// Serialize `node` as a standalone document.
///
/// Every namespace binding in scope at `node` that is not declared on its own
/// start tag is added to that start tag, so prefixes used anywhere in the
/// subtree stay bound to the same URIs.
pub fn detach(node: roxmltree::Node<'_, '_>) -> Result<String, Error> {
    let start = tag::start_tag(node)?;
    let text = node.document().input_text();
    let range = node.range();

    let mut extra = String::new();
    for (prefix, uri) in tag::in_scope_namespaces(node) {
        if start.declared_prefixes.contains(&prefix.as_str()) {
            continue;
        }
        if prefix.is_empty() {
            extra.push_str(&format!(" xmlns=\"{}\"", escape_attr_value(&uri)));
        } else {
            extra.push_str(&format!(" xmlns:{prefix}=\"{}\"", escape_attr_value(&uri)));
        }
    }

    let mut out = String::with_capacity(range.len() + extra.len());
    out.push_str(&text[range.start..start.name_end]);
    out.push_str(&extra);
    out.push_str(&text[start.name_end..range.end]);
    Ok(out)
}

/// Replace byte ranges of `text` with new content.
///
/// Ranges must not overlap; they may be given in any order.
pub fn splice(text: &str, mut replacements: Vec<(Range<usize>, String)>) -> Result<String, Error> {
    replacements.sort_by_key(|(range, _)| range.start);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (range, replacement) in &replacements {
        if range.start < cursor || range.end < range.start || range.end > text.len() {
            return Err(Error::XmlStructure(format!(
                "invalid replacement range {}..{}",
                range.start, range.end
            )));
        }
        let keep = text
            .get(cursor..range.start)
            .ok_or_else(|| Error::XmlStructure("replacement range splits a character".into()))?;
        out.push_str(keep);
        out.push_str(replacement);
        cursor = range.end;
    }
    let tail = text
        .get(cursor..)
        .ok_or_else(|| Error::XmlStructure("replacement range splits a character".into()))?;
    out.push_str(tail);
    Ok(out)
}

fn escape_attr_value(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" xmlns:xs="http://www.w3.org/2001/XMLSchema" ID="r1"><saml:Issuer>idp</saml:Issuer><saml:Assertion ID="a1" xmlns:x="urn:x"><saml:AttributeValue x:type="xs:string">v</saml:AttributeValue></saml:Assertion></samlp:Response>"#;

    #[test]
    fn test_detach_carries_inherited_namespaces() {
        let doc = crate::parse(RESPONSE).unwrap();
        let assertion = doc
            .root_element()
            .children()
            .find(|n| n.tag_name().name() == "Assertion")
            .unwrap();
        let detached = detach(assertion).unwrap();
        assert!(detached.starts_with(
            r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:xs="http://www.w3.org/2001/XMLSchema" ID="a1" xmlns:x="urn:x">"#
        ));

        let reparsed = crate::parse(&detached).unwrap();
        let root = reparsed.root_element();
        assert_eq!(root.tag_name().namespace(), Some("urn:oasis:names:tc:SAML:2.0:assertion"));
        assert_eq!(root.lookup_namespace_uri(Some("xs")), Some("http://www.w3.org/2001/XMLSchema"));
    }

    #[test]
    fn test_splice_replaces_element() {
        let doc = crate::parse(RESPONSE).unwrap();
        let assertion = doc.root_element().last_element_child().unwrap();
        let out = splice(RESPONSE, vec![(assertion.range(), "<saml:Assertion ID=\"a2\"/>".into())]).unwrap();
        assert!(out.ends_with(r#"<saml:Issuer>idp</saml:Issuer><saml:Assertion ID="a2"/></samlp:Response>"#));
        assert!(crate::parse(&out).is_ok());
    }

    #[test]
    fn test_splice_rejects_overlap() {
        let text = "0123456789";
        let result = splice(text, vec![(2..6, "x".into()), (4..8, "y".into())]);
        assert!(result.is_err());
        assert_eq!(splice(text, vec![(6..8, "b".into()), (0..2, "a".into())]).unwrap(), "a2345b89");
    }
}
