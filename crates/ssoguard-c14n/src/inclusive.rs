#![forbid(unsafe_code)]

//! Canonical XML 1.0 (inclusive C14N).
//!
//! Algorithm URI: `http://www.w3.org/TR/2001/REC-xml-c14n-20010315`
//! With comments: `http://www.w3.org/TR/2001/REC-xml-c14n-20010315#WithComments`
//!
//! Every in-scope namespace is rendered on the first visible element that
//! sees it, and again wherever its binding changes.  The apex of a document
//! subset also receives the `xml:*` attributes of its omitted ancestors.

use crate::render::{self, NsDecl};
use ssoguard_core::Error;
use ssoguard_xml::nodeset::NodeSet;
use ssoguard_xml::tag;
use std::collections::BTreeMap;

/// Canonicalize a document using inclusive C14N 1.0.
pub fn canonicalize(
    doc: &roxmltree::Document<'_>,
    with_comments: bool,
    node_set: Option<&NodeSet>,
) -> Result<Vec<u8>, Error> {
    let mut output = Vec::new();
    let ctx = C14nContext {
        with_comments,
        node_set,
    };
    ctx.process_node(doc.root(), &mut output, &BTreeMap::new())?;
    Ok(output)
}

struct C14nContext<'a> {
    with_comments: bool,
    node_set: Option<&'a NodeSet>,
}

impl C14nContext<'_> {
    fn is_visible(&self, node: &roxmltree::Node<'_, '_>) -> bool {
        self.node_set.map_or(true, |ns| ns.contains(node))
    }

    fn process_node(
        &self,
        node: roxmltree::Node<'_, '_>,
        output: &mut Vec<u8>,
        rendered_ns: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        match node.node_type() {
            roxmltree::NodeType::Root => {
                for child in node.children() {
                    self.process_node(child, output, rendered_ns)?;
                }
            }
            roxmltree::NodeType::Element => self.process_element(node, output, rendered_ns)?,
            roxmltree::NodeType::Text => {
                if self.is_visible(&node) {
                    let text = node.text().unwrap_or("");
                    render::render_text(output, text);
                }
            }
            roxmltree::NodeType::Comment => {
                if self.with_comments && self.is_visible(&node) {
                    render::render_misc(node, output);
                }
            }
            roxmltree::NodeType::PI => {
                if self.is_visible(&node) {
                    render::render_misc(node, output);
                }
            }
        }
        Ok(())
    }

    fn process_element(
        &self,
        node: roxmltree::Node<'_, '_>,
        output: &mut Vec<u8>,
        rendered_ns: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        if !self.is_visible(&node) {
            for child in node.children() {
                self.process_node(child, output, rendered_ns)?;
            }
            return Ok(());
        }

        let start = tag::start_tag(node)?;
        let inscope = tag::in_scope_namespaces(node);

        let mut ns_decls: Vec<NsDecl> = inscope
            .iter()
            .filter(|(prefix, uri)| rendered_ns.get(*prefix) != Some(*uri))
            .map(|(prefix, uri)| NsDecl {
                prefix: prefix.clone(),
                uri: uri.clone(),
            })
            .collect();
        if !inscope.contains_key("") && rendered_ns.get("").is_some_and(|uri| !uri.is_empty()) {
            ns_decls.push(NsDecl {
                prefix: String::new(),
                uri: String::new(),
            });
        }
        ns_decls.sort();

        let mut attrs = render::element_attrs(node, &start)?;
        let parent_visible = node
            .parent_element()
            .is_some_and(|p| self.is_visible(&p));
        if !parent_visible {
            let inherited = render::inherited_xml_attrs(node, &attrs);
            attrs.extend(inherited);
        }
        attrs.sort();

        render::render_start_tag(output, start.qname, &ns_decls, &attrs);

        let mut child_rendered_ns = rendered_ns.clone();
        for decl in &ns_decls {
            child_rendered_ns.insert(decl.prefix.clone(), decl.uri.clone());
        }
        for child in node.children() {
            self.process_node(child, output, &child_rendered_ns)?;
        }

        render::render_end_tag(output, start.qname);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c14n(xml: &str) -> String {
        let doc = ssoguard_xml::parse(xml).unwrap();
        String::from_utf8(canonicalize(&doc, false, None).unwrap()).unwrap()
    }

    #[test]
    fn test_empty_elements_and_attribute_order() {
        assert_eq!(
            c14n(r#"<?xml version="1.0"?><doc b='2' a="1"><e/></doc>"#),
            r#"<doc a="1" b="2"><e></e></doc>"#
        );
    }

    #[test]
    fn test_redundant_namespaces_dropped() {
        let xml = r#"<a xmlns="urn:d" xmlns:p="urn:p"><p:b xmlns:p="urn:p"><c xmlns=""/></p:b></a>"#;
        assert_eq!(
            c14n(xml),
            r#"<a xmlns="urn:d" xmlns:p="urn:p"><p:b><c xmlns=""></c></p:b></a>"#
        );
    }

    #[test]
    fn test_comments_stripped_unless_requested() {
        let xml = "<!--top--><r><!--in-->t</r>";
        let doc = ssoguard_xml::parse(xml).unwrap();
        assert_eq!(canonicalize(&doc, false, None).unwrap(), b"<r>t</r>");
        assert_eq!(
            String::from_utf8(canonicalize(&doc, true, None).unwrap()).unwrap(),
            "<!--top-->\n<r><!--in-->t</r>"
        );
    }

    #[test]
    fn test_subset_apex_gets_context() {
        let xml = r#"<r xmlns:p="urn:p" xml:lang="en"><p:x a="1">v</p:x></r>"#;
        let doc = ssoguard_xml::parse(xml).unwrap();
        let x = doc.root_element().first_element_child().unwrap();
        let set = NodeSet::tree_without_comments(x);
        let out = canonicalize(&doc, false, Some(&set)).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"<p:x xmlns:p="urn:p" a="1" xml:lang="en">v</p:x>"#
        );
    }

    #[test]
    fn test_text_and_attribute_escaping() {
        assert_eq!(
            c14n("<r a=\"x&amp;&quot;&#9;\">1 &lt; 2 &amp;&gt; 3</r>"),
            "<r a=\"x&amp;&quot;&#x9;\">1 &lt; 2 &amp;&gt; 3</r>"
        );
    }
}
