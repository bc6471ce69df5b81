#![forbid(unsafe_code)]

//! Exclusive Canonical XML 1.0 (exc-C14N).
//!
//! Algorithm URI: `http://www.w3.org/2001/10/xml-exc-c14n#`
//! With comments: `http://www.w3.org/2001/10/xml-exc-c14n#WithComments`
//!
//! Only "visibly utilized" namespace declarations are output.  A namespace
//! is visibly utilized by an element if its prefix is used by the element's
//! tag name or by one of its attributes, or if the prefix appears in the
//! InclusiveNamespaces PrefixList (`#default` naming the default namespace).
//! This is what makes a signed assertion verify the same way inside and
//! outside its enclosing response.

use crate::render::{self, NsDecl};
use ssoguard_core::Error;
use ssoguard_xml::nodeset::NodeSet;
use ssoguard_xml::tag;
use std::collections::{BTreeMap, BTreeSet};

/// Canonicalize using Exclusive C14N 1.0.
pub fn canonicalize(
    doc: &roxmltree::Document<'_>,
    with_comments: bool,
    node_set: Option<&NodeSet>,
    inclusive_prefixes: &[String],
) -> Result<Vec<u8>, Error> {
    let inclusive_prefixes = inclusive_prefixes
        .iter()
        .map(|p| if p == "#default" { String::new() } else { p.clone() })
        .collect();
    let mut output = Vec::new();
    let ctx = ExcC14nContext {
        with_comments,
        node_set,
        inclusive_prefixes,
    };
    ctx.process_node(doc.root(), &mut output, &BTreeMap::new())?;
    Ok(output)
}

struct ExcC14nContext<'a> {
    with_comments: bool,
    node_set: Option<&'a NodeSet>,
    inclusive_prefixes: BTreeSet<String>,
}

impl ExcC14nContext<'_> {
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
        // Invisible elements render nothing and do not change what the
        // nearest output ancestor has declared.
        if !self.is_visible(&node) {
            for child in node.children() {
                self.process_node(child, output, rendered_ns)?;
            }
            return Ok(());
        }

        let start = tag::start_tag(node)?;
        let mut attrs = render::element_attrs(node, &start)?;

        let mut utilized: BTreeSet<String> = self.inclusive_prefixes.clone();
        utilized.insert(start.prefix().to_owned());
        for attr in &attrs {
            if !attr.prefix().is_empty() {
                utilized.insert(attr.prefix().to_owned());
            }
        }

        let inscope = tag::in_scope_namespaces(node);
        let mut ns_decls: Vec<NsDecl> = Vec::new();
        for prefix in &utilized {
            if prefix == "xml" {
                continue;
            }
            match inscope.get(prefix) {
                Some(uri) => {
                    if rendered_ns.get(prefix) != Some(uri) {
                        ns_decls.push(NsDecl {
                            prefix: prefix.clone(),
                            uri: uri.clone(),
                        });
                    }
                }
                None if prefix.is_empty() => {
                    if rendered_ns.get("").is_some_and(|uri| !uri.is_empty()) {
                        ns_decls.push(NsDecl {
                            prefix: String::new(),
                            uri: String::new(),
                        });
                    }
                }
                None => {}
            }
        }
        ns_decls.sort();
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
