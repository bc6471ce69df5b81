#![forbid(unsafe_code)]

//! `<Reference>` processing: what a reference selects and the octets its
//! digest is computed over.
//!
//! Only same-document references are followed.  `""` selects the whole
//! document and `#id` the subtree of the element carrying that ID, both
//! without comments.  The transform chain may contain the enveloped
//! signature transform and the C14N algorithms, nothing else.

use roxmltree::{Document, Node, NodeId};
use ssoguard_c14n::C14nMode;
use ssoguard_core::{algorithm, ns, Error};
use ssoguard_xml::document::{is_element, parse_same_document_ref};
use ssoguard_xml::NodeSet;
use std::collections::HashMap;

/// One entry of a reference's `<Transforms>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceTransform {
    /// Drops the enclosing `<Signature>` from the selected nodes.
    Enveloped,
    Canonicalize {
        mode: C14nMode,
        inclusive_prefixes: Vec<String>,
    },
}

impl ReferenceTransform {
    pub fn uri(&self) -> &'static str {
        match self {
            Self::Enveloped => algorithm::ENVELOPED_SIGNATURE,
            Self::Canonicalize { mode, .. } => mode.uri(),
        }
    }

    fn from_node(node: Node<'_, '_>) -> Result<Self, Error> {
        if !is_element(node, ns::DSIG, ns::node::TRANSFORM) {
            return Err(Error::XmlStructure(format!(
                "unexpected element in Transforms: {}",
                node.tag_name().name()
            )));
        }
        let uri = crate::algorithm_attr(node, "Transform")?;
        if uri == algorithm::ENVELOPED_SIGNATURE {
            return Ok(Self::Enveloped);
        }
        let mode = C14nMode::from_uri(uri).ok_or_else(|| Error::UnsupportedAlgorithm(format!("transform: {uri}")))?;
        Ok(Self::Canonicalize {
            mode,
            inclusive_prefixes: crate::read_inclusive_prefixes(node),
        })
    }
}

/// Read the `<Transforms>` of a reference; a missing element means none.
pub fn read_transforms(transforms: Option<Node<'_, '_>>) -> Result<Vec<ReferenceTransform>, Error> {
    let Some(transforms) = transforms else {
        return Ok(Vec::new());
    };
    transforms
        .children()
        .filter(|n| n.is_element())
        .map(ReferenceTransform::from_node)
        .collect()
}

/// The element a reference URI points at, `None` for the whole document.
pub fn resolve_target<'a, 'input>(
    uri: &str,
    doc: &'a Document<'input>,
    id_map: &HashMap<String, NodeId>,
) -> Result<Option<Node<'a, 'input>>, Error> {
    if uri.is_empty() {
        return Ok(None);
    }
    let id = parse_same_document_ref(uri)
        .ok_or_else(|| Error::InvalidUri(format!("only same-document references are supported: {uri}")))?;
    id_map
        .get(id)
        .and_then(|node_id| doc.get_node(*node_id))
        .map(Some)
        .ok_or_else(|| Error::InvalidUri(format!("no element with ID {id}")))
}

/// The node set a reference URI selects.
pub fn select(uri: &str, doc: &Document<'_>, id_map: &HashMap<String, NodeId>) -> Result<NodeSet, Error> {
    Ok(match resolve_target(uri, doc, id_map)? {
        Some(node) => NodeSet::tree_without_comments(node),
        None => NodeSet::all_without_comments(doc),
    })
}

/// Either a node subset of `doc` or octets produced by canonicalization.
enum Data {
    Nodes(NodeSet),
    Octets(Vec<u8>),
}

/// Run `transforms` over `selected` and return the octets to digest.
///
/// A node set left at the end of the chain is serialized with inclusive
/// C14N, as XML-DSig requires.
pub fn digest_input(
    doc: &Document<'_>,
    selected: NodeSet,
    signature: Node<'_, '_>,
    transforms: &[ReferenceTransform],
) -> Result<Vec<u8>, Error> {
    let mut data = Data::Nodes(selected);
    for transform in transforms {
        data = match (transform, data) {
            (ReferenceTransform::Enveloped, Data::Nodes(mut set)) => {
                set.remove_subtree(signature);
                Data::Nodes(set)
            }
            (ReferenceTransform::Enveloped, Data::Octets(_)) => {
                return Err(Error::Transform(
                    "enveloped-signature transform requires a node set".into(),
                ))
            }
            (ReferenceTransform::Canonicalize { mode, inclusive_prefixes }, Data::Nodes(set)) => {
                Data::Octets(ssoguard_c14n::canonicalize_doc(doc, *mode, Some(&set), inclusive_prefixes)?)
            }
            (ReferenceTransform::Canonicalize { mode, inclusive_prefixes }, Data::Octets(bytes)) => {
                let text = std::str::from_utf8(&bytes)
                    .map_err(|e| Error::Transform(format!("canonical output is not UTF-8: {e}")))?;
                Data::Octets(ssoguard_c14n::canonicalize(text, *mode, None, inclusive_prefixes)?)
            }
        };
    }
    match data {
        Data::Nodes(set) => ssoguard_c14n::canonicalize_doc(doc, C14nMode::Inclusive, Some(&set), &[]),
        Data::Octets(bytes) => Ok(bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssoguard_xml::document::build_id_map;

    const XML: &str = r#"<r ID="root"><!--c--><a ID="x"><b/></a></r>"#;
    const SIGNED: &str = r#"<r ID="a" xmlns:y="urn:y"><v>1</v><ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#"><ds:SignedInfo/></ds:Signature></r>"#;

    fn signature<'a, 'input>(doc: &'a Document<'input>) -> Node<'a, 'input> {
        doc.descendants()
            .find(|n| n.tag_name().name() == "Signature")
            .unwrap()
    }

    fn exc_c14n() -> ReferenceTransform {
        ReferenceTransform::Canonicalize {
            mode: C14nMode::Exclusive,
            inclusive_prefixes: Vec::new(),
        }
    }

    #[test]
    fn test_empty_uri_is_whole_document() {
        let doc = ssoguard_xml::parse(XML).unwrap();
        let ids = build_id_map(&doc).unwrap();
        let set = select("", &doc, &ids).unwrap();
        assert!(set.contains(&doc.root_element()));
        let comment = doc.descendants().find(|n| n.is_comment()).unwrap();
        assert!(!set.contains(&comment));
    }

    #[test]
    fn test_id_reference() {
        let doc = ssoguard_xml::parse(XML).unwrap();
        let ids = build_id_map(&doc).unwrap();
        let set = select("#x", &doc, &ids).unwrap();
        assert_eq!(set.len(), 2);
        assert!(!set.contains(&doc.root_element()));
    }

    #[test]
    fn test_unknown_and_external() {
        let doc = ssoguard_xml::parse(XML).unwrap();
        let ids = build_id_map(&doc).unwrap();
        assert!(matches!(select("#nope", &doc, &ids), Err(Error::InvalidUri(_))));
        assert!(matches!(
            select("http://evil.example/x", &doc, &ids),
            Err(Error::InvalidUri(_))
        ));
    }

    #[test]
    fn test_enveloped_then_exclusive() {
        let doc = ssoguard_xml::parse(SIGNED).unwrap();
        let ids = build_id_map(&doc).unwrap();
        let set = select("#a", &doc, &ids).unwrap();
        let out = digest_input(&doc, set, signature(&doc), &[ReferenceTransform::Enveloped, exc_c14n()]).unwrap();
        assert_eq!(out, br#"<r ID="a"><v>1</v></r>"#);
    }

    #[test]
    fn test_node_set_left_over_is_inclusive() {
        let doc = ssoguard_xml::parse(SIGNED).unwrap();
        let ids = build_id_map(&doc).unwrap();
        let set = select("#a", &doc, &ids).unwrap();
        let out = digest_input(&doc, set, signature(&doc), &[ReferenceTransform::Enveloped]).unwrap();
        assert_eq!(out, br#"<r xmlns:y="urn:y" ID="a"><v>1</v></r>"#);
    }

    #[test]
    fn test_enveloped_after_canonicalization_rejected() {
        let doc = ssoguard_xml::parse(SIGNED).unwrap();
        let set = NodeSet::all_without_comments(&doc);
        assert!(matches!(
            digest_input(&doc, set, signature(&doc), &[exc_c14n(), ReferenceTransform::Enveloped]),
            Err(Error::Transform(_))
        ));
    }

    #[test]
    fn test_read_transforms() {
        let xml = r#"<ds:Transforms xmlns:ds="http://www.w3.org/2000/09/xmldsig#" xmlns:ec="http://www.w3.org/2001/10/xml-exc-c14n#"><ds:Transform Algorithm="http://www.w3.org/2000/09/xmldsig#enveloped-signature"/><ds:Transform Algorithm="http://www.w3.org/2001/10/xml-exc-c14n#"><ec:InclusiveNamespaces PrefixList="xs saml"/></ds:Transform></ds:Transforms>"#;
        let doc = ssoguard_xml::parse(xml).unwrap();
        let transforms = read_transforms(Some(doc.root_element())).unwrap();
        assert_eq!(
            transforms,
            vec![
                ReferenceTransform::Enveloped,
                ReferenceTransform::Canonicalize {
                    mode: C14nMode::Exclusive,
                    inclusive_prefixes: vec!["xs".into(), "saml".into()],
                },
            ]
        );
        assert_eq!(transforms[1].uri(), algorithm::EXC_C14N);
        assert!(read_transforms(None).unwrap().is_empty());
    }

    #[test]
    fn test_xpath_transform_unsupported() {
        let xml = r#"<ds:Transforms xmlns:ds="http://www.w3.org/2000/09/xmldsig#"><ds:Transform Algorithm="http://www.w3.org/TR/1999/REC-xpath-19991116"/></ds:Transforms>"#;
        let doc = ssoguard_xml::parse(xml).unwrap();
        assert!(matches!(
            read_transforms(Some(doc.root_element())),
            Err(Error::UnsupportedAlgorithm(_))
        ));
    }
}
