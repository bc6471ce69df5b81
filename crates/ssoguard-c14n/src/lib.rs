#![forbid(unsafe_code)]

//! XML Canonicalization (C14N) for ssoguard.
//!
//! Implements the four W3C canonicalization variants SAML signatures use:
//! - Canonical XML 1.0 (with and without comments)
//! - Exclusive Canonical XML 1.0 (with and without comments)

pub mod exclusive;
pub mod inclusive;
pub mod render;

use ssoguard_core::{algorithm, Error};
use ssoguard_xml::NodeSet;

/// The canonicalization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum C14nMode {
    /// Canonical XML 1.0
    Inclusive,
    /// Canonical XML 1.0 with comments
    InclusiveWithComments,
    /// Exclusive Canonical XML 1.0
    Exclusive,
    /// Exclusive Canonical XML 1.0 with comments
    ExclusiveWithComments,
}

impl C14nMode {
    /// Get the algorithm URI for this mode.
    pub fn uri(&self) -> &'static str {
        match self {
            Self::Inclusive => algorithm::C14N,
            Self::InclusiveWithComments => algorithm::C14N_WITH_COMMENTS,
            Self::Exclusive => algorithm::EXC_C14N,
            Self::ExclusiveWithComments => algorithm::EXC_C14N_WITH_COMMENTS,
        }
    }

    /// Parse a C14N mode from an algorithm URI.
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            algorithm::C14N => Some(Self::Inclusive),
            algorithm::C14N_WITH_COMMENTS => Some(Self::InclusiveWithComments),
            algorithm::EXC_C14N => Some(Self::Exclusive),
            algorithm::EXC_C14N_WITH_COMMENTS => Some(Self::ExclusiveWithComments),
            _ => None,
        }
    }

    pub fn with_comments(&self) -> bool {
        matches!(self, Self::InclusiveWithComments | Self::ExclusiveWithComments)
    }

    pub fn is_exclusive(&self) -> bool {
        matches!(self, Self::Exclusive | Self::ExclusiveWithComments)
    }
}

/// Canonicalize an XML document.
///
/// - `xml`: the raw XML text
/// - `mode`: which C14N variant to use
/// - `node_set`: optional node set (for document-subset canonicalization)
/// - `inclusive_prefixes`: for exclusive C14N, the InclusiveNamespaces PrefixList
pub fn canonicalize(
    xml: &str,
    mode: C14nMode,
    node_set: Option<&NodeSet>,
    inclusive_prefixes: &[String],
) -> Result<Vec<u8>, Error> {
    let doc = ssoguard_xml::parse(xml)?;
    canonicalize_doc(&doc, mode, node_set, inclusive_prefixes)
}

/// Canonicalize a pre-parsed document.
pub fn canonicalize_doc(
    doc: &roxmltree::Document<'_>,
    mode: C14nMode,
    node_set: Option<&NodeSet>,
    inclusive_prefixes: &[String],
) -> Result<Vec<u8>, Error> {
    if mode.is_exclusive() {
        exclusive::canonicalize(doc, mode.with_comments(), node_set, inclusive_prefixes)
    } else {
        inclusive::canonicalize(doc, mode.with_comments(), node_set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_uri_roundtrip() {
        for mode in [
            C14nMode::Inclusive,
            C14nMode::InclusiveWithComments,
            C14nMode::Exclusive,
            C14nMode::ExclusiveWithComments,
        ] {
            assert_eq!(C14nMode::from_uri(mode.uri()), Some(mode));
        }
        assert_eq!(C14nMode::from_uri("http://www.w3.org/2006/12/xml-c14n11"), None);
    }

    #[test]
    fn test_signed_info_subset_matches_detached() {
        let xml = r#"<r xmlns:ds="http://www.w3.org/2000/09/xmldsig#"><ds:Signature><ds:SignedInfo><ds:CanonicalizationMethod Algorithm="http://www.w3.org/2001/10/xml-exc-c14n#"/></ds:SignedInfo></ds:Signature></r>"#;
        let doc = ssoguard_xml::parse(xml).unwrap();
        let signed_info = doc
            .descendants()
            .find(|n| n.tag_name().name() == "SignedInfo")
            .unwrap();
        let set = NodeSet::tree_without_comments(signed_info);
        let out = canonicalize_doc(&doc, C14nMode::Exclusive, Some(&set), &[]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"<ds:SignedInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#"><ds:CanonicalizationMethod Algorithm="http://www.w3.org/2001/10/xml-exc-c14n#"></ds:CanonicalizationMethod></ds:SignedInfo>"#
        );
    }
}
