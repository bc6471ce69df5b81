#![forbid(unsafe_code)]

//! XML-DSig signature validation.
//!
//! Processing order:
//! 1. Locate the `<Signature>` child of the root element
//! 2. Read `<SignedInfo>`: CanonicalizationMethod, SignatureMethod
//! 3. Check the single `<Reference>` points at the root, run its transforms, compare the digest
//! 4. Resolve the signer from `<KeyInfo>` against the trust store and check its validity period
//! 5. Canonicalize `<SignedInfo>`
//! 6. Verify `<SignatureValue>`

use crate::context::ValidationContext;
use crate::reference::{self, ReferenceTransform};
use base64::Engine;
use ssoguard_c14n::C14nMode;
use ssoguard_core::{algorithm, ns, Error};
use ssoguard_crypto::digest;
use ssoguard_xml::document::{build_id_map, compact_text, element_id, find_child_element, find_child_elements};
use ssoguard_xml::NodeSet;
use tracing::{debug, trace};

/// The content covered by a successfully validated signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    text: String,
    signer: String,
}

impl Verified {
    /// Canonical form of the signed element, without its signature.
    ///
    /// These are exactly the bytes the reference digest was computed over,
    /// so nothing outside the signature's coverage can be present.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Subject of the trusted certificate that produced the signature.
    pub fn signer(&self) -> &str {
        &self.signer
    }
}

impl ValidationContext {
    /// Validate the enveloped signature on the root element of `xml`.
    ///
    /// Returns [`Error::MissingSignature`] when the root element carries no
    /// signature at all; every other failure means the signature is present
    /// but unacceptable.
    pub fn validate(&self, xml: &str) -> Result<Verified, Error> {
        let doc = ssoguard_xml::parse(xml)?;
        let root = doc.root_element();
        let id_map = build_id_map(&doc)?;

        let sig_node = match find_child_elements(root, ns::DSIG, ns::node::SIGNATURE).as_slice() {
            [] => return Err(Error::MissingSignature(root.tag_name().name().to_owned())),
            [one] => *one,
            many => {
                return Err(Error::XmlStructure(format!(
                    "{} Signature elements on {}",
                    many.len(),
                    root.tag_name().name()
                )))
            }
        };
        debug!(element = root.tag_name().name(), id = element_id(root), "validating enveloped signature");

        let signed_info = find_child_element(sig_node, ns::DSIG, ns::node::SIGNED_INFO)
            .ok_or_else(|| Error::MissingElement("SignedInfo".into()))?;

        let c14n_method_node = find_child_element(signed_info, ns::DSIG, ns::node::CANONICALIZATION_METHOD)
            .ok_or_else(|| Error::MissingElement("CanonicalizationMethod".into()))?;
        let c14n_uri = crate::algorithm_attr(c14n_method_node, "CanonicalizationMethod")?;
        let c14n_mode = C14nMode::from_uri(c14n_uri)
            .ok_or_else(|| Error::UnsupportedAlgorithm(format!("C14N: {c14n_uri}")))?;
        let inclusive_prefixes = crate::read_inclusive_prefixes(c14n_method_node);

        let sig_method_node = find_child_element(signed_info, ns::DSIG, ns::node::SIGNATURE_METHOD)
            .ok_or_else(|| Error::MissingElement("SignatureMethod".into()))?;
        let sig_method_uri = crate::algorithm_attr(sig_method_node, "SignatureMethod")?;
        self.check_policy(sig_method_uri)?;

        let ref_node = match find_child_elements(signed_info, ns::DSIG, ns::node::REFERENCE).as_slice() {
            [one] => *one,
            refs => {
                return Err(Error::XmlStructure(format!(
                    "expected exactly one Reference, found {}",
                    refs.len()
                )))
            }
        };
        let signed_bytes = self.verify_reference(ref_node, &doc, &id_map, sig_node)?;

        let key_info = find_child_element(sig_node, ns::DSIG, ns::node::KEY_INFO);
        let signer = ssoguard_keys::keyinfo::resolve_signer(key_info, self.store())?;
        signer.check_validity(self.clock().now())?;
        debug!(subject = %signer.subject(), "signer certificate trusted");

        let signed_info_ns = NodeSet::tree_without_comments(signed_info);
        let c14n_signed_info =
            ssoguard_c14n::canonicalize_doc(&doc, c14n_mode, Some(&signed_info_ns), &inclusive_prefixes)?;
        trace!(pre_signature = %String::from_utf8_lossy(&c14n_signed_info), "canonical SignedInfo");

        let sig_value_node = find_child_element(sig_node, ns::DSIG, ns::node::SIGNATURE_VALUE)
            .ok_or_else(|| Error::MissingElement("SignatureValue".into()))?;
        let sig_value = base64::engine::general_purpose::STANDARD
            .decode(compact_text(sig_value_node))
            .map_err(|e| Error::Base64(format!("SignatureValue: {e}")))?;

        let sig_alg = ssoguard_crypto::sign::from_uri(sig_method_uri)?;
        let valid = sig_alg.verify(&signer.key().to_signing_key(), &c14n_signed_info, &sig_value)?;
        if !valid {
            return Err(Error::SignatureInvalid(format!(
                "SignatureValue does not verify with the certificate of {}",
                signer.subject()
            )));
        }
        debug!(algorithm = sig_method_uri, "signature value verified");

        let text = String::from_utf8(signed_bytes)
            .map_err(|e| Error::Canonicalization(format!("canonical output is not UTF-8: {e}")))?;
        Ok(Verified {
            text,
            signer: signer.subject(),
        })
    }

    fn check_policy(&self, uri: &str) -> Result<(), Error> {
        if !self.allow_sha1() && algorithm::is_sha1(uri) {
            return Err(Error::UnsupportedAlgorithm(format!("SHA-1 based algorithm is disabled: {uri}")));
        }
        Ok(())
    }

    /// Check the reference digest and return the bytes it covers.
    fn verify_reference(
        &self,
        ref_node: roxmltree::Node<'_, '_>,
        doc: &roxmltree::Document<'_>,
        id_map: &std::collections::HashMap<String, roxmltree::NodeId>,
        sig_node: roxmltree::Node<'_, '_>,
    ) -> Result<Vec<u8>, Error> {
        let uri = ref_node.attribute(ns::attr::URI).unwrap_or("");

        // The reference must cover the element the signature is attached to
        let root = doc.root_element();
        if let Some(target) = reference::resolve_target(uri, doc, id_map)? {
            if target.id() != root.id() {
                return Err(Error::XmlStructure(format!(
                    "Reference URI {uri} does not point at the signed element"
                )));
            }
        }

        let digest_method_node = find_child_element(ref_node, ns::DSIG, ns::node::DIGEST_METHOD)
            .ok_or_else(|| Error::MissingElement("DigestMethod".into()))?;
        let digest_uri = crate::algorithm_attr(digest_method_node, "DigestMethod")?;
        self.check_policy(digest_uri)?;

        let digest_value_node = find_child_element(ref_node, ns::DSIG, ns::node::DIGEST_VALUE)
            .ok_or_else(|| Error::MissingElement("DigestValue".into()))?;
        let expected_digest = base64::engine::general_purpose::STANDARD
            .decode(compact_text(digest_value_node))
            .map_err(|e| Error::Base64(format!("DigestValue: {e}")))?;

        let transforms = reference::read_transforms(find_child_element(ref_node, ns::DSIG, ns::node::TRANSFORMS))?;
        trace!(transforms = ?transforms.iter().map(ReferenceTransform::uri).collect::<Vec<_>>(), "reference transforms");
        let selected = reference::select(uri, doc, id_map)?;
        let bytes = reference::digest_input(doc, selected, sig_node, &transforms)?;
        trace!(pre_digest = %String::from_utf8_lossy(&bytes), "canonical reference data");

        let computed = digest::digest(digest_uri, &bytes)?;
        if computed != expected_digest {
            return Err(Error::DigestMismatch(format!("URI=\"{uri}\"")));
        }
        debug!(uri, bytes = bytes.len(), "reference digest matched");
        Ok(bytes)
    }
}
