#![forbid(unsafe_code)]

//! Enveloped XML-DSig signature creation.
//!
//! The signature is inserted as a child of the signed element, after its
//! `<saml:Issuer>` when there is one, which is where SAML schemas expect it.

use base64::Engine;
use ssoguard_c14n::C14nMode;
use ssoguard_core::{algorithm, ns, Error};
use ssoguard_crypto::digest;
use ssoguard_keys::{Key, KeyData};
use ssoguard_xml::document::{build_id_map, element_id, find_child_element};
use ssoguard_xml::{tag, writer, NodeSet};
use tracing::debug;

/// Algorithms used when creating a signature.
#[derive(Debug, Clone)]
pub struct SignOptions {
    /// Signature method URI; derived from the key type when `None`.
    pub signature_method: Option<String>,
    pub digest_method: String,
    /// Used both for `SignedInfo` and as the reference transform.
    pub c14n: C14nMode,
}

impl Default for SignOptions {
    fn default() -> Self {
        Self {
            signature_method: None,
            digest_method: algorithm::SHA256.to_owned(),
            c14n: C14nMode::Exclusive,
        }
    }
}

/// Sign the root element of `xml` with an enveloped signature.
///
/// `cert` is the DER encoding of the signer certificate to embed in
/// `<KeyInfo>`; without it the signature carries no key information.
pub fn sign_enveloped(xml: &str, key: &Key, cert: Option<&[u8]>, options: &SignOptions) -> Result<String, Error> {
    let doc = ssoguard_xml::parse(xml)?;
    let root = doc.root_element();
    let uri = match element_id(root) {
        Some(id) => format!("#{id}"),
        None => String::new(),
    };
    sign_node(xml, root, &uri, key, cert, options)
}

/// Sign the element whose ID is `id` with an enveloped signature.
pub fn sign_element(
    xml: &str,
    id: &str,
    key: &Key,
    cert: Option<&[u8]>,
    options: &SignOptions,
) -> Result<String, Error> {
    let doc = ssoguard_xml::parse(xml)?;
    let id_map = build_id_map(&doc)?;
    let target = id_map
        .get(id)
        .and_then(|node_id| doc.get_node(*node_id))
        .ok_or_else(|| Error::InvalidUri(format!("no element with ID {id}")))?;
    sign_node(xml, target, &format!("#{id}"), key, cert, options)
}

fn sign_node(
    xml: &str,
    target: roxmltree::Node<'_, '_>,
    uri: &str,
    key: &Key,
    cert: Option<&[u8]>,
    options: &SignOptions,
) -> Result<String, Error> {
    if find_child_element(target, ns::DSIG, ns::node::SIGNATURE).is_some() {
        return Err(Error::XmlStructure(format!(
            "{} already carries a signature",
            target.tag_name().name()
        )));
    }
    let start = tag::start_tag(target)?;
    if start.self_closing {
        return Err(Error::XmlStructure("cannot sign an empty element".into()));
    }
    let insert_at = match find_child_element(target, ns::SAML, ns::node::ISSUER) {
        Some(issuer) => issuer.range().end,
        None => start.end,
    };

    let signature_method = match &options.signature_method {
        Some(uri) => uri.clone(),
        None => default_signature_method(key).to_owned(),
    };

    // The enveloped transform removes exactly what is inserted below, so the
    // digest can be taken over the unsigned document.
    let covered = ssoguard_c14n::canonicalize_doc(
        target.document(),
        options.c14n,
        Some(&NodeSet::tree_without_comments(target)),
        &[],
    )?;
    let digest_value = digest::digest(&options.digest_method, &covered)?;

    let engine = base64::engine::general_purpose::STANDARD;
    let template = signature_template(
        options.c14n,
        &signature_method,
        uri,
        &options.digest_method,
        &engine.encode(digest_value),
        cert.map(|der| engine.encode(der)).as_deref(),
    );
    let with_template = writer::splice(xml, vec![(insert_at..insert_at, template)])?;

    // Canonicalize SignedInfo in its final context
    let signed_doc = ssoguard_xml::parse(&with_template)?;
    let signed_target = signed_doc
        .get_node(target.id())
        .filter(|n| n.is_element())
        .ok_or_else(|| Error::XmlStructure("signed element not found after insertion".into()))?;
    let sig_node = find_child_element(signed_target, ns::DSIG, ns::node::SIGNATURE)
        .ok_or_else(|| Error::MissingElement("Signature".into()))?;
    let signed_info = find_child_element(sig_node, ns::DSIG, ns::node::SIGNED_INFO)
        .ok_or_else(|| Error::MissingElement("SignedInfo".into()))?;
    let sig_value_node = find_child_element(sig_node, ns::DSIG, ns::node::SIGNATURE_VALUE)
        .ok_or_else(|| Error::MissingElement("SignatureValue".into()))?;

    let c14n_signed_info = ssoguard_c14n::canonicalize_doc(
        &signed_doc,
        options.c14n,
        Some(&NodeSet::tree_without_comments(signed_info)),
        &[],
    )?;

    let sig_alg = ssoguard_crypto::sign::from_uri(&signature_method)?;
    let signature = sig_alg.sign(&key.to_signing_key(), &c14n_signed_info)?;
    debug!(uri, algorithm = %signature_method, "signed element");

    writer::splice(
        &with_template,
        vec![(
            sig_value_node.range(),
            format!("<ds:SignatureValue>{}</ds:SignatureValue>", engine.encode(signature)),
        )],
    )
}

fn default_signature_method(key: &Key) -> &'static str {
    match key.data {
        KeyData::Rsa { .. } => algorithm::RSA_SHA256,
        KeyData::EcP256 { .. } => algorithm::ECDSA_SHA256,
        KeyData::EcP384 { .. } => algorithm::ECDSA_SHA384,
    }
}

fn signature_template(
    c14n: C14nMode,
    signature_method: &str,
    uri: &str,
    digest_method: &str,
    digest_value: &str,
    cert_b64: Option<&str>,
) -> String {
    let mut out = format!(
        concat!(
            r#"<ds:Signature xmlns:ds="{dsig}">"#,
            r#"<ds:SignedInfo>"#,
            r#"<ds:CanonicalizationMethod Algorithm="{c14n}"/>"#,
            r#"<ds:SignatureMethod Algorithm="{sig}"/>"#,
            r#"<ds:Reference URI="{uri}">"#,
            r#"<ds:Transforms>"#,
            r#"<ds:Transform Algorithm="{enveloped}"/>"#,
            r#"<ds:Transform Algorithm="{c14n}"/>"#,
            r#"</ds:Transforms>"#,
            r#"<ds:DigestMethod Algorithm="{digest}"/>"#,
            r#"<ds:DigestValue>{digest_value}</ds:DigestValue>"#,
            r#"</ds:Reference>"#,
            r#"</ds:SignedInfo>"#,
            r#"<ds:SignatureValue></ds:SignatureValue>"#,
        ),
        dsig = ns::DSIG,
        c14n = c14n.uri(),
        sig = signature_method,
        uri = uri,
        enveloped = algorithm::ENVELOPED_SIGNATURE,
        digest = digest_method,
        digest_value = digest_value,
    );
    if let Some(cert) = cert_b64 {
        out.push_str("<ds:KeyInfo><ds:X509Data><ds:X509Certificate>");
        out.push_str(cert);
        out.push_str("</ds:X509Certificate></ds:X509Data></ds:KeyInfo>");
    }
    out.push_str("</ds:Signature>");
    out
}
