#![forbid(unsafe_code)]

//! Two-tier signature verification of a SAML response document.
//!
//! IdPs sign either the whole response or only its assertions.  The whole
//! document is tried first; only when it carries no signature at all are the
//! assertions verified one by one.  A document signature that is present but
//! bad never falls through to the assertion path.

use ssoguard_core::{ns, Error};
use ssoguard_dsig::ValidationContext;
use ssoguard_xml::document::is_element;
use ssoguard_xml::writer;
use tracing::debug;

/// Which part of a response the verified signature(s) covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureScope {
    /// One signature over the response element.
    Document,
    /// Individually signed assertions (their count).
    Assertions(usize),
}

/// A response document reduced to its signature-verified content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedDocument {
    /// The document text; every byte that matters has been verified.
    pub xml: String,
    pub scope: SignatureScope,
    pub signers: Vec<String>,
}

/// Verify the signature(s) of a response document.
pub fn verify_document(ctx: &ValidationContext, xml: &str) -> Result<VerifiedDocument, Error> {
    match ctx.validate(xml) {
        Ok(verified) => {
            debug!(signer = verified.signer(), "response verified by document signature");
            let signers = vec![verified.signer().to_owned()];
            Ok(VerifiedDocument {
                xml: verified.into_text(),
                scope: SignatureScope::Document,
                signers,
            })
        }
        Err(e) if e.is_missing_signature() => {
            debug!("response is not signed; verifying assertions individually");
            verify_assertions(ctx, xml)
        }
        Err(e) => Err(e),
    }
}

/// Verify each assertion on its own and put the verified copies back.
fn verify_assertions(ctx: &ValidationContext, xml: &str) -> Result<VerifiedDocument, Error> {
    let doc = ssoguard_xml::parse(xml)?;
    let root = doc.root_element();

    let assertions: Vec<_> = root
        .descendants()
        .skip(1)
        .filter(|n| is_element(*n, ns::SAML, ns::node::ASSERTION))
        .collect();

    // An assertion anywhere but directly under the response could be a
    // wrapped copy hiding behind a legitimately signed one.
    for assertion in &assertions {
        let parent = assertion.parent_element();
        if parent.map(|p| p.id()) != Some(root.id()) {
            let tag = parent.map(|p| p.tag_name().name()).unwrap_or_default();
            return Err(Error::UnexpectedParent(tag.to_owned()));
        }
    }

    if assertions.is_empty() {
        return Err(Error::MissingSignature(format!(
            "{} (no assertions to verify)",
            root.tag_name().name()
        )));
    }

    let mut replacements = Vec::with_capacity(assertions.len());
    let mut signers = Vec::with_capacity(assertions.len());
    for assertion in &assertions {
        let detached = writer::detach(*assertion)?;
        let verified = ctx.validate(&detached)?;
        signers.push(verified.signer().to_owned());
        replacements.push((assertion.range(), verified.into_text()));
    }
    debug!(count = assertions.len(), "assertions verified");

    Ok(VerifiedDocument {
        xml: writer::splice(xml, replacements)?,
        scope: SignatureScope::Assertions(assertions.len()),
        signers,
    })
}
