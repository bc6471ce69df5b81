#![forbid(unsafe_code)]

//! KeyInfo processing: certificate extraction and signer resolution.

use base64::Engine;
use ssoguard_core::{ns, Error};
use ssoguard_xml::document::{compact_text, find_child_elements};

use crate::store::CertificateStore;
use crate::x509::TrustedCertificate;

/// Base64-decoded `<X509Certificate>` values under a `<KeyInfo>`, in document order.
pub fn x509_certificates(key_info: roxmltree::Node<'_, '_>) -> Result<Vec<Vec<u8>>, Error> {
    let engine = base64::engine::general_purpose::STANDARD;
    let mut certs = Vec::new();
    for x509_data in find_child_elements(key_info, ns::DSIG, ns::node::X509_DATA) {
        for cert_node in find_child_elements(x509_data, ns::DSIG, ns::node::X509_CERTIFICATE) {
            let b64 = compact_text(cert_node);
            let der = engine
                .decode(&b64)
                .map_err(|e| Error::Base64(format!("X509Certificate: {e}")))?;
            certs.push(der);
        }
    }
    Ok(certs)
}

/// Pick the trusted certificate that must have produced a signature.
///
/// When the signature carries certificates, the first one is the signer
/// and must match a trusted root exactly. Without certificates the store
/// must hold a single root, which is then assumed.
pub fn resolve_signer<'s>(
    key_info: Option<roxmltree::Node<'_, '_>>,
    store: &'s CertificateStore,
) -> Result<&'s TrustedCertificate, Error> {
    let embedded = match key_info {
        Some(node) => x509_certificates(node)?,
        None => Vec::new(),
    };

    match embedded.first() {
        Some(der) => store.find_exact(der).ok_or_else(|| {
            let subject = TrustedCertificate::from_der(der)
                .map(|c| c.subject())
                .unwrap_or_else(|_| "<unparseable certificate>".into());
            Error::UntrustedCertificate(subject)
        }),
        None => store.sole_root().ok_or_else(|| {
            Error::UntrustedCertificate(format!(
                "no certificate in KeyInfo and {} trusted roots to choose from",
                store.len()
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cert_b64(pem: &[u8]) -> String {
        let der = crate::loader::decode_cert_pem(pem).unwrap();
        base64::engine::general_purpose::STANDARD.encode(der)
    }

    fn key_info_xml(certs: &[String]) -> String {
        let mut xml = String::from(r#"<ds:KeyInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#"><ds:X509Data>"#);
        for c in certs {
            xml.push_str("<ds:X509Certificate>\n");
            for line in c.as_bytes().chunks(64) {
                xml.push_str(std::str::from_utf8(line).unwrap());
                xml.push('\n');
            }
            xml.push_str("</ds:X509Certificate>");
        }
        xml.push_str("</ds:X509Data></ds:KeyInfo>");
        xml
    }

    fn idp_store() -> CertificateStore {
        let der = crate::loader::decode_cert_pem(include_bytes!("../../../testdata/idp-cert.pem")).unwrap();
        CertificateStore::from_der_certs([der]).unwrap()
    }

    #[test]
    fn test_extracts_wrapped_certificates() {
        let xml = key_info_xml(&[cert_b64(include_bytes!("../../../testdata/idp-cert.pem"))]);
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let certs = x509_certificates(doc.root_element()).unwrap();
        assert_eq!(certs.len(), 1);
        assert!(idp_store().find_exact(&certs[0]).is_some());
    }

    #[test]
    fn test_resolve_trusted() {
        let store = idp_store();
        let xml = key_info_xml(&[cert_b64(include_bytes!("../../../testdata/idp-cert.pem"))]);
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let signer = resolve_signer(Some(doc.root_element()), &store).unwrap();
        assert!(signer.subject().contains("idp.example.com"));
    }

    #[test]
    fn test_resolve_untrusted() {
        let store = idp_store();
        let xml = key_info_xml(&[cert_b64(include_bytes!("../../../testdata/attacker-cert.pem"))]);
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let err = resolve_signer(Some(doc.root_element()), &store).unwrap_err();
        assert!(matches!(err, Error::UntrustedCertificate(_)));
    }

    #[test]
    fn test_resolve_without_key_info() {
        let store = idp_store();
        assert!(resolve_signer(None, &store).is_ok());
        assert!(matches!(
            resolve_signer(None, &CertificateStore::default()),
            Err(Error::UntrustedCertificate(_))
        ));
    }

    #[test]
    fn test_bad_base64() {
        let xml = r#"<ds:KeyInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#"><ds:X509Data><ds:X509Certificate>@@@</ds:X509Certificate></ds:X509Data></ds:KeyInfo>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        assert!(matches!(x509_certificates(doc.root_element()), Err(Error::Base64(_))));
    }
}
