#![forbid(unsafe_code)]

//! IdP metadata (SAML Metadata 2.0) and the trust store built from it.

use base64::Engine;
use ssoguard_core::{ns, Error};
use ssoguard_keys::{CertificateStore, TrustedCertificate};
use ssoguard_xml::document::{compact_text, find_child_element, find_child_elements, is_element};
use tracing::debug;

use crate::error::ValidationError;

/// `<md:EntityDescriptor>` of an identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityDescriptor {
    pub entity_id: String,
    pub idp_sso_descriptor: Option<IdpSsoDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdpSsoDescriptor {
    pub key_descriptors: Vec<KeyDescriptor>,
    pub single_sign_on_services: Vec<Endpoint>,
    pub name_id_formats: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyDescriptor {
    /// `signing`, `encryption`, or `None` when the key serves both.
    pub use_: Option<String>,
    /// Base64 text of the `X509Certificate`, whitespace removed.
    pub certificate: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub binding: String,
    pub location: String,
}

impl EntityDescriptor {
    /// Parse metadata XML.
    pub fn parse(xml: &str) -> Result<Self, Error> {
        let doc = ssoguard_xml::parse(xml)?;
        let root = doc.root_element();
        if !is_element(root, ns::MD, ns::node::ENTITY_DESCRIPTOR) {
            return Err(Error::XmlStructure(format!(
                "expected md:EntityDescriptor, found {}",
                root.tag_name().name()
            )));
        }
        let entity_id = root
            .attribute(ns::attr::ENTITY_ID)
            .ok_or_else(|| Error::MissingAttribute("entityID on EntityDescriptor".into()))?
            .to_owned();

        let idp_sso_descriptor = find_child_element(root, ns::MD, ns::node::IDP_SSO_DESCRIPTOR).map(|idp| {
            let key_descriptors = find_child_elements(idp, ns::MD, ns::node::KEY_DESCRIPTOR)
                .into_iter()
                .map(|kd| KeyDescriptor {
                    use_: kd.attribute(ns::attr::USE).map(str::to_owned),
                    certificate: kd
                        .descendants()
                        .find(|n| is_element(*n, ns::DSIG, ns::node::X509_CERTIFICATE))
                        .map(compact_text)
                        .unwrap_or_default(),
                })
                .collect();
            let single_sign_on_services = find_child_elements(idp, ns::MD, ns::node::SINGLE_SIGN_ON_SERVICE)
                .into_iter()
                .map(|sso| Endpoint {
                    binding: sso.attribute(ns::attr::BINDING).unwrap_or_default().to_owned(),
                    location: sso.attribute(ns::attr::LOCATION).unwrap_or_default().to_owned(),
                })
                .collect();
            let name_id_formats = find_child_elements(idp, ns::MD, ns::node::NAME_ID_FORMAT)
                .into_iter()
                .filter_map(|n| n.text())
                .map(|t| t.trim().to_owned())
                .collect();
            IdpSsoDescriptor {
                key_descriptors,
                single_sign_on_services,
                name_id_formats,
            }
        });

        Ok(Self {
            entity_id,
            idp_sso_descriptor,
        })
    }

    /// Location of the single sign-on endpoint for `binding`.
    pub fn sso_location(&self, binding: &str) -> Option<&str> {
        self.idp_sso_descriptor
            .as_ref()?
            .single_sign_on_services
            .iter()
            .find(|e| e.binding == binding)
            .map(|e| e.location.as_str())
    }

    /// Build the trust store from every key descriptor's certificate.
    ///
    /// A certificate that does not decode or parse aborts the build.
    pub fn trust_store(&self) -> Result<CertificateStore, ValidationError> {
        let engine = base64::engine::general_purpose::STANDARD;
        let descriptors = self
            .idp_sso_descriptor
            .as_ref()
            .map(|d| d.key_descriptors.as_slice())
            .unwrap_or_default();

        let mut roots = Vec::with_capacity(descriptors.len());
        for kd in descriptors {
            let der = engine
                .decode(&kd.certificate)
                .map_err(ValidationError::CertificateDecode)?;
            let cert = TrustedCertificate::from_der(&der).map_err(ValidationError::CertificateParse)?;
            debug!(subject = %cert.subject(), usage = kd.use_.as_deref().unwrap_or("any"), "trusting IdP certificate");
            roots.push(cert);
        }
        Ok(CertificateStore::new(roots))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const METADATA: &str = include_str!("../../../testdata/idp-metadata.xml");

    #[test]
    fn test_parse_metadata() {
        let md = EntityDescriptor::parse(METADATA).unwrap();
        assert_eq!(md.entity_id, "https://idp.example.com/saml/metadata");
        let idp = md.idp_sso_descriptor.as_ref().unwrap();
        assert_eq!(idp.key_descriptors.len(), 1);
        assert_eq!(idp.key_descriptors[0].use_.as_deref(), Some("signing"));
        assert!(!idp.key_descriptors[0].certificate.contains('\n'));
        assert_eq!(
            idp.name_id_formats,
            vec!["urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress".to_owned()]
        );
        assert_eq!(
            md.sso_location("urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST"),
            Some("https://idp.example.com/saml/sso")
        );
    }

    #[test]
    fn test_trust_store() {
        let store = EntityDescriptor::parse(METADATA).unwrap().trust_store().unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.roots()[0].subject().contains("idp.example.com"));
    }

    #[test]
    fn test_wrong_root() {
        let err = EntityDescriptor::parse("<Response/>").unwrap_err();
        assert!(matches!(err, Error::XmlStructure(_)));
    }

    #[test]
    fn test_bad_certificate_base64() {
        let md = METADATA.replacen("MIIC8jCC", "MIIC8j!!", 1);
        let err = EntityDescriptor::parse(&md).unwrap().trust_store().unwrap_err();
        assert!(matches!(err, ValidationError::CertificateDecode(_)));
    }

    #[test]
    fn test_bad_certificate_der() {
        let md = METADATA.replacen("MIIC8jCC", "AAAAAAAA", 1);
        let err = EntityDescriptor::parse(&md).unwrap().trust_store().unwrap_err();
        assert!(matches!(err, ValidationError::CertificateParse(_)));
    }

    #[test]
    fn test_no_idp_descriptor() {
        let md = EntityDescriptor::parse(
            r#"<md:EntityDescriptor xmlns:md="urn:oasis:names:tc:SAML:2.0:metadata" entityID="x"/>"#,
        )
        .unwrap();
        assert!(md.trust_store().unwrap().is_empty());
    }
}
