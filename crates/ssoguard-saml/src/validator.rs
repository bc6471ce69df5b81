#![forbid(unsafe_code)]

//! Validation of IdP responses against a fixed trust store.

use chrono::{DateTime, Utc};
use ssoguard_dsig::ValidationContext;
use ssoguard_keys::CertificateStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::auth::{decode_payload, Auth, VerifiedResponse};
use crate::config::ValidatorConfig;
use crate::error::ValidationError;
use crate::metadata::EntityDescriptor;
use crate::response::Response;
use crate::verifier;

static NEXT_VALIDATOR_ID: AtomicU64 = AtomicU64::new(1);

/// Validates SAML responses issued by one identity provider.
///
/// Immutable after construction and safe to share between threads.
#[derive(Debug)]
pub struct Validator {
    id: u64,
    metadata: EntityDescriptor,
    context: ValidationContext,
    audiences: Vec<String>,
}

impl Validator {
    /// Build a validator from IdP metadata XML.
    pub fn new(metadata: &str, config: ValidatorConfig) -> Result<Self, ValidationError> {
        let descriptor = EntityDescriptor::parse(metadata).map_err(ValidationError::MetadataParse)?;
        Self::from_descriptor(descriptor, config)
    }

    pub fn from_descriptor(metadata: EntityDescriptor, config: ValidatorConfig) -> Result<Self, ValidationError> {
        let store = metadata.trust_store()?;
        debug!(entity_id = %metadata.entity_id, roots = store.len(), "validator ready");
        let context = ValidationContext::new(Arc::new(store))
            .with_clock(config.clock)
            .with_allow_sha1(config.allow_sha1);
        Ok(Self {
            id: NEXT_VALIDATOR_ID.fetch_add(1, Ordering::Relaxed),
            metadata,
            context,
            audiences: config.audiences,
        })
    }

    pub fn metadata(&self) -> &EntityDescriptor {
        &self.metadata
    }

    pub fn trust_store(&self) -> &CertificateStore {
        self.context.store()
    }

    /// Check the IdP status, then verify the response signature and attach
    /// the verified response to `auth`.
    pub fn validate_signature<A: Auth>(&self, mut auth: A) -> Result<A, ValidationError> {
        let status = auth
            .status()
            .map_err(|e| ValidationError::MalformedResponse(e.to_string()))?;
        if !status.is_success() {
            return Err(ValidationError::IdentityProvider(auth.status_description()));
        }

        let decoded = decode_payload(auth.raw_response()).map_err(ValidationError::Decode)?;
        let xml = String::from_utf8(decoded).map_err(|e| {
            ValidationError::XmlParse(ssoguard_core::Error::XmlParse(format!("response is not UTF-8: {e}")))
        })?;
        ssoguard_xml::parse(&xml).map_err(ValidationError::XmlParse)?;

        let verified = verifier::verify_document(&self.context, &xml).map_err(ValidationError::SignatureVerification)?;

        // Only the verified text is read from here on
        let response = Response::parse(&verified.xml).map_err(ValidationError::ResponseDecode)?;
        debug!(response_id = %response.id, scope = ?verified.scope, "response signature verified");
        auth.set_response(VerifiedResponse::new(response, verified.scope, verified.signers, self.id));
        Ok(auth)
    }

    /// Check the validity window, audience and user identity of a response
    /// already passed through this validator's [`Validator::validate_signature`].
    pub fn validate_response<A: Auth + ?Sized>(&self, auth: &A) -> Result<(), ValidationError> {
        let verified = auth
            .response()
            .filter(|r| r.verified_by(self.id))
            .ok_or(ValidationError::NotVerified)?;
        let assertion = verified
            .response()
            .assertion
            .as_ref()
            .ok_or_else(|| ValidationError::MissingTimestamp("response carries no assertion".into()))?;
        let conditions = &assertion.conditions;

        let not_on_or_after = parse_timestamp("NotOnOrAfter", &conditions.not_on_or_after)?;
        let not_before = parse_timestamp("NotBefore", &conditions.not_before)?;

        let now = self.context.clock().now();
        if now >= not_on_or_after {
            return Err(ValidationError::ResponseExpired { not_on_or_after, now });
        }
        if now < not_before {
            return Err(ValidationError::ResponseTooEarly { not_before, now });
        }

        if !self.audiences.is_empty() && !conditions.audiences.iter().any(|a| self.audiences.contains(a)) {
            return Err(ValidationError::AudienceMismatch {
                expected: self.audiences.clone(),
                found: conditions.audiences.clone(),
            });
        }

        if auth.user_id().is_empty() {
            return Err(ValidationError::MissingUserId);
        }
        Ok(())
    }

    /// [`Validator::validate_signature`] followed by [`Validator::validate_response`].
    pub fn validate<A: Auth>(&self, auth: A) -> Result<A, ValidationError> {
        let auth = self.validate_signature(auth)?;
        self.validate_response(&auth)?;
        Ok(auth)
    }
}

fn parse_timestamp(name: &str, value: &str) -> Result<DateTime<Utc>, ValidationError> {
    ssoguard_core::parse_timestamp(value).map_err(|e| ValidationError::MissingTimestamp(format!("{name}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validator_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Validator>();
    }

    #[test]
    fn test_parse_timestamp() {
        let t = parse_timestamp("NotBefore", "2024-06-01T12:00:00.250+02:00").unwrap();
        assert_eq!(t.to_rfc3339(), "2024-06-01T10:00:00.250+00:00");
        assert!(matches!(
            parse_timestamp("NotBefore", ""),
            Err(ValidationError::MissingTimestamp(_))
        ));
        for value in ["2024-06-01 12:00:00Z", "2024-06-01t12:00:00z", "2024-06-01T12:00:00z"] {
            assert!(
                matches!(parse_timestamp("NotBefore", value), Err(ValidationError::MissingTimestamp(_))),
                "{value:?} accepted"
            );
        }
    }

    #[test]
    fn test_bad_metadata() {
        let err = Validator::new("<md:EntityDescriptor", ValidatorConfig::default()).unwrap_err();
        assert!(matches!(err, ValidationError::MetadataParse(_)));
    }
}
