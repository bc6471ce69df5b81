#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use ssoguard_core::Error;

/// Reasons an IdP response (or the metadata describing the IdP) is rejected.
///
/// Every variant is terminal: retrying with the same input cannot succeed.
/// Messages may quote provider-supplied text and should not be shown to
/// end users verbatim.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("unmarshalling metadata: {0}")]
    MetadataParse(Error),

    #[error("decoding idp x509 cert: {0}")]
    CertificateDecode(base64::DecodeError),

    #[error("parsing idp x509 cert: {0}")]
    CertificateParse(Error),

    #[error("missing or malformed response: {0}")]
    MalformedResponse(String),

    /// The IdP answered with a non-success status.
    #[error("response status {0}")]
    IdentityProvider(String),

    #[error("base64 decoding response: {0}")]
    Decode(base64::DecodeError),

    #[error("parsing xml response: {0}")]
    XmlParse(Error),

    #[error("signature verification failed: {0}")]
    SignatureVerification(Error),

    #[error("unmarshalling signed doc: {0}")]
    ResponseDecode(Error),

    #[error("missing timestamp from condition: {0}")]
    MissingTimestamp(String),

    #[error("response expired (NotOnOrAfter {not_on_or_after}, now {now})")]
    ResponseExpired {
        not_on_or_after: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    #[error("response too early (NotBefore {not_before}, now {now})")]
    ResponseTooEarly {
        not_before: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    #[error("missing user id")]
    MissingUserId,

    /// Response checks were requested before the signature was validated.
    #[error("response has not been signature-verified")]
    NotVerified,

    #[error("audience mismatch: assertion is for {found:?}, expected one of {expected:?}")]
    AudienceMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}
