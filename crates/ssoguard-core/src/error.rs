#![forbid(unsafe_code)]

/// Errors produced by the XML-DSig layers of ssoguard.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("invalid XML structure: {0}")]
    XmlStructure(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("cryptographic error: {0}")]
    Crypto(String),

    #[error("key error: {0}")]
    Key(String),

    #[error("signature verification failed: {0}")]
    SignatureInvalid(String),

    #[error("digest mismatch for reference: {0}")]
    DigestMismatch(String),

    #[error("canonicalization error: {0}")]
    Canonicalization(String),

    #[error("transform error: {0}")]
    Transform(String),

    #[error("base64 decode error: {0}")]
    Base64(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing required element: {0}")]
    MissingElement(String),

    #[error("missing required attribute: {0}")]
    MissingAttribute(String),

    #[error("invalid URI reference: {0}")]
    InvalidUri(String),

    #[error("certificate error: {0}")]
    Certificate(String),

    #[error("certificate is not trusted: {0}")]
    UntrustedCertificate(String),

    /// No `<Signature>` element is attached to the element being validated.
    ///
    /// This is the only verification outcome that allows a caller to fall
    /// back to validating signed sub-elements individually.
    #[error("no signature found on element {0}")]
    MissingSignature(String),

    #[error("assertion with unexpected parent: {0}")]
    UnexpectedParent(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error means "unsigned" rather than "badly signed".
    pub fn is_missing_signature(&self) -> bool {
        matches!(self, Error::MissingSignature(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_signature_classification() {
        assert!(Error::MissingSignature("Response".into()).is_missing_signature());
        assert!(!Error::SignatureInvalid("bad".into()).is_missing_signature());
        assert!(!Error::UntrustedCertificate("cn".into()).is_missing_signature());
    }

    #[test]
    fn test_display_carries_context() {
        let err = Error::UnexpectedParent("Extensions".into());
        assert_eq!(err.to_string(), "assertion with unexpected parent: Extensions");
    }
}
