#![forbid(unsafe_code)]

//! SAML 2.0 status codes (SAML Core section 3.2.2.2).

use std::fmt;

const PREFIX: &str = "urn:oasis:names:tc:SAML:2.0:status:";

/// A top-level or second-level SAML status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    // Top-level
    Success,
    Requester,
    Responder,
    VersionMismatch,
    // Second-level
    AuthnFailed,
    InvalidAttrNameOrValue,
    InvalidNameIdPolicy,
    NoAuthnContext,
    NoAvailableIdp,
    NoPassive,
    NoSupportedIdp,
    PartialLogout,
    ProxyCountExceeded,
    RequestDenied,
    RequestUnsupported,
    RequestVersionDeprecated,
    RequestVersionTooHigh,
    RequestVersionTooLow,
    ResourceNotRecognized,
    TooManyResponses,
    UnknownAttrProfile,
    UnknownPrincipal,
    UnsupportedBinding,
}

impl StatusCode {
    const ALL: [StatusCode; 23] = [
        StatusCode::Success,
        StatusCode::Requester,
        StatusCode::Responder,
        StatusCode::VersionMismatch,
        StatusCode::AuthnFailed,
        StatusCode::InvalidAttrNameOrValue,
        StatusCode::InvalidNameIdPolicy,
        StatusCode::NoAuthnContext,
        StatusCode::NoAvailableIdp,
        StatusCode::NoPassive,
        StatusCode::NoSupportedIdp,
        StatusCode::PartialLogout,
        StatusCode::ProxyCountExceeded,
        StatusCode::RequestDenied,
        StatusCode::RequestUnsupported,
        StatusCode::RequestVersionDeprecated,
        StatusCode::RequestVersionTooHigh,
        StatusCode::RequestVersionTooLow,
        StatusCode::ResourceNotRecognized,
        StatusCode::TooManyResponses,
        StatusCode::UnknownAttrProfile,
        StatusCode::UnknownPrincipal,
        StatusCode::UnsupportedBinding,
    ];

    /// Look up a status code by its full URI.
    pub fn from_uri(uri: &str) -> Option<Self> {
        let name = uri.trim().strip_prefix(PREFIX)?;
        Self::ALL.into_iter().find(|code| code.name() == name)
    }

    /// The last segment of the status URI.
    pub fn name(&self) -> &'static str {
        match self {
            StatusCode::Success => "Success",
            StatusCode::Requester => "Requester",
            StatusCode::Responder => "Responder",
            StatusCode::VersionMismatch => "VersionMismatch",
            StatusCode::AuthnFailed => "AuthnFailed",
            StatusCode::InvalidAttrNameOrValue => "InvalidAttrNameOrValue",
            StatusCode::InvalidNameIdPolicy => "InvalidNameIDPolicy",
            StatusCode::NoAuthnContext => "NoAuthnContext",
            StatusCode::NoAvailableIdp => "NoAvailableIDP",
            StatusCode::NoPassive => "NoPassive",
            StatusCode::NoSupportedIdp => "NoSupportedIDP",
            StatusCode::PartialLogout => "PartialLogout",
            StatusCode::ProxyCountExceeded => "ProxyCountExceeded",
            StatusCode::RequestDenied => "RequestDenied",
            StatusCode::RequestUnsupported => "RequestUnsupported",
            StatusCode::RequestVersionDeprecated => "RequestVersionDeprecated",
            StatusCode::RequestVersionTooHigh => "RequestVersionTooHigh",
            StatusCode::RequestVersionTooLow => "RequestVersionTooLow",
            StatusCode::ResourceNotRecognized => "ResourceNotRecognized",
            StatusCode::TooManyResponses => "TooManyResponses",
            StatusCode::UnknownAttrProfile => "UnknownAttrProfile",
            StatusCode::UnknownPrincipal => "UnknownPrincipal",
            StatusCode::UnsupportedBinding => "UnsupportedBinding",
        }
    }

    pub fn uri(&self) -> String {
        format!("{PREFIX}{}", self.name())
    }

    pub fn is_success(&self) -> bool {
        *self == StatusCode::Success
    }

    /// Whether this code may appear as the outermost `<StatusCode>`.
    pub fn is_top_level(&self) -> bool {
        matches!(
            self,
            StatusCode::Success | StatusCode::Requester | StatusCode::Responder | StatusCode::VersionMismatch
        )
    }

    pub fn description(&self) -> &'static str {
        match self {
            StatusCode::Success => "the request succeeded",
            StatusCode::Requester => "the request could not be performed due to an error on the part of the requester",
            StatusCode::Responder => "the request could not be performed due to an error on the part of the responder",
            StatusCode::VersionMismatch => "the responder could not process the request because the version was incorrect",
            StatusCode::AuthnFailed => "the responding provider was unable to successfully authenticate the principal",
            StatusCode::InvalidAttrNameOrValue => "unexpected or invalid content was encountered within an attribute",
            StatusCode::InvalidNameIdPolicy => "the responding provider cannot support the requested name identifier policy",
            StatusCode::NoAuthnContext => "the specified authentication context requirements cannot be met",
            StatusCode::NoAvailableIdp => "none of the supported identity providers are available",
            StatusCode::NoPassive => "the responder cannot authenticate the principal passively",
            StatusCode::NoSupportedIdp => "none of the identity providers are supported by the intermediary",
            StatusCode::PartialLogout => "not all session participants could be logged out",
            StatusCode::ProxyCountExceeded => "the responder cannot authenticate the principal and is not permitted to proxy",
            StatusCode::RequestDenied => "the responder has decided not to respond to the request",
            StatusCode::RequestUnsupported => "the responder does not support the request",
            StatusCode::RequestVersionDeprecated => "the responder cannot process any requests with the protocol version specified",
            StatusCode::RequestVersionTooHigh => "the protocol version specified in the request is too high",
            StatusCode::RequestVersionTooLow => "the protocol version specified in the request is too low",
            StatusCode::ResourceNotRecognized => "the resource value provided in the request is not recognized",
            StatusCode::TooManyResponses => "the response message would contain more elements than the responder can return",
            StatusCode::UnknownAttrProfile => "an entity that has no knowledge of a particular attribute profile was presented with it",
            StatusCode::UnknownPrincipal => "the responding provider does not recognize the principal",
            StatusCode::UnsupportedBinding => "the provider cannot respond using the requested protocol binding",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_roundtrip() {
        for code in StatusCode::ALL {
            assert_eq!(StatusCode::from_uri(&code.uri()), Some(code));
        }
    }

    #[test]
    fn test_unknown_uri() {
        assert_eq!(StatusCode::from_uri("urn:oasis:names:tc:SAML:2.0:status:Nope"), None);
        assert_eq!(StatusCode::from_uri("Success"), None);
        assert_eq!(StatusCode::from_uri(""), None);
    }

    #[test]
    fn test_levels() {
        assert!(StatusCode::Success.is_success());
        assert!(StatusCode::Requester.is_top_level());
        assert!(!StatusCode::AuthnFailed.is_top_level());
        assert_eq!(StatusCode::InvalidNameIdPolicy.uri(), "urn:oasis:names:tc:SAML:2.0:status:InvalidNameIDPolicy");
    }
}
