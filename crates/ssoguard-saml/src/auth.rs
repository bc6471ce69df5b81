#![forbid(unsafe_code)]

//! The authentication object a validator works on.

use base64::Engine;
use ssoguard_core::Error;

use crate::response::{self, Response, Status};
use crate::status::StatusCode;
use crate::verifier::SignatureScope;

/// A response whose content has passed signature verification.
///
/// Only a validator can construct one, so holding a `VerifiedResponse`
/// proves the signature step ran.  It also records which validator ran it:
/// trust established against one IdP's metadata does not carry over to
/// another validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedResponse {
    response: Response,
    scope: SignatureScope,
    signers: Vec<String>,
    validator: u64,
}

impl VerifiedResponse {
    pub(crate) fn new(response: Response, scope: SignatureScope, signers: Vec<String>, validator: u64) -> Self {
        Self {
            response,
            scope,
            signers,
            validator,
        }
    }

    pub(crate) fn verified_by(&self, validator: u64) -> bool {
        self.validator == validator
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Which part of the document the signature covered.
    pub fn scope(&self) -> SignatureScope {
        self.scope
    }

    /// Subjects of the certificates that signed the verified content.
    pub fn signers(&self) -> &[String] {
        &self.signers
    }

    pub fn into_response(self) -> Response {
        self.response
    }
}

/// Capabilities the validator needs from an authentication in progress.
pub trait Auth {
    /// The base64-encoded response as received from the IdP.
    fn raw_response(&self) -> &str;

    /// Status reported by the IdP, read before any signature check.
    fn status(&self) -> Result<StatusCode, Error>;

    fn status_description(&self) -> String;

    fn response(&self) -> Option<&VerifiedResponse>;

    fn set_response(&mut self, response: VerifiedResponse);

    /// Identifier of the authenticated user; empty when unknown.
    fn user_id(&self) -> &str {
        self.response().map(|r| r.response().name_id()).unwrap_or_default()
    }
}

/// A SAML response received by the service provider (HTTP-POST binding).
#[derive(Debug, Clone)]
pub struct AuthResponse {
    raw: String,
    response: Option<VerifiedResponse>,
}

impl AuthResponse {
    /// Wrap the `SAMLResponse` form value.
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            response: None,
        }
    }

    /// Encode a response document the way the POST binding carries it.
    pub fn from_xml(xml: &str) -> Self {
        Self::new(base64::engine::general_purpose::STANDARD.encode(xml))
    }

    /// Decode the payload and read its status without verifying anything.
    fn unverified_status(&self) -> Result<Status, Error> {
        let decoded = decode_payload(&self.raw).map_err(|e| Error::Base64(e.to_string()))?;
        let xml = String::from_utf8(decoded).map_err(|e| Error::XmlParse(format!("response is not UTF-8: {e}")))?;
        response::parse_status_only(&xml)
    }

    /// Attribute value by `Name` or `FriendlyName` from the verified response.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.response
            .as_ref()?
            .response()
            .attribute(name)?
            .values
            .first()
            .map(String::as_str)
    }
}

impl Auth for AuthResponse {
    fn raw_response(&self) -> &str {
        &self.raw
    }

    fn status(&self) -> Result<StatusCode, Error> {
        let status = self.unverified_status()?;
        status
            .status_code()
            .filter(StatusCode::is_top_level)
            .ok_or_else(|| Error::XmlStructure(format!("unrecognized status code {:?}", status.code)))
    }

    fn status_description(&self) -> String {
        match self.unverified_status() {
            Ok(status) => status.description(),
            Err(e) => e.to_string(),
        }
    }

    fn response(&self) -> Option<&VerifiedResponse> {
        self.response.as_ref()
    }

    fn set_response(&mut self, response: VerifiedResponse) {
        self.response = Some(response);
    }
}

/// Base64-decode a transport payload; line breaks are ignored.
pub(crate) fn decode_payload(raw: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = raw.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    base64::engine::general_purpose::STANDARD.decode(compact)
}
