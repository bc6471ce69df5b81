#![forbid(unsafe_code)]

//! SAML 2.0 response validation for service providers.
//!
//! A [`Validator`] is built once from the identity provider's metadata.  Its
//! certificates become the only trusted signers.  Each incoming response then
//! goes through two steps:
//!
//! 1. [`Validator::validate_signature`] checks the IdP status, verifies the
//!    signature over the whole response (or, when the response itself is not
//!    signed, over each assertion) and attaches the verified content to the
//!    [`Auth`] object.
//! 2. [`Validator::validate_response`] checks the assertion's validity window
//!    and that a user identity is present.
//!
//! Everything read in step 2 comes from signature-verified bytes.

pub mod auth;
pub mod config;
pub mod error;
pub mod metadata;
pub mod response;
pub mod status;
pub mod validator;
pub mod verifier;

pub use auth::{Auth, AuthResponse, VerifiedResponse};
pub use config::ValidatorConfig;
pub use error::ValidationError;
pub use metadata::EntityDescriptor;
pub use response::{Assertion, Response};
pub use status::StatusCode;
pub use validator::Validator;
pub use verifier::{verify_document, SignatureScope, VerifiedDocument};
