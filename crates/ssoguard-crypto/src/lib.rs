#![forbid(unsafe_code)]

//! Cryptographic algorithm implementations for ssoguard.
//!
//! Provides the digest and signature algorithms that appear in SAML
//! signatures, looked up by their XML-DSig algorithm URIs.

pub mod digest;
pub mod sign;

pub use digest::HashAlgorithm;
pub use sign::{SignatureAlgorithm, SigningKey};
