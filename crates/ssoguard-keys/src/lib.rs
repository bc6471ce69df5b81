#![forbid(unsafe_code)]

//! Key management for ssoguard.
//!
//! Loads private keys and X.509 certificates, holds the set of trusted
//! signing certificates, and reads certificates out of `<ds:KeyInfo>`.

pub mod key;
pub mod keyinfo;
pub mod loader;
pub mod store;
pub mod x509;

pub use key::{Key, KeyData};
pub use store::CertificateStore;
pub use x509::TrustedCertificate;
