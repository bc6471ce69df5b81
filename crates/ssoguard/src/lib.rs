#![forbid(unsafe_code)]

pub use ssoguard_core as core;
pub use ssoguard_xml as xml;
pub use ssoguard_c14n as c14n;
pub use ssoguard_crypto as crypto;
pub use ssoguard_keys as keys;
pub use ssoguard_dsig as dsig;
pub use ssoguard_saml as saml;

pub use ssoguard_saml::{Auth, AuthResponse, ValidationError, Validator, ValidatorConfig};
