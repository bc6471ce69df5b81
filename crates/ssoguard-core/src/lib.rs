#![forbid(unsafe_code)]

//! Shared foundations for the ssoguard SAML validation stack.
//!
//! Every other crate in the workspace depends on this one for the common
//! [`Error`] type, the XML-DSig and SAML namespace/algorithm constants, and
//! the [`Clock`] abstraction used for all time-dependent checks.

pub mod algorithm;
pub mod clock;
pub mod error;
pub mod ns;

pub use clock::{parse_timestamp, Clock, FixedClock, SystemClock};
pub use error::{Error, Result};
