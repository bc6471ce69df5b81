#![forbid(unsafe_code)]

use ssoguard_core::{Clock, SystemClock};
use std::sync::Arc;

/// Validator settings.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Source of the current time for certificate and condition checks.
    pub clock: Arc<dyn Clock>,
    /// Accept SHA-1 based digest and signature methods.
    pub allow_sha1: bool,
    /// Accepted `<saml:Audience>` values; empty disables the check.
    pub audiences: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            allow_sha1: false,
            audiences: Vec::new(),
        }
    }
}

impl ValidatorConfig {
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_allow_sha1(mut self, allow: bool) -> Self {
        self.allow_sha1 = allow;
        self
    }

    pub fn with_audiences<I, S>(mut self, audiences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audiences = audiences.into_iter().map(Into::into).collect();
        self
    }
}
