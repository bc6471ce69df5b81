#![forbid(unsafe_code)]

//! Validation context: trust store, clock and algorithm policy.

use ssoguard_core::{Clock, SystemClock};
use ssoguard_keys::CertificateStore;
use std::sync::Arc;

/// Everything a signature validation needs besides the document.
///
/// Built once and shared between threads; validation never mutates it.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    store: Arc<CertificateStore>,
    clock: Arc<dyn Clock>,
    allow_sha1: bool,
}

impl ValidationContext {
    /// A context over `store` using the system clock and rejecting SHA-1.
    pub fn new(store: Arc<CertificateStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            allow_sha1: false,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Accept SHA-1 based digest and signature methods.
    pub fn with_allow_sha1(mut self, allow: bool) -> Self {
        self.allow_sha1 = allow;
        self
    }

    pub fn store(&self) -> &CertificateStore {
        &self.store
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn allow_sha1(&self) -> bool {
        self.allow_sha1
    }
}
