#![forbid(unsafe_code)]

//! The set of certificates accepted as signature roots.

use crate::x509::TrustedCertificate;
use ssoguard_core::Error;

/// Immutable collection of trusted signing certificates.
///
/// Built once from IdP metadata and shared read-only between validations.
#[derive(Debug, Default)]
pub struct CertificateStore {
    roots: Vec<TrustedCertificate>,
}

impl CertificateStore {
    pub fn new(roots: Vec<TrustedCertificate>) -> Self {
        Self { roots }
    }

    /// Build a store from DER-encoded certificates.
    ///
    /// Any certificate that fails to parse aborts construction.
    pub fn from_der_certs<I, B>(certs: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let roots = certs
            .into_iter()
            .map(|der| TrustedCertificate::from_der(der.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { roots })
    }

    pub fn roots(&self) -> &[TrustedCertificate] {
        &self.roots
    }

    /// Find a root whose DER encoding is identical to `der`.
    pub fn find_exact(&self, der: &[u8]) -> Option<&TrustedCertificate> {
        self.roots.iter().find(|c| c.der() == der)
    }

    /// The only root, if the store holds exactly one.
    pub fn sole_root(&self) -> Option<&TrustedCertificate> {
        match self.roots.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}
