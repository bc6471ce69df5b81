#![forbid(unsafe_code)]

//! X.509 certificates accepted as signature roots.

use chrono::{DateTime, Utc};
use der::Decode;
use ssoguard_core::Error;
use x509_cert::Certificate;

use crate::key::Key;

/// A parsed certificate together with its exact DER encoding and public key.
///
/// Trust decisions compare `der()` byte for byte; the parsed form is only
/// used for the validity window and display.
#[derive(Debug)]
pub struct TrustedCertificate {
    der: Vec<u8>,
    cert: Certificate,
    key: Key,
}

impl TrustedCertificate {
    /// Parse a DER-encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        let cert = Certificate::from_der(der)
            .map_err(|e| Error::Certificate(format!("failed to parse X.509 certificate: {e}")))?;
        let key = crate::loader::key_from_certificate(&cert)?;
        Ok(Self {
            der: der.to_vec(),
            cert,
            key,
        })
    }

    /// Parse a PEM-encoded certificate.
    pub fn from_pem(pem_data: &[u8]) -> Result<Self, Error> {
        let der = crate::loader::decode_cert_pem(pem_data)?;
        Self::from_der(&der)
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// The certificate's subject public key.
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Subject distinguished name in RFC 4514 form.
    pub fn subject(&self) -> String {
        self.cert.tbs_certificate.subject.to_string()
    }

    pub fn issuer(&self) -> String {
        self.cert.tbs_certificate.issuer.to_string()
    }

    /// Hex-encoded serial number.
    pub fn serial(&self) -> String {
        self.cert
            .tbs_certificate
            .serial_number
            .as_bytes()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    pub fn not_before(&self) -> Result<DateTime<Utc>, Error> {
        x509_time_to_chrono(&self.cert.tbs_certificate.validity.not_before)
    }

    pub fn not_after(&self) -> Result<DateTime<Utc>, Error> {
        x509_time_to_chrono(&self.cert.tbs_certificate.validity.not_after)
    }

    /// Check that `at` falls inside the certificate's validity period.
    ///
    /// Both bounds are inclusive, as in RFC 5280.
    pub fn check_validity(&self, at: DateTime<Utc>) -> Result<(), Error> {
        let not_before = self.not_before()?;
        let not_after = self.not_after()?;

        if at < not_before {
            return Err(Error::Certificate(format!(
                "certificate {} is not yet valid (notBefore: {})",
                self.subject(),
                not_before.to_rfc3339()
            )));
        }
        if at > not_after {
            return Err(Error::Certificate(format!(
                "certificate {} has expired (notAfter: {})",
                self.subject(),
                not_after.to_rfc3339()
            )));
        }
        Ok(())
    }
}

fn x509_time_to_chrono(t: &x509_cert::time::Time) -> Result<DateTime<Utc>, Error> {
    let since_epoch = t.to_unix_duration();
    let secs = i64::try_from(since_epoch.as_secs())
        .map_err(|_| Error::Certificate("certificate time out of range".into()))?;
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| Error::Certificate("certificate time out of range".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDP_CERT: &[u8] = include_bytes!("../../../testdata/idp-cert.pem");

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_subject_and_window() {
        let cert = TrustedCertificate::from_pem(IDP_CERT).unwrap();
        assert!(cert.subject().contains("CN=idp.example.com"));
        assert_eq!(cert.not_before().unwrap(), at("2020-01-01T00:00:00Z"));
        assert_eq!(cert.not_after().unwrap(), at("2120-01-01T00:00:00Z"));
        assert!(!cert.serial().is_empty());
    }

    #[test]
    fn test_check_validity() {
        let cert = TrustedCertificate::from_pem(IDP_CERT).unwrap();
        assert!(cert.check_validity(at("2024-06-01T12:00:00Z")).is_ok());
        assert!(cert.check_validity(at("2020-01-01T00:00:00Z")).is_ok());

        let err = cert.check_validity(at("2019-12-31T23:59:59Z")).unwrap_err();
        assert!(err.to_string().contains("not yet valid"));

        let err = cert.check_validity(at("2120-01-01T00:00:01Z")).unwrap_err();
        assert!(err.to_string().contains("expired"));
    }
}
