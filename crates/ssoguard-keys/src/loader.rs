#![forbid(unsafe_code)]

//! Key loading from PEM and DER.

use crate::key::{Key, KeyData};
use ssoguard_core::Error;

/// Load an RSA private key from PEM data (PKCS#8 or PKCS#1).
pub fn load_rsa_private_pem(pem_data: &[u8]) -> Result<Key, Error> {
    use pkcs8::DecodePrivateKey;
    let pem_str = std::str::from_utf8(pem_data)
        .map_err(|e| Error::Key(format!("invalid PEM encoding: {e}")))?;

    // Try PKCS#8 first
    if let Ok(pk) = rsa::RsaPrivateKey::from_pkcs8_pem(pem_str) {
        let public = pk.to_public_key();
        return Ok(Key::new(KeyData::Rsa {
            private: Some(pk),
            public,
        }));
    }

    // Try PKCS#1
    use pkcs1::DecodeRsaPrivateKey;
    let pk = rsa::RsaPrivateKey::from_pkcs1_pem(pem_str)
        .map_err(|e| Error::Key(format!("failed to parse RSA private key PEM: {e}")))?;
    let public = pk.to_public_key();
    Ok(Key::new(KeyData::Rsa {
        private: Some(pk),
        public,
    }))
}

/// Load an EC P-256 private key from PKCS#8 PEM data.
pub fn load_ec_p256_private_pem(pem_data: &[u8]) -> Result<Key, Error> {
    use pkcs8::DecodePrivateKey;
    let pem_str = std::str::from_utf8(pem_data)
        .map_err(|e| Error::Key(format!("invalid PEM encoding: {e}")))?;

    let sk = p256::ecdsa::SigningKey::from_pkcs8_pem(pem_str)
        .map_err(|e| Error::Key(format!("failed to parse EC P-256 private key: {e}")))?;
    let vk = *sk.verifying_key();
    Ok(Key::new(KeyData::EcP256 {
        private: Some(sk),
        public: vk,
    }))
}

/// Load an EC P-384 private key from PKCS#8 PEM data.
pub fn load_ec_p384_private_pem(pem_data: &[u8]) -> Result<Key, Error> {
    use pkcs8::DecodePrivateKey;
    let pem_str = std::str::from_utf8(pem_data)
        .map_err(|e| Error::Key(format!("invalid PEM encoding: {e}")))?;

    let sk = p384::ecdsa::SigningKey::from_pkcs8_pem(pem_str)
        .map_err(|e| Error::Key(format!("failed to parse EC P-384 private key: {e}")))?;
    let vk = *sk.verifying_key();
    Ok(Key::new(KeyData::EcP384 {
        private: Some(sk),
        public: vk,
    }))
}

/// Load a private key of any supported type, auto-detecting the algorithm.
pub fn load_private_key_pem(pem_data: &[u8]) -> Result<Key, Error> {
    if let Ok(key) = load_rsa_private_pem(pem_data) {
        return Ok(key);
    }
    if let Ok(key) = load_ec_p256_private_pem(pem_data) {
        return Ok(key);
    }
    if let Ok(key) = load_ec_p384_private_pem(pem_data) {
        return Ok(key);
    }
    Err(Error::Key(
        "unsupported private key: expected RSA, EC P-256 or EC P-384 in PEM".into(),
    ))
}

/// Decode a PEM-encoded X.509 certificate to DER.
pub fn decode_cert_pem(pem_data: &[u8]) -> Result<Vec<u8>, Error> {
    let pem_str = std::str::from_utf8(pem_data)
        .map_err(|e| Error::Certificate(format!("invalid PEM encoding: {e}")))?;

    // Some PEM files carry trailing blank lines
    let trimmed = pem_str.trim();

    let (label, der_bytes) = pem_rfc7468::decode_vec(trimmed.as_bytes())
        .map_err(|e| Error::Certificate(format!("failed to decode certificate PEM: {e}")))?;

    if label != "CERTIFICATE" {
        return Err(Error::Certificate(format!(
            "expected CERTIFICATE PEM label, got: {label}"
        )));
    }
    Ok(der_bytes)
}

/// Extract the subject public key of an already parsed certificate.
pub(crate) fn key_from_certificate(cert: &x509_cert::Certificate) -> Result<Key, Error> {
    use der::Encode;
    use spki::DecodePublicKey;

    let spki_der = cert
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| Error::Key(format!("failed to encode SPKI: {e}")))?;

    if let Ok(pk) = rsa::RsaPublicKey::from_public_key_der(&spki_der) {
        return Ok(Key::new(KeyData::Rsa {
            private: None,
            public: pk,
        }));
    }

    if let Ok(vk) = p256::ecdsa::VerifyingKey::from_public_key_der(&spki_der) {
        return Ok(Key::new(KeyData::EcP256 {
            private: None,
            public: vk,
        }));
    }

    if let Ok(vk) = p384::ecdsa::VerifyingKey::from_public_key_der(&spki_der) {
        return Ok(Key::new(KeyData::EcP384 {
            private: None,
            public: vk,
        }));
    }

    Err(Error::Key(
        "unsupported public key algorithm in X.509 certificate".into(),
    ))
}
