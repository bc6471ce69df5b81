#![forbid(unsafe_code)]

//! Key types and data structures.

use ssoguard_crypto::SigningKey;

/// The underlying key data.
pub enum KeyData {
    Rsa {
        private: Option<rsa::RsaPrivateKey>,
        public: rsa::RsaPublicKey,
    },
    EcP256 {
        private: Option<p256::ecdsa::SigningKey>,
        public: p256::ecdsa::VerifyingKey,
    },
    EcP384 {
        private: Option<p384::ecdsa::SigningKey>,
        public: p384::ecdsa::VerifyingKey,
    },
}

impl std::fmt::Debug for KeyData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rsa { private, .. } => {
                if private.is_some() {
                    write!(f, "RSA private+public key")
                } else {
                    write!(f, "RSA public key")
                }
            }
            Self::EcP256 { private, .. } => {
                if private.is_some() {
                    write!(f, "EC P-256 private+public key")
                } else {
                    write!(f, "EC P-256 public key")
                }
            }
            Self::EcP384 { private, .. } => {
                if private.is_some() {
                    write!(f, "EC P-384 private+public key")
                } else {
                    write!(f, "EC P-384 public key")
                }
            }
        }
    }
}

/// A signing or verification key.
#[derive(Debug)]
pub struct Key {
    pub data: KeyData,
}

impl Key {
    pub fn new(data: KeyData) -> Self {
        Self { data }
    }

    /// Whether the private half is available.
    pub fn has_private(&self) -> bool {
        match &self.data {
            KeyData::Rsa { private, .. } => private.is_some(),
            KeyData::EcP256 { private, .. } => private.is_some(),
            KeyData::EcP384 { private, .. } => private.is_some(),
        }
    }

    /// Short algorithm name for display.
    pub fn algorithm_name(&self) -> &'static str {
        match &self.data {
            KeyData::Rsa { .. } => "RSA",
            KeyData::EcP256 { .. } => "EC P-256",
            KeyData::EcP384 { .. } => "EC P-384",
        }
    }

    /// Convert to a `SigningKey` for use with crypto algorithms.
    ///
    /// The private half is used when present, so the same key can sign
    /// and verify.
    pub fn to_signing_key(&self) -> SigningKey {
        match &self.data {
            KeyData::Rsa { private: Some(pk), .. } => SigningKey::Rsa(pk.clone()),
            KeyData::Rsa { public, .. } => SigningKey::RsaPublic(public.clone()),
            KeyData::EcP256 { private: Some(sk), .. } => SigningKey::EcP256(sk.clone()),
            KeyData::EcP256 { public, .. } => SigningKey::EcP256Public(*public),
            KeyData::EcP384 { private: Some(sk), .. } => SigningKey::EcP384(sk.clone()),
            KeyData::EcP384 { public, .. } => SigningKey::EcP384Public(*public),
        }
    }

    /// Whether both keys share the same public half.
    pub fn public_matches(&self, other: &Key) -> bool {
        match (&self.data, &other.data) {
            (KeyData::Rsa { public: a, .. }, KeyData::Rsa { public: b, .. }) => a == b,
            (KeyData::EcP256 { public: a, .. }, KeyData::EcP256 { public: b, .. }) => a == b,
            (KeyData::EcP384 { public: a, .. }, KeyData::EcP384 { public: b, .. }) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_certificate_key_is_public_half() {
        let private = crate::loader::load_private_key_pem(include_bytes!("../../../testdata/idp-ec-key.pem")).unwrap();
        let cert = crate::TrustedCertificate::from_pem(include_bytes!("../../../testdata/idp-ec-cert.pem")).unwrap();
        assert!(private.has_private());
        assert!(!cert.key().has_private());
        assert!(private.public_matches(cert.key()));
        assert_eq!(cert.key().algorithm_name(), "EC P-256");
        assert!(matches!(cert.key().to_signing_key(), SigningKey::EcP256Public(_)));
        assert_eq!(format!("{:?}", cert.key().data), "EC P-256 public key");
    }

    #[test]
    fn test_foreign_key_does_not_match() {
        let idp = crate::loader::load_private_key_pem(include_bytes!("../../../testdata/idp-key.pem")).unwrap();
        let attacker = crate::TrustedCertificate::from_pem(include_bytes!("../../../testdata/attacker-cert.pem")).unwrap();
        let ec = crate::TrustedCertificate::from_pem(include_bytes!("../../../testdata/idp-ec-cert.pem")).unwrap();
        assert!(!idp.public_matches(attacker.key()));
        assert!(!idp.public_matches(ec.key()));
    }
}
