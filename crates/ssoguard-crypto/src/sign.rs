#![forbid(unsafe_code)]

//! Signature algorithm implementations (RSA PKCS#1 v1.5, ECDSA).

use crate::digest::HashAlgorithm;
use signature::SignatureEncoding;
use ssoguard_core::{algorithm, Error};

/// Key material for signature operations.
pub enum SigningKey {
    Rsa(rsa::RsaPrivateKey),
    RsaPublic(rsa::RsaPublicKey),
    EcP256(p256::ecdsa::SigningKey),
    EcP256Public(p256::ecdsa::VerifyingKey),
    EcP384(p384::ecdsa::SigningKey),
    EcP384Public(p384::ecdsa::VerifyingKey),
}

/// Trait for signature algorithms.
pub trait SignatureAlgorithm: Send {
    fn uri(&self) -> &'static str;
    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error>;
    fn verify(&self, key: &SigningKey, data: &[u8], signature: &[u8]) -> Result<bool, Error>;
}

/// Create a signature algorithm from its URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn SignatureAlgorithm>, Error> {
    match uri {
        algorithm::RSA_SHA1 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA1, hash: HashAlgorithm::Sha1 })),
        algorithm::RSA_SHA224 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA224, hash: HashAlgorithm::Sha224 })),
        algorithm::RSA_SHA256 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA256, hash: HashAlgorithm::Sha256 })),
        algorithm::RSA_SHA384 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA384, hash: HashAlgorithm::Sha384 })),
        algorithm::RSA_SHA512 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA512, hash: HashAlgorithm::Sha512 })),

        algorithm::ECDSA_SHA1 => Ok(Box::new(Ecdsa { uri: algorithm::ECDSA_SHA1, hash: HashAlgorithm::Sha1 })),
        algorithm::ECDSA_SHA256 => Ok(Box::new(Ecdsa { uri: algorithm::ECDSA_SHA256, hash: HashAlgorithm::Sha256 })),
        algorithm::ECDSA_SHA384 => Ok(Box::new(Ecdsa { uri: algorithm::ECDSA_SHA384, hash: HashAlgorithm::Sha384 })),
        algorithm::ECDSA_SHA512 => Ok(Box::new(Ecdsa { uri: algorithm::ECDSA_SHA512, hash: HashAlgorithm::Sha512 })),

        _ => Err(Error::UnsupportedAlgorithm(format!("signature algorithm: {uri}"))),
    }
}

// ── RSA PKCS#1 v1.5 ─────────────────────────────────────────────────

struct RsaPkcs1v15 { uri: &'static str, hash: HashAlgorithm }

impl RsaPkcs1v15 {
    fn sign_with_key(&self, private_key: &rsa::RsaPrivateKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        use signature::Signer;
        macro_rules! do_sign {
            ($hasher:ty) => {{
                let sk = rsa::pkcs1v15::SigningKey::<$hasher>::new(private_key.clone());
                let sig = sk
                    .try_sign(data)
                    .map_err(|e| Error::Crypto(format!("RSA signing failed: {e}")))?;
                Ok(sig.to_vec())
            }};
        }
        match self.hash {
            HashAlgorithm::Sha1 => do_sign!(sha1::Sha1),
            HashAlgorithm::Sha224 => do_sign!(sha2::Sha224),
            HashAlgorithm::Sha256 => do_sign!(sha2::Sha256),
            HashAlgorithm::Sha384 => do_sign!(sha2::Sha384),
            HashAlgorithm::Sha512 => do_sign!(sha2::Sha512),
        }
    }

    fn verify_with_key(&self, public_key: &rsa::RsaPublicKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        use signature::Verifier;
        let sig = rsa::pkcs1v15::Signature::try_from(sig_bytes)
            .map_err(|e| Error::Crypto(format!("invalid RSA signature: {e}")))?;
        macro_rules! do_verify {
            ($hasher:ty) => {{
                let vk = rsa::pkcs1v15::VerifyingKey::<$hasher>::new(public_key.clone());
                Ok(vk.verify(data, &sig).is_ok())
            }};
        }
        match self.hash {
            HashAlgorithm::Sha1 => do_verify!(sha1::Sha1),
            HashAlgorithm::Sha224 => do_verify!(sha2::Sha224),
            HashAlgorithm::Sha256 => do_verify!(sha2::Sha256),
            HashAlgorithm::Sha384 => do_verify!(sha2::Sha384),
            HashAlgorithm::Sha512 => do_verify!(sha2::Sha512),
        }
    }
}

impl SignatureAlgorithm for RsaPkcs1v15 {
    fn uri(&self) -> &'static str { self.uri }

    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        match key {
            SigningKey::Rsa(pk) => self.sign_with_key(pk, data),
            _ => Err(Error::Key("RSA private key required".into())),
        }
    }

    fn verify(&self, key: &SigningKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        let pubk = match key {
            SigningKey::Rsa(pk) => pk.to_public_key(),
            SigningKey::RsaPublic(pk) => pk.clone(),
            _ => return Err(Error::Key("RSA key required".into())),
        };
        self.verify_with_key(&pubk, data, sig_bytes)
    }
}

// ── ECDSA ────────────────────────────────────────────────────────────
//
// XML-DSig carries ECDSA signatures as the raw concatenation r||s.  The
// curve follows the key; the hash follows the algorithm URI.

struct Ecdsa { uri: &'static str, hash: HashAlgorithm }

impl SignatureAlgorithm for Ecdsa {
    fn uri(&self) -> &'static str { self.uri }

    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        use signature::hazmat::PrehashSigner;
        let prehash = self.hash.hash(data);
        match key {
            SigningKey::EcP256(sk) => {
                let sig: p256::ecdsa::Signature = sk
                    .sign_prehash(&prehash)
                    .map_err(|e| Error::Crypto(format!("P-256 signing failed: {e}")))?;
                Ok(sig.to_bytes().to_vec())
            }
            SigningKey::EcP384(sk) => {
                let sig: p384::ecdsa::Signature = sk
                    .sign_prehash(&prehash)
                    .map_err(|e| Error::Crypto(format!("P-384 signing failed: {e}")))?;
                Ok(sig.to_bytes().to_vec())
            }
            _ => Err(Error::Key("EC private key required".into())),
        }
    }

    fn verify(&self, key: &SigningKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        use signature::hazmat::PrehashVerifier;
        let prehash = self.hash.hash(data);
        match key {
            SigningKey::EcP256(_) | SigningKey::EcP256Public(_) => {
                let vk = match key {
                    SigningKey::EcP256(sk) => *sk.verifying_key(),
                    SigningKey::EcP256Public(vk) => *vk,
                    _ => return Err(Error::Key("P-256 key required".into())),
                };
                let sig = p256::ecdsa::Signature::from_slice(sig_bytes)
                    .map_err(|e| Error::Crypto(format!("invalid P-256 signature ({} bytes): {e}", sig_bytes.len())))?;
                Ok(vk.verify_prehash(&prehash, &sig).is_ok())
            }
            SigningKey::EcP384(_) | SigningKey::EcP384Public(_) => {
                let vk = match key {
                    SigningKey::EcP384(sk) => *sk.verifying_key(),
                    SigningKey::EcP384Public(vk) => *vk,
                    _ => return Err(Error::Key("P-384 key required".into())),
                };
                let sig = p384::ecdsa::Signature::from_slice(sig_bytes)
                    .map_err(|e| Error::Crypto(format!("invalid P-384 signature ({} bytes): {e}", sig_bytes.len())))?;
                Ok(vk.verify_prehash(&prehash, &sig).is_ok())
            }
            _ => Err(Error::Key("EC key required".into())),
        }
    }
}
