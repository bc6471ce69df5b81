#![forbid(unsafe_code)]

//! Message digests named by their XML-DSig algorithm URIs.

use digest::Digest;
use ssoguard_core::{algorithm, Error};

/// The hash functions a SAML signature may be made with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub fn from_uri(uri: &str) -> Result<Self, Error> {
        match uri {
            algorithm::SHA1 => Ok(Self::Sha1),
            algorithm::SHA224 => Ok(Self::Sha224),
            algorithm::SHA256 => Ok(Self::Sha256),
            algorithm::SHA384 => Ok(Self::Sha384),
            algorithm::SHA512 => Ok(Self::Sha512),
            _ => Err(Error::UnsupportedAlgorithm(format!("digest algorithm: {uri}"))),
        }
    }

    pub fn uri(self) -> &'static str {
        match self {
            Self::Sha1 => algorithm::SHA1,
            Self::Sha224 => algorithm::SHA224,
            Self::Sha256 => algorithm::SHA256,
            Self::Sha384 => algorithm::SHA384,
            Self::Sha512 => algorithm::SHA512,
        }
    }

    pub fn hash(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => sha1::Sha1::digest(data).to_vec(),
            Self::Sha224 => sha2::Sha224::digest(data).to_vec(),
            Self::Sha256 => sha2::Sha256::digest(data).to_vec(),
            Self::Sha384 => sha2::Sha384::digest(data).to_vec(),
            Self::Sha512 => sha2::Sha512::digest(data).to_vec(),
        }
    }
}

/// Hash `data` with the algorithm named by a `DigestMethod` URI.
pub fn digest(uri: &str, data: &[u8]) -> Result<Vec<u8>, Error> {
    Ok(HashAlgorithm::from_uri(uri)?.hash(data))
}
