//! Content addresses.
//!
//! A GUID is rendered as `<ALGORITHM>_16_<hex digest>`, for example
//! `SHA256_16_0000a025d7d3b2cf782da0ef24423181fdd4096091bd8cc18b18c3aab9cb00a4`.
//! The same type names stored blobs and the root exposed by the filesystem bridge.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Radix of the digest encoding. Only hex is produced or accepted.
const HEX_BASE: &str = "16";

/// Bytes of entropy hashed when generating a random GUID.
const RANDOM_SEED_LEN: usize = 64;

/// Hash algorithm used to derive content addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum HashAlgorithm {
    #[default]
    #[serde(rename = "SHA256")]
    Sha256,
    #[serde(rename = "SHA512")]
    Sha512,
}

impl HashAlgorithm {
    /// Canonical name used as the GUID prefix.
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "SHA256",
            HashAlgorithm::Sha512 => "SHA512",
        }
    }

    /// Number of hex digits in a digest produced by this algorithm.
    pub fn hex_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 64,
            HashAlgorithm::Sha512 => 128,
        }
    }

    fn digest_hex(&self, data: &[u8]) -> String {
        match self {
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
            HashAlgorithm::Sha512 => hex::encode(Sha512::digest(data)),
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "SHA256" => Some(HashAlgorithm::Sha256),
            "SHA512" => Some(HashAlgorithm::Sha512),
            _ => None,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised when a GUID string cannot be recreated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuidError {
    #[error("malformed GUID '{0}': expected <ALGORITHM>_16_<hex digest>")]
    Malformed(String),

    #[error("unknown hash algorithm '{0}'")]
    UnknownAlgorithm(String),

    #[error("GUID digest for {algorithm} must be {expected} hex digits, got {actual}")]
    DigestLength {
        algorithm: HashAlgorithm,
        expected: usize,
        actual: usize,
    },
}

/// A content address.
///
/// Parsed GUIDs keep the caller's exact text; they are never re-derived.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Guid {
    algorithm: HashAlgorithm,
    text: String,
}

impl Guid {
    /// Address of `data` under `algorithm`.
    pub fn of(algorithm: HashAlgorithm, data: &[u8]) -> Self {
        let text = format!("{}_{}_{}", algorithm.name(), HEX_BASE, algorithm.digest_hex(data));
        Self { algorithm, text }
    }

    /// A fresh GUID derived from random bytes.
    pub fn random(algorithm: HashAlgorithm) -> Self {
        let mut seed = [0u8; RANDOM_SEED_LEN];
        rand::thread_rng().fill_bytes(&mut seed);
        Self::of(algorithm, &seed)
    }

    /// Recreate a GUID from its textual form.
    pub fn parse(text: &str) -> Result<Self, GuidError> {
        let mut parts = text.splitn(3, '_');
        let (Some(name), Some(base), Some(digest)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(GuidError::Malformed(text.to_string()));
        };

        if base != HEX_BASE {
            return Err(GuidError::Malformed(text.to_string()));
        }

        let algorithm = HashAlgorithm::from_name(name)
            .ok_or_else(|| GuidError::UnknownAlgorithm(name.to_string()))?;

        if digest.len() != algorithm.hex_len() {
            return Err(GuidError::DigestLength {
                algorithm,
                expected: algorithm.hex_len(),
                actual: digest.len(),
            });
        }

        if !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(GuidError::Malformed(text.to_string()));
        }

        Ok(Self {
            algorithm,
            text: text.to_string(),
        })
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The hex digest without the algorithm prefix.
    pub fn digest(&self) -> &str {
        let prefix = self.algorithm.name().len() + HEX_BASE.len() + 2;
        &self.text[prefix..]
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Guid {
    type Err = GuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Guid::parse(s)
    }
}

impl TryFrom<String> for Guid {
    type Error = GuidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Guid::parse(&value)
    }
}

impl From<Guid> for String {
    fn from(guid: Guid) -> Self {
        guid.text
    }
}
