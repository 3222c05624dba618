//! One-way anonymization of name fields.
//!
//! When requested, personally identifiable fields are digested before they
//! are written back, so the output can be shared without the clear-text
//! names. Country codes and phone numbers are not digested.

use clap::ValueEnum;
use md5::{Digest, Md5};
use sha2::Sha256;

/// Digest algorithm selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DigestAlgo {
    /// 128-bit MD5, the historical default.
    #[default]
    Md5,
    /// SHA-256.
    Sha256,
}

/// The transform applied to name fields before output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextDigest {
    /// No transform; fields pass through in the clear.
    #[default]
    Identity,
    Md5,
    Sha256,
}

impl TextDigest {
    pub fn from_algo(algo: DigestAlgo) -> Self {
        match algo {
            DigestAlgo::Md5 => TextDigest::Md5,
            DigestAlgo::Sha256 => TextDigest::Sha256,
        }
    }

    pub fn is_enabled(self) -> bool {
        self != TextDigest::Identity
    }

    /// Applies the transform, hex-encoding the digest. An empty input stays
    /// empty rather than becoming the hash of the empty string.
    pub fn apply(self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        match self {
            TextDigest::Identity => text.to_string(),
            TextDigest::Md5 => hex::encode(Md5::digest(text.as_bytes())),
            TextDigest::Sha256 => hex::encode(Sha256::digest(text.as_bytes())),
        }
    }
}
