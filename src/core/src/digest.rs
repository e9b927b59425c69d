//! Content addressing.
//!
//! Every stored object is identified by the SHA-256 of its bytes, written
//! in the OCI form `sha256:<lowercase hex>`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};

use crate::error::{DeckError, Result};

/// The only digest algorithm deckpack produces.
pub const SHA256: &str = "sha256";

/// A content digest (`algorithm:hex`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest {
    algorithm: String,
    hex: String,
}

impl Digest {
    /// Compute the SHA-256 digest of a payload.
    pub fn of(data: &[u8]) -> Self {
        Self {
            algorithm: SHA256.to_string(),
            hex: hex::encode(Sha256::digest(data)),
        }
    }

    /// Digest algorithm, e.g. `sha256`.
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Hex-encoded hash value without the algorithm prefix.
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Check that `data` hashes to this digest.
    ///
    /// Fails with [`DeckError::BlobCorrupted`] naming both digests when it
    /// does not.
    pub fn verify(&self, data: &[u8]) -> Result<()> {
        let actual = Digest::of(data);
        if &actual != self {
            return Err(DeckError::BlobCorrupted {
                expected: self.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

impl FromStr for Digest {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self> {
        let (algorithm, hex) = s.split_once(':').ok_or_else(|| {
            DeckError::InvalidReference(format!(
                "Invalid digest '{}': expected algorithm:hex",
                s
            ))
        })?;

        if algorithm != SHA256 {
            return Err(DeckError::InvalidReference(format!(
                "Unsupported digest algorithm '{}' in '{}'",
                algorithm, s
            )));
        }
        if hex.len() != 64 || !hex.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')) {
            return Err(DeckError::InvalidReference(format!(
                "Invalid sha256 value in digest '{}'",
                s
            )));
        }

        Ok(Self {
            algorithm: algorithm.to_string(),
            hex: hex.to_string(),
        })
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        // sha256 of the empty string
        let d = Digest::of(b"");
        assert_eq!(
            d.to_string(),
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(d.algorithm(), "sha256");
    }

    #[test]
    fn test_equal_bytes_equal_digests() {
        assert_eq!(Digest::of(b"ace of spades"), Digest::of(b"ace of spades"));
        assert_ne!(Digest::of(b"ace of spades"), Digest::of(b"ace of hearts"));
    }

    #[test]
    fn test_verify() {
        let d = Digest::of(b"payload");
        assert!(d.verify(b"payload").is_ok());

        let err = d.verify(b"tampered").unwrap_err();
        assert!(err.is_integrity_violation());
    }

    #[test]
    fn test_parse() {
        let d = Digest::of(b"x");
        let parsed: Digest = d.to_string().parse().unwrap();
        assert_eq!(parsed, d);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("nocolon".parse::<Digest>().is_err());
        assert!("md5:abcd".parse::<Digest>().is_err());
        assert!("sha256:abcd".parse::<Digest>().is_err());
        assert!(format!("sha256:{}", "G".repeat(64)).parse::<Digest>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let d = Digest::of(b"x");
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, format!("\"{}\"", d));
        let back: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
