//! MD5 and SHA-1 computation and comparison, and the newtypes used to pass
//! digests around the rest of the crate.

use std::fmt;
use std::str::FromStr;

use sha1::{Digest, Sha1 as Sha1Hasher};

/// A SHA-1 digest, displayed as lowercase hex. SHA-1 is always the
/// authoritative content identifier for a pristine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sha1([u8; 20]);

impl Sha1 {
    pub fn of(data: &[u8]) -> Self {
        let mut hasher = Sha1Hasher::new();
        hasher.update(data);
        let digest = hasher.finalize();
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest);
        Sha1(bytes)
    }

    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// The first two hex characters, used as the pristine store's shard
    /// directory name.
    pub fn shard(self) -> String {
        hex::encode(&self.0[..1])
    }
}

impl fmt::Display for Sha1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Sha1 {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let mut arr = [0u8; 20];
        if bytes.len() != 20 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        arr.copy_from_slice(&bytes);
        Ok(Sha1(arr))
    }
}

/// Retained only to support lookups from historical callers that hashed
/// with MD5; never computed by fresh code paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Md5([u8; 16]);

impl Md5 {
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Md5 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Md5 {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let mut arr = [0u8; 16];
        if bytes.len() != 16 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        arr.copy_from_slice(&bytes);
        Ok(Md5(arr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_of_known_input() {
        let digest = Sha1::of(b"hello world");
        assert_eq!(digest.to_hex(), "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed");
    }

    #[test]
    fn sha1_round_trips_through_hex() {
        let digest = Sha1::of(b"round trip me");
        let parsed: Sha1 = digest.to_hex().parse().unwrap();
        assert_eq!(digest, parsed);
    }
}
