// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::{fmt, str::FromStr};

/// The 32 byte key shared between the disclosure oracle and the proof verifier
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey([u8; 32]);

impl SigningKey {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Fixed key for local development and tests. Never use it for anything real.
    pub fn development() -> Self {
        Self(Sha256::digest(b"veil/development-oracle-key").into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for SigningKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim().strip_prefix("0x").unwrap_or(s.trim());
        let bytes = hex::decode(trimmed).context("oracle signing key is not valid hex")?;
        let Ok(bytes) = <[u8; 32]>::try_from(bytes.as_slice()) else {
            bail!("oracle signing key must be 32 bytes, got {}", bytes.len());
        };
        Ok(Self(bytes))
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_with_or_without_prefix() -> Result<()> {
        let raw = "11".repeat(32);
        let a: SigningKey = raw.parse()?;
        let b: SigningKey = format!("0x{raw}").parse()?;
        assert_eq!(a, b);
        assert_eq!(a.as_bytes(), &[0x11; 32]);
        Ok(())
    }

    #[test]
    fn rejects_wrong_length_and_bad_hex() {
        assert!("0x1234".parse::<SigningKey>().is_err());
        assert!("zz".repeat(32).parse::<SigningKey>().is_err());
    }

    #[test]
    fn debug_does_not_leak_key() {
        assert_eq!(format!("{:?}", SigningKey::development()), "SigningKey(<redacted>)");
    }
}
