// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use core::fmt;
use serde::{Deserialize, Serialize};
use veil_utils::short_hex;

/// The declared plaintext type behind an encrypted handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FheType {
    /// Encrypted boolean, produced by comparisons and consumed by `select`
    Bool,
    U8,
    U32,
    U64,
}

impl FheType {
    pub fn bits(&self) -> u32 {
        match self {
            FheType::Bool => 1,
            FheType::U8 => 8,
            FheType::U32 => 32,
            FheType::U64 => 64,
        }
    }

    pub fn is_integer(&self) -> bool {
        !matches!(self, FheType::Bool)
    }

    /// Largest plaintext value representable by this type
    pub fn max_value(&self) -> u64 {
        match self {
            FheType::Bool => 1,
            FheType::U8 => u8::MAX as u64,
            FheType::U32 => u32::MAX as u64,
            FheType::U64 => u64::MAX,
        }
    }

    /// Reduce a value into the range of this type the way fixed width unsigned arithmetic does
    pub fn truncate(&self, value: u64) -> u64 {
        match self {
            FheType::Bool => (value != 0) as u64,
            FheType::U64 => value,
            _ => value & self.max_value(),
        }
    }
}

impl fmt::Display for FheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FheType::Bool => write!(f, "ebool"),
            FheType::U8 => write!(f, "euint8"),
            FheType::U32 => write!(f, "euint32"),
            FheType::U64 => write!(f, "euint64"),
        }
    }
}

/// Opaque identifier of a ciphertext held by the crypto back end.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandleId(pub [u8; 32]);

impl HandleId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h:{}", short_hex(&self.0))
    }
}

impl fmt::Debug for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandleId({})", short_hex(&self.0))
    }
}

/// Reference to a ciphertext plus its declared type. Never contains plaintext.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncryptedHandle {
    id: HandleId,
    fhe_type: FheType,
}

impl EncryptedHandle {
    pub fn new(id: HandleId, fhe_type: FheType) -> Self {
        Self { id, fhe_type }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn fhe_type(&self) -> FheType {
        self.fhe_type
    }
}

impl fmt::Display for EncryptedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<{}>", self.fhe_type, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::FheType;

    #[test]
    fn truncation_wraps_to_declared_width() {
        assert_eq!(FheType::U8.truncate(256 + 7), 7);
        assert_eq!(FheType::U32.truncate(u32::MAX as u64 + 2), 1);
        assert_eq!(FheType::U64.truncate(u64::MAX), u64::MAX);
        assert_eq!(FheType::Bool.truncate(5), 1);
    }

    #[test]
    fn widths_are_ordered_by_bits() {
        assert!(FheType::U8.bits() < FheType::U32.bits());
        assert!(FheType::U32.bits() < FheType::U64.bits());
        assert!(!FheType::Bool.is_integer());
    }
}
