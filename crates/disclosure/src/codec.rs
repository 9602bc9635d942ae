// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Oracle cleartexts carry one 32 byte big-endian word per requested handle.

use crate::DisclosureError;
use veil_events::FheType;

pub const WORD_SIZE: usize = 32;

pub fn encode(values: &[u64]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * WORD_SIZE);
    for value in values {
        bytes.extend_from_slice(&[0u8; WORD_SIZE - 8]);
        bytes.extend_from_slice(&value.to_be_bytes());
    }
    bytes
}

/// Decode one word per declared type, rejecting values the type cannot hold
pub fn decode(bytes: &[u8], types: &[FheType]) -> Result<Vec<u64>, DisclosureError> {
    let expected = types.len() * WORD_SIZE;
    if bytes.len() != expected {
        return Err(DisclosureError::CleartextLength {
            expected,
            actual: bytes.len(),
        });
    }

    bytes
        .chunks_exact(WORD_SIZE)
        .zip(types)
        .enumerate()
        .map(|(index, (word, fhe_type))| {
            let (high, low) = word.split_at(WORD_SIZE - 8);
            let overflow = DisclosureError::WordOverflow {
                index,
                fhe_type: *fhe_type,
            };
            if high.iter().any(|b| *b != 0) {
                return Err(overflow);
            }
            let mut buf = [0u8; 8];
            buf.copy_from_slice(low);
            let value = u64::from_be_bytes(buf);
            if value > fhe_type.max_value() {
                return Err(overflow);
            }
            Ok(value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_are_big_endian_and_padded() {
        let bytes = encode(&[64]);
        assert_eq!(bytes.len(), 32);
        assert!(bytes[..31].iter().all(|b| *b == 0));
        assert_eq!(bytes[31], 64);
        assert_eq!(decode(&bytes, &[FheType::U32]), Ok(vec![64]));
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert_eq!(
            decode(&[0u8; 31], &[FheType::U32]),
            Err(DisclosureError::CleartextLength {
                expected: 32,
                actual: 31
            })
        );
        assert!(decode(&encode(&[1, 2]), &[FheType::U32]).is_err());
    }

    #[test]
    fn values_must_fit_the_declared_width() {
        let bytes = encode(&[u32::MAX as u64 + 1]);
        assert_eq!(
            decode(&bytes, &[FheType::U32]),
            Err(DisclosureError::WordOverflow {
                index: 0,
                fhe_type: FheType::U32
            })
        );

        let mut high = encode(&[1]);
        high[0] = 1;
        assert!(decode(&high, &[FheType::U64]).is_err());
    }
}
