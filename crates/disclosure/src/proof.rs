// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use sha2::{Digest, Sha256};
use veil_events::{EncryptedHandle, RequestId};

/// Checks that an oracle response really answers a given request
pub trait ProofVerifier: Send + Sync + 'static {
    fn verify(
        &self,
        request_id: RequestId,
        handles: &[EncryptedHandle],
        cleartext: &[u8],
        proof: &[u8],
    ) -> bool;
}

/// SHA-256 over the oracle key, the request id, the handle ids and the cleartext
#[derive(Clone)]
pub struct KeyedDigestVerifier {
    key: [u8; 32],
}

impl KeyedDigestVerifier {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    pub fn sign(
        &self,
        request_id: RequestId,
        handles: &[EncryptedHandle],
        cleartext: &[u8],
    ) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(self.key);
        hasher.update(b"veil/disclosure");
        hasher.update(request_id.value().to_be_bytes());
        for handle in handles {
            hasher.update(handle.id().as_bytes());
        }
        hasher.update((cleartext.len() as u64).to_be_bytes());
        hasher.update(cleartext);
        hasher.finalize().to_vec()
    }
}

impl ProofVerifier for KeyedDigestVerifier {
    fn verify(
        &self,
        request_id: RequestId,
        handles: &[EncryptedHandle],
        cleartext: &[u8],
        proof: &[u8],
    ) -> bool {
        let expected = self.sign(request_id, handles, cleartext);
        if expected.len() != proof.len() {
            return false;
        }
        expected
            .iter()
            .zip(proof)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_events::{FheType, HandleId};

    #[test]
    fn proof_binds_request_handles_and_cleartext() {
        let verifier = KeyedDigestVerifier::new([7; 32]);
        let handles = [EncryptedHandle::new(HandleId([1; 32]), FheType::U32)];
        let id = RequestId::new(1);
        let proof = verifier.sign(id, &handles, b"abc");

        assert!(verifier.verify(id, &handles, b"abc", &proof));
        assert!(!verifier.verify(RequestId::new(2), &handles, b"abc", &proof));
        assert!(!verifier.verify(id, &handles, b"abd", &proof));
        assert!(!verifier.verify(id, &[], b"abc", &proof));
        assert!(!verifier.verify(id, &handles, b"abc", &proof[1..]));

        let other_key = KeyedDigestVerifier::new([8; 32]);
        assert!(!other_key.verify(id, &handles, b"abc", &proof));
    }
}
