// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{codec, DisclosureError, KeyedDigestVerifier};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use veil_events::{EncryptedHandle, RequestId};
use veil_fhe::PlaintextLookup;
use veil_utils::ArcBytes;

/// What the oracle hands back through the callback
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionResponse {
    pub request_id: RequestId,
    pub cleartext: ArcBytes,
    pub proof: ArcBytes,
}

/// Simulated key management service. Decrypts through the back end's plaintext table and
/// signs the result with the oracle key.
#[derive(Clone)]
pub struct SimulatedKms {
    lookup: Arc<dyn PlaintextLookup>,
    signer: KeyedDigestVerifier,
}

impl SimulatedKms {
    pub fn new(lookup: Arc<dyn PlaintextLookup>, signer: KeyedDigestVerifier) -> Self {
        Self { lookup, signer }
    }

    pub fn fulfil(
        &self,
        request_id: RequestId,
        handles: &[EncryptedHandle],
    ) -> Result<DecryptionResponse, DisclosureError> {
        let values = handles
            .iter()
            .map(|h| {
                self.lookup
                    .plaintext(h)
                    .ok_or_else(|| DisclosureError::Oracle(format!("cannot decrypt {}", h)))
            })
            .collect::<Result<Vec<u64>, _>>()?;
        let cleartext = codec::encode(&values);
        let proof = self.signer.sign(request_id, handles, &cleartext);
        debug!("fulfilled {} ({} words)", request_id, values.len());
        Ok(DecryptionResponse {
            request_id,
            cleartext: cleartext.into(),
            proof: proof.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProofVerifier;
    use veil_events::FheType;
    use veil_fhe::{FheBackend, SimulatedFhe};

    #[test]
    fn responses_verify_and_decode() -> anyhow::Result<()> {
        let fhe = Arc::new(SimulatedFhe::new());
        let signer = KeyedDigestVerifier::new([1; 32]);
        let kms = SimulatedKms::new(fhe.clone(), signer.clone());
        let handle = fhe.trivial_encrypt(64, FheType::U32)?;

        let response = kms.fulfil(RequestId::new(3), &[handle])?;
        assert!(signer.verify(
            RequestId::new(3),
            &[handle],
            &response.cleartext,
            &response.proof
        ));
        assert_eq!(codec::decode(&response.cleartext, &[FheType::U32])?, vec![64]);
        Ok(())
    }
}
