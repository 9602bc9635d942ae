// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{codec, DisclosureError, ProofVerifier};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};
use veil_acl::{Acl, AllowedHandle, Principal, Scope};
use veil_events::{EncryptedHandle, ProjectId, RequestId};

/// Correlates an oracle request with the handles being disclosed and the project they belong to
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DecryptionRequest {
    pub id: RequestId,
    pub project_id: ProjectId,
    pub handles: Vec<EncryptedHandle>,
    pub issued_at: u64,
}

/// A callback whose proof and cleartext checked out but which has not been consumed yet
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedResponse {
    pub request: DecryptionRequest,
    pub values: Vec<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Retired {
    Fulfilled,
    SupersededBy(RequestId),
}

/// Book-keeping for outstanding decryption requests.
///
/// Callbacks are matched by request id only. A request is consumed exactly once; a request
/// replaced by a newer one for the same project can no longer be fulfilled.
#[derive(Debug, Default)]
pub struct DisclosureProtocol {
    pending: BTreeMap<RequestId, DecryptionRequest>,
    by_project: BTreeMap<ProjectId, RequestId>,
    retired: BTreeMap<RequestId, Retired>,
    last_request: u64,
}

impl DisclosureProtocol {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request phase. The host must be able to decrypt every handle. Returns the new request
    /// and the id of any request it replaces.
    pub fn issue(
        &mut self,
        acl: &Acl,
        project_id: ProjectId,
        handles: &[AllowedHandle],
        now: u64,
    ) -> Result<(DecryptionRequest, Option<RequestId>), DisclosureError> {
        if handles.is_empty() {
            return Err(DisclosureError::NothingToDisclose);
        }
        for handle in handles {
            acl.require(handle.id(), Principal::Host, Scope::Decrypt)?;
        }

        self.last_request += 1;
        let id = RequestId::new(self.last_request);
        let request = DecryptionRequest {
            id,
            project_id,
            handles: handles.iter().map(|h| h.handle()).collect(),
            issued_at: now,
        };

        let superseded = self.by_project.insert(project_id, id);
        if let Some(old) = superseded {
            self.pending.remove(&old);
            self.retired.insert(old, Retired::SupersededBy(id));
            info!(project = %project_id, "{} supersedes {}", id, old);
        }
        self.pending.insert(id, request.clone());
        info!(project = %project_id, "decryption {} issued", id);
        Ok((request, superseded))
    }

    pub fn pending(&self) -> impl Iterator<Item = &DecryptionRequest> {
        self.pending.values()
    }

    pub fn get(&self, id: RequestId) -> Option<&DecryptionRequest> {
        self.pending.get(&id)
    }

    pub fn outstanding_for(&self, project: ProjectId) -> Option<&DecryptionRequest> {
        self.by_project
            .get(&project)
            .and_then(|id| self.pending.get(id))
    }

    /// Callback phase, first half: verify the proof, then decode the cleartext. Nothing is
    /// changed, so a failed callback leaves the request outstanding.
    pub fn verify(
        &self,
        verifier: &dyn ProofVerifier,
        request_id: RequestId,
        cleartext: &[u8],
        proof: &[u8],
    ) -> Result<VerifiedResponse, DisclosureError> {
        let request = match self.pending.get(&request_id) {
            Some(request) => request,
            None => return Err(self.missing(request_id)),
        };

        if !verifier.verify(request_id, &request.handles, cleartext, proof) {
            warn!(project = %request.project_id, "proof for {} rejected", request_id);
            return Err(DisclosureError::InvalidProof(request_id));
        }

        let types: Vec<_> = request.handles.iter().map(|h| h.fhe_type()).collect();
        let values = codec::decode(cleartext, &types)?;
        Ok(VerifiedResponse {
            request: request.clone(),
            values,
        })
    }

    /// Callback phase, second half: retire the request
    pub fn consume(&mut self, request_id: RequestId) -> Result<DecryptionRequest, DisclosureError> {
        let request = self
            .pending
            .remove(&request_id)
            .ok_or_else(|| self.missing(request_id))?;
        if self.by_project.get(&request.project_id) == Some(&request_id) {
            self.by_project.remove(&request.project_id);
        }
        self.retired.insert(request_id, Retired::Fulfilled);
        Ok(request)
    }

    fn missing(&self, request_id: RequestId) -> DisclosureError {
        match self.retired.get(&request_id) {
            Some(Retired::Fulfilled) => DisclosureError::AlreadyFulfilled(request_id),
            Some(Retired::SupersededBy(by)) => DisclosureError::Superseded {
                request: request_id,
                by: *by,
            },
            None => DisclosureError::UnknownRequest(request_id),
        }
    }
}
