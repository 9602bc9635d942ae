// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error;
use veil_acl::AclError;
use veil_events::{ErrorKind, FheType, RequestId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DisclosureError {
    #[error("a decryption request needs at least one handle")]
    NothingToDisclose,
    #[error(transparent)]
    NotDecryptable(#[from] AclError),
    #[error("unknown {0}")]
    UnknownRequest(RequestId),
    #[error("{0} was already fulfilled")]
    AlreadyFulfilled(RequestId),
    #[error("{request} was superseded by {by}")]
    Superseded { request: RequestId, by: RequestId },
    #[error("proof for {0} does not verify")]
    InvalidProof(RequestId),
    #[error("cleartext must be {expected} bytes, got {actual}")]
    CleartextLength { expected: usize, actual: usize },
    #[error("word {index} does not fit in {fhe_type}")]
    WordOverflow { index: usize, fhe_type: FheType },
    #[error("oracle failure: {0}")]
    Oracle(String),
}

impl DisclosureError {
    pub fn kind(&self) -> ErrorKind {
        use DisclosureError::*;
        match self {
            NotDecryptable(_) => ErrorKind::Authorization,
            InvalidProof(_) => ErrorKind::ProofVerification,
            NothingToDisclose | CleartextLength { .. } | WordOverflow { .. } => {
                ErrorKind::Validation
            }
            UnknownRequest(_) | AlreadyFulfilled(_) | Superseded { .. } | Oracle(_) => {
                ErrorKind::State
            }
        }
    }
}
