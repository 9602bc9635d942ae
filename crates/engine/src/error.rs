// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error;
use veil_acl::AclError;
use veil_disclosure::DisclosureError;
use veil_evaluation::LifecycleError;
use veil_events::ErrorKind;
use veil_fhe::FheError;

/// Every failed engine operation ends in exactly one of these
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("authorization error: {0}")]
    Authorization(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("state error: {0}")]
    State(String),
    #[error("proof verification error: {0}")]
    ProofVerification(String),
}

impl EngineError {
    pub fn new(kind: ErrorKind, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        match kind {
            ErrorKind::Authorization => EngineError::Authorization(reason),
            ErrorKind::Validation => EngineError::Validation(reason),
            ErrorKind::State => EngineError::State(reason),
            ErrorKind::ProofVerification => EngineError::ProofVerification(reason),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Authorization(_) => ErrorKind::Authorization,
            EngineError::Validation(_) => ErrorKind::Validation,
            EngineError::State(_) => ErrorKind::State,
            EngineError::ProofVerification(_) => ErrorKind::ProofVerification,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    pub fn reason(&self) -> &str {
        match self {
            EngineError::Authorization(r)
            | EngineError::Validation(r)
            | EngineError::State(r)
            | EngineError::ProofVerification(r) => r,
        }
    }
}

impl From<LifecycleError> for EngineError {
    fn from(value: LifecycleError) -> Self {
        EngineError::new(value.kind(), value.to_string())
    }
}

impl From<DisclosureError> for EngineError {
    fn from(value: DisclosureError) -> Self {
        EngineError::new(value.kind(), value.to_string())
    }
}

impl From<AclError> for EngineError {
    fn from(value: AclError) -> Self {
        EngineError::Authorization(value.to_string())
    }
}

impl From<FheError> for EngineError {
    fn from(value: FheError) -> Self {
        match value {
            FheError::MissingCapability(e) => e.into(),
            FheError::Backend(_) => EngineError::State(value.to_string()),
            _ => EngineError::Validation(value.to_string()),
        }
    }
}
