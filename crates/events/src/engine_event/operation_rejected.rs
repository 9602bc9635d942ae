// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// The error taxonomy shared by every engine operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Authorization,
    Validation,
    State,
    ProofVerification,
}

impl ErrorKind {
    /// Stable machine readable code surfaced to callers
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Authorization => "AUTHORIZATION_ERROR",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::State => "STATE_ERROR",
            ErrorKind::ProofVerification => "PROOF_VERIFICATION_ERROR",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct OperationRejected {
    pub operation: String,
    pub kind: ErrorKind,
    pub reason: String,
}

impl OperationRejected {
    pub fn new(operation: &str, kind: ErrorKind, reason: impl Into<String>) -> Self {
        Self {
            operation: operation.to_string(),
            kind,
            reason: reason.into(),
        }
    }
}

impl Display for OperationRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rejected [{}]: {}", self.operation, self.kind, self.reason)
    }
}
