// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error;
use veil_acl::AclError;
use veil_events::{FheType, HandleId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FheError {
    #[error("operands have different widths: {left} and {right}")]
    WidthMismatch { left: FheType, right: FheType },
    #[error("cannot cast {from} to {to}")]
    InvalidCast { from: FheType, to: FheType },
    #[error("{op} is not defined for {fhe_type}")]
    UnsupportedType { op: &'static str, fhe_type: FheType },
    #[error("value {value} does not fit in {fhe_type}")]
    ValueOutOfRange { value: u64, fhe_type: FheType },
    #[error(transparent)]
    MissingCapability(#[from] AclError),
    #[error("input proof for {0} is invalid")]
    InvalidInputProof(HandleId),
    #[error("unknown handle {0}")]
    UnknownHandle(HandleId),
    #[error("back end failure: {0}")]
    Backend(String),
}
