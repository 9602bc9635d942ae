// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::FheError;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use veil_events::{Address, EncryptedHandle, FheType};
use veil_utils::ArcBytes;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Gt,
    Lt,
    Eq,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "add"),
            BinaryOp::Sub => write!(f, "sub"),
            BinaryOp::Mul => write!(f, "mul"),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Gt => write!(f, "gt"),
            CompareOp::Lt => write!(f, "lt"),
            CompareOp::Eq => write!(f, "eq"),
        }
    }
}

/// A ciphertext produced outside the engine together with its validity proof
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalInput {
    pub handle: EncryptedHandle,
    pub proof: ArcBytes,
}

/// Seam to the external homomorphic encryption back end. Implementations own the ciphertexts;
/// the engine only ever sees handles.
///
/// Type and width rules are enforced by [`crate::Arithmetic`] before any of these are called.
pub trait FheBackend: Send + Sync + 'static {
    /// Encrypt a public constant
    fn trivial_encrypt(&self, value: u64, fhe_type: FheType) -> Result<EncryptedHandle, FheError>;

    /// Check that `input` was produced for `owner` and return the handle it carries
    fn verify_input(
        &self,
        input: &ExternalInput,
        owner: &Address,
    ) -> Result<EncryptedHandle, FheError>;

    fn binary(
        &self,
        op: BinaryOp,
        a: EncryptedHandle,
        b: EncryptedHandle,
    ) -> Result<EncryptedHandle, FheError>;

    /// Returns an encrypted boolean
    fn compare(
        &self,
        op: CompareOp,
        a: EncryptedHandle,
        b: EncryptedHandle,
    ) -> Result<EncryptedHandle, FheError>;

    fn select(
        &self,
        cond: EncryptedHandle,
        if_true: EncryptedHandle,
        if_false: EncryptedHandle,
    ) -> Result<EncryptedHandle, FheError>;

    fn cast(&self, handle: EncryptedHandle, to: FheType) -> Result<EncryptedHandle, FheError>;
}

pub type SharedBackend = Arc<dyn FheBackend>;
