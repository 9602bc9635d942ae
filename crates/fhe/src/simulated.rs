// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{BinaryOp, CompareOp, ExternalInput, FheBackend, FheError};
use sha2::{Digest, Sha256};
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};
use tracing::trace;
use veil_events::{Address, EncryptedHandle, FheType, HandleId};
use veil_utils::ArcBytes;

/// Gives the simulated key management service access to plaintexts. Nothing on the engine side
/// holds one of these.
pub trait PlaintextLookup: Send + Sync + 'static {
    fn plaintext(&self, handle: &EncryptedHandle) -> Option<u64>;
}

#[derive(Default)]
struct Table {
    values: HashMap<HandleId, (u64, FheType)>,
    counter: u64,
}

/// Deterministic in-memory stand in for a homomorphic back end. Each handle maps to the
/// plaintext it would decrypt to, and arithmetic wraps at the declared width the way the real
/// back end does.
pub struct SimulatedFhe {
    table: Mutex<Table>,
    input_key: [u8; 32],
}

impl Default for SimulatedFhe {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedFhe {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(Table::default()),
            input_key: Sha256::digest(b"veil/simulated-input-key").into(),
        }
    }

    fn table(&self) -> Result<MutexGuard<'_, Table>, FheError> {
        self.table
            .lock()
            .map_err(|_| FheError::Backend("handle table poisoned".to_string()))
    }

    fn store(
        &self,
        tag: &str,
        parents: &[HandleId],
        value: u64,
        fhe_type: FheType,
    ) -> Result<EncryptedHandle, FheError> {
        let mut table = self.table()?;
        table.counter += 1;
        let mut hasher = Sha256::new();
        hasher.update(tag.as_bytes());
        hasher.update(table.counter.to_be_bytes());
        for parent in parents {
            hasher.update(parent.as_bytes());
        }
        let id = HandleId(hasher.finalize().into());
        table.values.insert(id, (fhe_type.truncate(value), fhe_type));
        let handle = EncryptedHandle::new(id, fhe_type);
        trace!("{} -> {}", tag, handle);
        Ok(handle)
    }

    fn load(&self, handle: &EncryptedHandle) -> Result<u64, FheError> {
        let table = self.table()?;
        match table.values.get(&handle.id()) {
            Some((value, fhe_type)) if *fhe_type == handle.fhe_type() => Ok(*value),
            _ => Err(FheError::UnknownHandle(handle.id())),
        }
    }

    fn input_proof(&self, handle: &EncryptedHandle, owner: &Address) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(self.input_key);
        hasher.update(handle.id().as_bytes());
        hasher.update(owner.as_bytes());
        hasher.finalize().to_vec()
    }

    /// Client side encryption: produce a ciphertext bound to `owner` with its validity proof
    pub fn encrypt_input(
        &self,
        value: u64,
        fhe_type: FheType,
        owner: &Address,
    ) -> Result<ExternalInput, FheError> {
        if value > fhe_type.max_value() {
            return Err(FheError::ValueOutOfRange { value, fhe_type });
        }
        let handle = self.store("input", &[], value, fhe_type)?;
        let proof = ArcBytes::from_bytes(self.input_proof(&handle, owner));
        Ok(ExternalInput { handle, proof })
    }

    /// Number of ciphertexts held
    pub fn len(&self) -> usize {
        self.table().map(|t| t.values.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PlaintextLookup for SimulatedFhe {
    fn plaintext(&self, handle: &EncryptedHandle) -> Option<u64> {
        self.load(handle).ok()
    }
}

impl FheBackend for SimulatedFhe {
    fn trivial_encrypt(&self, value: u64, fhe_type: FheType) -> Result<EncryptedHandle, FheError> {
        self.store("trivial", &[], value, fhe_type)
    }

    fn verify_input(
        &self,
        input: &ExternalInput,
        owner: &Address,
    ) -> Result<EncryptedHandle, FheError> {
        self.load(&input.handle)?;
        if input.proof.as_ref() != self.input_proof(&input.handle, owner).as_slice() {
            return Err(FheError::InvalidInputProof(input.handle.id()));
        }
        Ok(input.handle)
    }

    fn binary(
        &self,
        op: BinaryOp,
        a: EncryptedHandle,
        b: EncryptedHandle,
    ) -> Result<EncryptedHandle, FheError> {
        let (x, y) = (self.load(&a)?, self.load(&b)?);
        let value = match op {
            BinaryOp::Add => x.wrapping_add(y),
            BinaryOp::Sub => x.wrapping_sub(y),
            BinaryOp::Mul => x.wrapping_mul(y),
        };
        self.store(&op.to_string(), &[a.id(), b.id()], value, a.fhe_type())
    }

    fn compare(
        &self,
        op: CompareOp,
        a: EncryptedHandle,
        b: EncryptedHandle,
    ) -> Result<EncryptedHandle, FheError> {
        let (x, y) = (self.load(&a)?, self.load(&b)?);
        let value = match op {
            CompareOp::Gt => x > y,
            CompareOp::Lt => x < y,
            CompareOp::Eq => x == y,
        };
        self.store(&op.to_string(), &[a.id(), b.id()], value as u64, FheType::Bool)
    }

    fn select(
        &self,
        cond: EncryptedHandle,
        if_true: EncryptedHandle,
        if_false: EncryptedHandle,
    ) -> Result<EncryptedHandle, FheError> {
        let c = self.load(&cond)?;
        let (t, f) = (self.load(&if_true)?, self.load(&if_false)?);
        let value = if c != 0 { t } else { f };
        self.store(
            "select",
            &[cond.id(), if_true.id(), if_false.id()],
            value,
            if_true.fhe_type(),
        )
    }

    fn cast(&self, handle: EncryptedHandle, to: FheType) -> Result<EncryptedHandle, FheError> {
        let value = self.load(&handle)?;
        self.store("cast", &[handle.id()], value, to)
    }
}
