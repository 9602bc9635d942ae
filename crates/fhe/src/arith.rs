// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{BinaryOp, CompareOp, ExternalInput, FheError, SharedBackend};
use veil_acl::{Acl, AllowedHandle, PendingGrant, Principal, Scope};
use veil_events::{Address, FheType};

/// Homomorphic arithmetic over granted handles.
///
/// Each operand must carry a host UseInComputation grant in the supplied [`Acl`]. Operands of
/// different widths are rejected; widening is always an explicit [`Arithmetic::widen`]. Every
/// result comes back as a [`PendingGrant`].
#[derive(Clone)]
pub struct Arithmetic {
    backend: SharedBackend,
}

impl Arithmetic {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    /// Encrypt a public constant
    pub fn encrypt(&self, value: u64, fhe_type: FheType) -> Result<PendingGrant, FheError> {
        if value > fhe_type.max_value() {
            return Err(FheError::ValueOutOfRange { value, fhe_type });
        }
        Ok(PendingGrant::new(
            self.backend.trivial_encrypt(value, fhe_type)?,
        ))
    }

    /// Accept an externally encrypted value after its validity proof checks out
    pub fn ingest(&self, input: &ExternalInput, owner: &Address) -> Result<PendingGrant, FheError> {
        Ok(PendingGrant::new(self.backend.verify_input(input, owner)?))
    }

    pub fn add(
        &self,
        acl: &Acl,
        a: &AllowedHandle,
        b: &AllowedHandle,
    ) -> Result<PendingGrant, FheError> {
        self.binary(acl, BinaryOp::Add, a, b)
    }

    pub fn sub(
        &self,
        acl: &Acl,
        a: &AllowedHandle,
        b: &AllowedHandle,
    ) -> Result<PendingGrant, FheError> {
        self.binary(acl, BinaryOp::Sub, a, b)
    }

    pub fn mul(
        &self,
        acl: &Acl,
        a: &AllowedHandle,
        b: &AllowedHandle,
    ) -> Result<PendingGrant, FheError> {
        self.binary(acl, BinaryOp::Mul, a, b)
    }

    pub fn gt(
        &self,
        acl: &Acl,
        a: &AllowedHandle,
        b: &AllowedHandle,
    ) -> Result<PendingGrant, FheError> {
        self.compare(acl, CompareOp::Gt, a, b)
    }

    pub fn lt(
        &self,
        acl: &Acl,
        a: &AllowedHandle,
        b: &AllowedHandle,
    ) -> Result<PendingGrant, FheError> {
        self.compare(acl, CompareOp::Lt, a, b)
    }

    pub fn eq(
        &self,
        acl: &Acl,
        a: &AllowedHandle,
        b: &AllowedHandle,
    ) -> Result<PendingGrant, FheError> {
        self.compare(acl, CompareOp::Eq, a, b)
    }

    /// Choose between two equally typed handles on an encrypted boolean
    pub fn select(
        &self,
        acl: &Acl,
        cond: &AllowedHandle,
        if_true: &AllowedHandle,
        if_false: &AllowedHandle,
    ) -> Result<PendingGrant, FheError> {
        usable(acl, &[cond, if_true, if_false])?;
        if cond.fhe_type() != FheType::Bool {
            return Err(FheError::UnsupportedType {
                op: "select condition",
                fhe_type: cond.fhe_type(),
            });
        }
        same_width(if_true, if_false)?;
        Ok(PendingGrant::new(self.backend.select(
            cond.handle(),
            if_true.handle(),
            if_false.handle(),
        )?))
    }

    /// Widen an integer handle to a strictly larger integer type
    pub fn widen(
        &self,
        acl: &Acl,
        handle: &AllowedHandle,
        to: FheType,
    ) -> Result<PendingGrant, FheError> {
        usable(acl, &[handle])?;
        let from = handle.fhe_type();
        if !from.is_integer() || !to.is_integer() || to.bits() <= from.bits() {
            return Err(FheError::InvalidCast { from, to });
        }
        Ok(PendingGrant::new(self.backend.cast(handle.handle(), to)?))
    }

    fn binary(
        &self,
        acl: &Acl,
        op: BinaryOp,
        a: &AllowedHandle,
        b: &AllowedHandle,
    ) -> Result<PendingGrant, FheError> {
        usable(acl, &[a, b])?;
        integer("arithmetic", a)?;
        same_width(a, b)?;
        Ok(PendingGrant::new(
            self.backend.binary(op, a.handle(), b.handle())?,
        ))
    }

    fn compare(
        &self,
        acl: &Acl,
        op: CompareOp,
        a: &AllowedHandle,
        b: &AllowedHandle,
    ) -> Result<PendingGrant, FheError> {
        usable(acl, &[a, b])?;
        integer("comparison", a)?;
        same_width(a, b)?;
        Ok(PendingGrant::new(
            self.backend.compare(op, a.handle(), b.handle())?,
        ))
    }
}

fn usable(acl: &Acl, handles: &[&AllowedHandle]) -> Result<(), FheError> {
    for handle in handles {
        acl.require(handle.id(), Principal::Host, Scope::UseInComputation)?;
    }
    Ok(())
}

fn integer(op: &'static str, handle: &AllowedHandle) -> Result<(), FheError> {
    if handle.fhe_type().is_integer() {
        return Ok(());
    }
    Err(FheError::UnsupportedType {
        op,
        fhe_type: handle.fhe_type(),
    })
}

fn same_width(a: &AllowedHandle, b: &AllowedHandle) -> Result<(), FheError> {
    if a.fhe_type() == b.fhe_type() {
        return Ok(());
    }
    Err(FheError::WidthMismatch {
        left: a.fhe_type(),
        right: b.fhe_type(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PlaintextLookup, SimulatedFhe};
    use proptest::prelude::*;
    use std::sync::Arc;

    struct Harness {
        fhe: Arc<SimulatedFhe>,
        arith: Arithmetic,
        acl: Acl,
    }

    impl Harness {
        fn new() -> Self {
            let fhe = Arc::new(SimulatedFhe::new());
            let arith = Arithmetic::new(fhe.clone());
            Self {
                fhe,
                arith,
                acl: Acl::new(),
            }
        }

        fn constant(&mut self, value: u64, fhe_type: FheType) -> AllowedHandle {
            self.arith
                .encrypt(value, fhe_type)
                .unwrap()
                .grant(&mut self.acl, Principal::Host)
        }

        fn reveal(&self, handle: &AllowedHandle) -> u64 {
            self.fhe.plaintext(&handle.handle()).unwrap()
        }
    }

    #[test]
    fn widening_then_adding_sums_dimensions() -> anyhow::Result<()> {
        let mut h = Harness::new();
        let dims: Vec<AllowedHandle> = [8, 7, 9, 8]
            .into_iter()
            .map(|v| h.constant(v, FheType::U8))
            .collect();

        let mut total = h.constant(0, FheType::U32);
        for dim in &dims {
            let wide = h.arith.widen(&h.acl, dim, FheType::U32)?.grant(&mut h.acl, Principal::Host);
            total = h.arith.add(&h.acl, &total, &wide)?.grant(&mut h.acl, Principal::Host);
        }
        assert_eq!(h.reveal(&total), 32);
        assert_eq!(total.fhe_type(), FheType::U32);
        Ok(())
    }

    #[test]
    fn mixed_widths_are_never_widened_implicitly() {
        let mut h = Harness::new();
        let a = h.constant(1, FheType::U8);
        let b = h.constant(1, FheType::U32);
        assert_eq!(
            h.arith.add(&h.acl, &a, &b),
            Err(FheError::WidthMismatch {
                left: FheType::U8,
                right: FheType::U32
            })
        );
    }

    #[test]
    fn widen_rejects_narrowing_and_booleans() -> anyhow::Result<()> {
        let mut h = Harness::new();
        let a = h.constant(3, FheType::U32);
        assert_eq!(
            h.arith.widen(&h.acl, &a, FheType::U8),
            Err(FheError::InvalidCast {
                from: FheType::U32,
                to: FheType::U8
            })
        );
        assert!(h.arith.widen(&h.acl, &a, FheType::U32).is_err());

        let b = h.constant(1, FheType::U32);
        let cond = h.arith.eq(&h.acl, &a, &b)?.grant(&mut h.acl, Principal::Host);
        assert!(matches!(
            h.arith.widen(&h.acl, &cond, FheType::U64),
            Err(FheError::InvalidCast { .. })
        ));
        assert!(matches!(
            h.arith.add(&h.acl, &cond, &cond),
            Err(FheError::UnsupportedType { .. })
        ));
        Ok(())
    }

    #[test]
    fn select_clamps_without_branching() -> anyhow::Result<()> {
        let mut h = Harness::new();
        let max = h.constant(10, FheType::U8);
        for (input, expected) in [(14, 10), (10, 10), (3, 3)] {
            let x = h.constant(input, FheType::U8);
            let over = h.arith.gt(&h.acl, &x, &max)?.grant(&mut h.acl, Principal::Host);
            let clamped = h
                .arith
                .select(&h.acl, &over, &max, &x)?
                .grant(&mut h.acl, Principal::Host);
            assert_eq!(h.reveal(&clamped), expected);
        }

        let x = h.constant(1, FheType::U8);
        assert!(matches!(
            h.arith.select(&h.acl, &x, &max, &x),
            Err(FheError::UnsupportedType { .. })
        ));
        Ok(())
    }

    #[test]
    fn operands_without_host_grant_are_rejected() {
        let mut h = Harness::new();
        let a = h.constant(1, FheType::U8);
        let foreign = Acl::new();
        assert!(matches!(
            h.arith.add(&foreign, &a, &a),
            Err(FheError::MissingCapability(_))
        ));
    }

    #[test]
    fn constants_must_fit_their_type() {
        let h = Harness::new();
        assert_eq!(
            h.arith.encrypt(256, FheType::U8),
            Err(FheError::ValueOutOfRange {
                value: 256,
                fhe_type: FheType::U8
            })
        );
    }

    proptest! {
        #[test]
        fn homomorphic_ops_match_wrapping_plaintext(a in any::<u32>(), b in any::<u32>()) {
            let mut h = Harness::new();
            let x = h.constant(a as u64, FheType::U32);
            let y = h.constant(b as u64, FheType::U32);

            let sum = h.arith.add(&h.acl, &x, &y).unwrap().grant(&mut h.acl, Principal::Host);
            let diff = h.arith.sub(&h.acl, &x, &y).unwrap().grant(&mut h.acl, Principal::Host);
            let prod = h.arith.mul(&h.acl, &x, &y).unwrap().grant(&mut h.acl, Principal::Host);
            let lt = h.arith.lt(&h.acl, &x, &y).unwrap().grant(&mut h.acl, Principal::Host);

            prop_assert_eq!(h.reveal(&sum), a.wrapping_add(b) as u64);
            prop_assert_eq!(h.reveal(&diff), a.wrapping_sub(b) as u64);
            prop_assert_eq!(h.reveal(&prod), a.wrapping_mul(b) as u64);
            prop_assert_eq!(h.reveal(&lt), (a < b) as u64);
        }
    }
}
