// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Acl, Principal, Scope};
use serde::Serialize;
use std::fmt;
use veil_events::{EncryptedHandle, FheType, HandleId};

/// A freshly produced handle that has not received its mandatory grants yet.
///
/// Every handle produced by the arithmetic layer comes wrapped in one of these. The only way
/// to get something that can be stored or fed into further computation is
/// [`PendingGrant::grant`], which records UseInComputation for the host and Decrypt for the
/// originator in one step.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a produced handle must be granted before it can be used"]
pub struct PendingGrant {
    handle: EncryptedHandle,
}

impl PendingGrant {
    pub fn new(handle: EncryptedHandle) -> Self {
        Self { handle }
    }

    pub fn fhe_type(&self) -> FheType {
        self.handle.fhe_type()
    }

    pub fn grant(self, acl: &mut Acl, originator: Principal) -> AllowedHandle {
        let id = self.handle.id();
        acl.grant(id, Principal::Host, Scope::UseInComputation);
        acl.grant(id, originator, Scope::Decrypt);
        AllowedHandle {
            handle: self.handle,
        }
    }
}

/// A handle whose host and originator grants have been recorded
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct AllowedHandle {
    handle: EncryptedHandle,
}

impl AllowedHandle {
    pub fn handle(&self) -> EncryptedHandle {
        self.handle
    }

    pub fn id(&self) -> HandleId {
        self.handle.id()
    }

    pub fn fhe_type(&self) -> FheType {
        self.handle.fhe_type()
    }

    /// Record an additional grant on this handle
    pub fn allow(&self, acl: &mut Acl, principal: Principal, scope: Scope) {
        acl.grant(self.id(), principal, scope);
    }
}

impl fmt::Display for AllowedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_events::Address;

    #[test]
    fn granting_records_host_use_and_originator_decrypt() {
        let mut acl = Acl::new();
        let evaluator = Principal::Account(Address::from_low_u64(7));
        let pending = PendingGrant::new(EncryptedHandle::new(HandleId([3; 32]), FheType::U32));

        let allowed = pending.grant(&mut acl, evaluator);

        assert!(acl.check(allowed.id(), Principal::Host, Scope::UseInComputation));
        assert!(acl.check(allowed.id(), evaluator, Scope::Decrypt));
        assert!(!acl.check(allowed.id(), evaluator, Scope::UseInComputation));
        assert!(!acl.check(allowed.id(), Principal::Host, Scope::Decrypt));
        assert_eq!(acl.grants().len(), 2);
        assert_eq!(allowed.fhe_type(), FheType::U32);
    }

    #[test]
    fn host_originated_handles_are_decryptable_by_host() {
        let mut acl = Acl::new();
        let allowed = PendingGrant::new(EncryptedHandle::new(HandleId([4; 32]), FheType::U32))
            .grant(&mut acl, Principal::Host);
        assert!(acl.check(allowed.id(), Principal::Host, Scope::Decrypt));
    }
}
