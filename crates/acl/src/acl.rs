// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{CapabilityGrant, Principal, Scope};
use std::collections::HashSet;
use thiserror::Error;
use tracing::trace;
use veil_events::HandleId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AclError {
    #[error("{principal} lacks the {scope} capability on {handle}")]
    MissingGrant {
        handle: HandleId,
        principal: Principal,
        scope: Scope,
    },
}

/// Position in the grant log returned by [`Acl::checkpoint`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Checkpoint(usize);

/// Capability manager. Grants are additive: the log only ever grows, except that grants
/// recorded after a [`Checkpoint`] can be discarded when the operation that made them fails.
#[derive(Debug, Default)]
pub struct Acl {
    log: Vec<CapabilityGrant>,
    index: HashSet<CapabilityGrant>,
}

impl Acl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, handle: HandleId, principal: Principal, scope: Scope) {
        let grant = CapabilityGrant {
            handle,
            principal,
            scope,
        };
        if self.index.insert(grant) {
            trace!("grant: {}", grant);
            self.log.push(grant);
        }
    }

    pub fn check(&self, handle: HandleId, principal: Principal, scope: Scope) -> bool {
        self.index.contains(&CapabilityGrant {
            handle,
            principal,
            scope,
        })
    }

    pub fn require(
        &self,
        handle: HandleId,
        principal: Principal,
        scope: Scope,
    ) -> Result<(), AclError> {
        if self.check(handle, principal, scope) {
            return Ok(());
        }
        Err(AclError::MissingGrant {
            handle,
            principal,
            scope,
        })
    }

    /// Ordered grant log
    pub fn grants(&self) -> &[CapabilityGrant] {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.log.len())
    }

    /// Discard every grant recorded after `checkpoint`
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        if checkpoint.0 >= self.log.len() {
            return;
        }
        for grant in self.log.drain(checkpoint.0..) {
            self.index.remove(&grant);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_events::Address;

    fn handle(n: u8) -> HandleId {
        HandleId([n; 32])
    }

    #[test]
    fn grants_are_scoped_per_principal() {
        let mut acl = Acl::new();
        let alice = Principal::Account(Address::from_low_u64(1));
        acl.grant(handle(1), Principal::Host, Scope::UseInComputation);
        acl.grant(handle(1), alice, Scope::Decrypt);

        assert!(acl.check(handle(1), Principal::Host, Scope::UseInComputation));
        assert!(!acl.check(handle(1), Principal::Host, Scope::Decrypt));
        assert!(acl.check(handle(1), alice, Scope::Decrypt));
        assert!(!acl.check(handle(2), alice, Scope::Decrypt));
        assert_eq!(
            acl.require(handle(2), Principal::Host, Scope::UseInComputation),
            Err(AclError::MissingGrant {
                handle: handle(2),
                principal: Principal::Host,
                scope: Scope::UseInComputation
            })
        );
    }

    #[test]
    fn repeated_grants_are_recorded_once() {
        let mut acl = Acl::new();
        acl.grant(handle(1), Principal::Host, Scope::UseInComputation);
        acl.grant(handle(1), Principal::Host, Scope::UseInComputation);
        assert_eq!(acl.len(), 1);
    }

    #[test]
    fn rollback_discards_only_later_grants() {
        let mut acl = Acl::new();
        acl.grant(handle(1), Principal::Host, Scope::UseInComputation);
        let cp = acl.checkpoint();
        acl.grant(handle(2), Principal::Host, Scope::UseInComputation);
        acl.grant(handle(2), Principal::Host, Scope::Decrypt);
        acl.rollback(cp);

        assert_eq!(acl.len(), 1);
        assert!(acl.check(handle(1), Principal::Host, Scope::UseInComputation));
        assert!(!acl.check(handle(2), Principal::Host, Scope::UseInComputation));

        // a stale checkpoint is harmless
        acl.rollback(Checkpoint(5));
        assert_eq!(acl.len(), 1);
    }
}
