// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::EngineError;
use veil_events::Address;

/// The single account allowed to manage evaluators, periods and disclosure. Fixed at
/// construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Administrator(Address);

impl Administrator {
    pub fn new(address: Address) -> Result<Self, EngineError> {
        if address.is_zero() {
            return Err(EngineError::Validation(
                "administrator must not be the zero address".to_string(),
            ));
        }
        Ok(Self(address))
    }

    pub fn address(&self) -> Address {
        self.0
    }

    pub fn authorize(&self, caller: &Address, operation: &str) -> Result<(), EngineError> {
        if *caller == self.0 {
            return Ok(());
        }
        Err(EngineError::Authorization(format!(
            "{} may not {}",
            caller, operation
        )))
    }
}
