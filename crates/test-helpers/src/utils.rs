// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::{fmt, EnvFilter};
use veil_events::Address;

pub const ADMIN: Address = Address::new([0xad; 20]);

/// Deterministic evaluator address; `n` must be non-zero
pub fn evaluator(n: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[0] = 0xe0;
    bytes[19] = n;
    Address::new(bytes)
}

/// Deterministic submitter address
pub fn submitter(n: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[0] = 0x50;
    bytes[19] = n;
    Address::new(bytes)
}

/// Route tracing output through the test writer for the current thread
pub fn test_tracing(filter: &str) -> DefaultGuard {
    let subscriber = fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_test_writer()
        .finish();
    tracing::subscriber::set_default(subscriber)
}
