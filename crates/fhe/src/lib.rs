// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod arith;
mod backend;
mod error;
mod simulated;

pub use arith::*;
pub use backend::*;
pub use error::*;
pub use simulated::*;
