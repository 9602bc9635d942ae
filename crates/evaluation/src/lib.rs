// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod entities;
mod error;
mod ranking;
mod registry;
mod scores;

pub use entities::*;
pub use error::*;
pub use ranking::*;
pub use registry::*;
pub use scores::*;
