// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod actor;
mod admin;
mod builder;
mod engine;
mod error;
mod oracle;

pub use actor::*;
pub use admin::*;
pub use builder::*;
pub use engine::*;
pub use error::*;
pub use oracle::*;
