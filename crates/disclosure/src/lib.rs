// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

pub mod codec;
mod error;
mod kms;
mod proof;
mod protocol;

pub use error::*;
pub use kms::*;
pub use proof::*;
pub use protocol::*;
