// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod acl;
mod grant;
mod pending;

pub use acl::*;
pub use grant::*;
pub use pending::*;
