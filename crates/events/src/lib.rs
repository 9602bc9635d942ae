// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod bus_handle;
mod engine_event;
mod event_id;
mod eventbus;
mod handle;
mod ids;
mod ordered_set;
mod traits;

pub use bus_handle::*;
pub use engine_event::*;
pub use event_id::*;
pub use eventbus::*;
pub use handle::*;
pub use ids::*;
pub use ordered_set::*;
pub use traits::*;
