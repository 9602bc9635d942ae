// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::Message;
use std::{fmt::Display, hash::Hash};

/// An entry that can travel over an [`crate::EventBus`]. Subscribers select events by
/// [`Event::event_type`]; the bus drops repeats by [`Event::event_id`].
pub trait Event:
    Message<Result = ()> + Clone + Display + Send + Sync + Unpin + Sized + 'static
{
    type Id: Hash + Eq + Copy + Unpin + Send + Sync + Display;
    type Data;

    fn event_type(&self) -> &'static str;
    fn event_id(&self) -> Self::Id;
    fn get_data(&self) -> &Self::Data;
    fn into_data(self) -> Self::Data;
}

/// Events of which some variants report a failure
pub trait ErrorEvent: Event {
    type Error: Clone + Send + Unpin + 'static;

    fn as_error(&self) -> Option<&Self::Error>;
}
