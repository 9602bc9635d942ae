// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::{Actor, Addr, Context, Handler, Message};
use std::marker::PhantomData;
use tracing::{error, info};
use veil_events::{BusHandle, EngineEvent, EngineEventData, Event, EventBus, Subscribe};

pub trait EventLogging: Event {
    fn log(&self, logger_name: &str);
}

/// Logs every event published on a bus
pub struct SimpleLogger<E: EventLogging> {
    name: String,
    logged: usize,
    _p: PhantomData<E>,
}

impl<E: EventLogging> SimpleLogger<E> {
    pub fn attach(name: &str, bus: &Addr<EventBus<E>>) -> Addr<Self> {
        let addr = Self {
            name: name.to_owned(),
            logged: 0,
            _p: PhantomData,
        }
        .start();
        bus.do_send(Subscribe::<E>::new("*", addr.clone().recipient()));
        info!(logger = %name, "listening");
        addr
    }
}

impl SimpleLogger<EngineEvent> {
    pub fn attach_to(name: &str, bus: &BusHandle) -> Addr<Self> {
        Self::attach(name, bus.bus())
    }
}

impl<E: EventLogging> Actor for SimpleLogger<E> {
    type Context = Context<Self>;
}

impl<E: EventLogging> Handler<E> for SimpleLogger<E> {
    type Result = ();

    fn handle(&mut self, msg: E, _: &mut Self::Context) -> Self::Result {
        self.logged += 1;
        msg.log(&self.name);
    }
}

/// Number of events logged so far
#[derive(Message)]
#[rtype(result = "usize")]
pub struct GetLoggedCount;

impl<E: EventLogging> Handler<GetLoggedCount> for SimpleLogger<E> {
    type Result = usize;

    fn handle(&mut self, _: GetLoggedCount, _: &mut Self::Context) -> Self::Result {
        self.logged
    }
}

impl EventLogging for EngineEvent {
    fn log(&self, logger_name: &str) {
        match self.get_data() {
            EngineEventData::OperationRejected(rejected) => error!(
                me = logger_name,
                operation = %rejected.operation,
                code = rejected.kind.code(),
                "{}",
                rejected.reason
            ),
            data => match data.project_id() {
                Some(project) => {
                    info!(me = logger_name, evt = %self, project = %project, "event published")
                }
                None => info!(me = logger_name, evt = %self, "event published"),
            },
        }
    }
}
