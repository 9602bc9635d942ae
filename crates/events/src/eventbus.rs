// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::traits::{ErrorEvent, Event};
use actix::prelude::*;
use std::collections::{HashMap, HashSet, VecDeque};
use std::marker::PhantomData;
use tokio::sync::oneshot;
use tracing::{debug, trace};

/// Subscription key matching every event type
pub const ALL_EVENTS: &str = "*";

#[derive(Clone, Copy, Debug)]
pub struct EventBusConfig {
    /// Drop events whose id has already been forwarded
    pub deduplicate: bool,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self { deduplicate: true }
    }
}

/// Fan-out point for one engine instance. The engine actor publishes every state transition
/// here and the audit history, the logger and the disclosure oracle subscribe to it.
///
/// Wildcard subscribers receive an event before the subscribers of its type, so anything
/// observed on a typed subscription is already in the history.
pub struct EventBus<E: Event> {
    config: EventBusConfig,
    seen: HashSet<E::Id>,
    subscribers: HashMap<String, Vec<Recipient<E>>>,
}

impl<E: Event> Actor for EventBus<E> {
    type Context = Context<Self>;
}

impl<E: Event> EventBus<E> {
    pub fn new(config: EventBusConfig) -> Self {
        Self {
            config,
            seen: HashSet::new(),
            subscribers: HashMap::new(),
        }
    }

    /// Start a collector recording everything published on `bus`
    pub fn history(bus: &Addr<EventBus<E>>) -> Addr<HistoryCollector<E>> {
        Self::collect(bus, ALL_EVENTS)
    }

    /// Start a collector recording only events of `error_type`
    pub fn error(bus: &Addr<EventBus<E>>, error_type: &str) -> Addr<HistoryCollector<E>> {
        Self::collect(bus, error_type)
    }

    fn collect(bus: &Addr<EventBus<E>>, event_type: &str) -> Addr<HistoryCollector<E>> {
        let collector = HistoryCollector::<E>::new().start();
        bus.do_send(Subscribe::new(event_type, collector.clone().recipient()));
        collector
    }

    fn forward(&self, key: &str, event: &E) {
        for subscriber in self.subscribers.get(key).into_iter().flatten() {
            subscriber.do_send(event.clone());
        }
    }
}

impl<E: Event> Default for EventBus<E> {
    fn default() -> Self {
        Self::new(EventBusConfig::default())
    }
}

impl<E: Event> Handler<E> for EventBus<E> {
    type Result = ();

    fn handle(&mut self, event: E, _: &mut Context<Self>) {
        if self.config.deduplicate && !self.seen.insert(event.event_id()) {
            debug!("dropping duplicate {}", event.event_id());
            return;
        }
        trace!("bus: {}", event);
        self.forward(ALL_EVENTS, &event);
        self.forward(event.event_type(), &event);
    }
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Subscribe<E: Event> {
    pub event_type: String,
    pub listener: Recipient<E>,
}

impl<E: Event> Subscribe<E> {
    pub fn new(event_type: impl Into<String>, listener: Recipient<E>) -> Self {
        Self {
            event_type: event_type.into(),
            listener,
        }
    }
}

impl<E: Event> Handler<Subscribe<E>> for EventBus<E> {
    type Result = ();

    fn handle(&mut self, msg: Subscribe<E>, _: &mut Context<Self>) {
        self.subscribers
            .entry(msg.event_type)
            .or_default()
            .push(msg.listener);
    }
}

/// Take the next `amount` recorded events after the read cursor, waiting until that many
/// exist. Takes are answered in the order they were asked.
pub struct TakeEvents<E: Event> {
    amount: usize,
    _e: PhantomData<E>,
}

impl<E: Event> TakeEvents<E> {
    pub fn new(amount: usize) -> Self {
        Self {
            amount,
            _e: PhantomData,
        }
    }
}

impl<E: Event> Message for TakeEvents<E> {
    type Result = Vec<E>;
}

/// Resolve with every recorded event of `event_type` once there are at least `count`
pub struct WaitForEvents<E: Event> {
    event_type: String,
    count: usize,
    _e: PhantomData<E>,
}

impl<E: Event> WaitForEvents<E> {
    pub fn new(event_type: impl Into<String>, count: usize) -> Self {
        Self {
            event_type: event_type.into(),
            count,
            _e: PhantomData,
        }
    }
}

impl<E: Event> Message for WaitForEvents<E> {
    type Result = Vec<E>;
}

/// Forget everything recorded so far and abandon outstanding takes and waits
#[derive(Message)]
#[rtype(result = "()")]
pub struct ResetHistory;

/// Error payloads of every recorded error event
pub struct GetErrors<E: ErrorEvent>(PhantomData<E>);

impl<E: ErrorEvent> GetErrors<E> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E: ErrorEvent> Default for GetErrors<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ErrorEvent> Message for GetErrors<E> {
    type Result = Vec<E::Error>;
}

type Reply<E> = oneshot::Sender<Vec<E>>;

/// Append-only record of what a bus published. Backs the audit trail and the test helpers.
pub struct HistoryCollector<E: Event> {
    events: Vec<E>,
    cursor: usize,
    takes: VecDeque<(usize, Reply<E>)>,
    waits: Vec<(String, usize, Reply<E>)>,
}

impl<E: Event> HistoryCollector<E> {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            cursor: 0,
            takes: VecDeque::new(),
            waits: Vec::new(),
        }
    }

    fn unread(&self) -> usize {
        self.events.len() - self.cursor
    }

    fn advance(&mut self, amount: usize) -> Vec<E> {
        let end = self.cursor + amount;
        let taken = self.events[self.cursor..end].to_vec();
        self.cursor = end;
        taken
    }

    fn of_type(&self, event_type: &str) -> Vec<E> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .cloned()
            .collect()
    }

    fn settle(&mut self) {
        while let Some((amount, _)) = self.takes.front() {
            if self.unread() < *amount {
                break;
            }
            if let Some((amount, reply)) = self.takes.pop_front() {
                let taken = self.advance(amount);
                let _ = reply.send(taken);
            }
        }

        let waits = std::mem::take(&mut self.waits);
        for (event_type, count, reply) in waits {
            let found = self.of_type(&event_type);
            if found.len() >= count {
                let _ = reply.send(found);
            } else {
                self.waits.push((event_type, count, reply));
            }
        }
    }
}

impl<E: Event> Default for HistoryCollector<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> Actor for HistoryCollector<E> {
    type Context = Context<Self>;
}

impl<E: Event> Handler<E> for HistoryCollector<E> {
    type Result = ();

    fn handle(&mut self, msg: E, _: &mut Self::Context) {
        self.events.push(msg);
        self.settle();
    }
}

impl<E: Event> Handler<TakeEvents<E>> for HistoryCollector<E> {
    type Result = ResponseActFuture<Self, Vec<E>>;

    fn handle(&mut self, msg: TakeEvents<E>, _: &mut Context<Self>) -> Self::Result {
        if self.takes.is_empty() && self.unread() >= msg.amount {
            let taken = self.advance(msg.amount);
            return Box::pin(async move { taken }.into_actor(self));
        }
        debug!(
            "waiting for {} events, {} unread so far",
            msg.amount,
            self.unread()
        );
        let (tx, rx) = oneshot::channel();
        self.takes.push_back((msg.amount, tx));
        Box::pin(async move { rx.await.unwrap_or_default() }.into_actor(self))
    }
}

impl<E: Event> Handler<WaitForEvents<E>> for HistoryCollector<E> {
    type Result = ResponseActFuture<Self, Vec<E>>;

    fn handle(&mut self, msg: WaitForEvents<E>, _: &mut Context<Self>) -> Self::Result {
        let found = self.of_type(&msg.event_type);
        if found.len() >= msg.count {
            return Box::pin(async move { found }.into_actor(self));
        }
        let (tx, rx) = oneshot::channel();
        self.waits.push((msg.event_type, msg.count, tx));
        Box::pin(async move { rx.await.unwrap_or_default() }.into_actor(self))
    }
}

impl<E: Event> Handler<ResetHistory> for HistoryCollector<E> {
    type Result = ();

    fn handle(&mut self, _: ResetHistory, _: &mut Context<Self>) {
        self.events.clear();
        self.cursor = 0;
        self.takes.clear();
        self.waits.clear();
    }
}

impl<E: ErrorEvent> Handler<GetErrors<E>> for HistoryCollector<E> {
    type Result = Vec<E::Error>;

    fn handle(&mut self, _: GetErrors<E>, _: &mut Context<Self>) -> Self::Result {
        self.events
            .iter()
            .filter_map(|e| e.as_error())
            .cloned()
            .collect()
    }
}
