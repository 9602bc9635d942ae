// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use actix::{Actor, Addr, Recipient};
use derivative::Derivative;
use tracing::warn;

use crate::{
    EngineEvent, EngineEventData, ErrorKind, EventBus, EventBusConfig, HistoryCollector,
    OperationRejected, Subscribe,
};

/// Cheap cloneable handle used to publish engine events. Every event published through the
/// same handle (or its clones) receives the next sequence number.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct BusHandle {
    bus: Addr<EventBus<EngineEvent>>,
    #[derivative(Debug = "ignore")]
    seq: Arc<AtomicU64>,
}

impl BusHandle {
    pub fn new(bus: Addr<EventBus<EngineEvent>>) -> Self {
        Self {
            bus,
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start a fresh bus and return a handle to it
    pub fn start(config: EventBusConfig) -> Self {
        Self::new(EventBus::<EngineEvent>::new(config).start())
    }

    pub fn publish(&self, data: impl Into<EngineEventData>) -> EngineEvent {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let event = EngineEvent::new(seq, data);
        self.bus.do_send(event.clone());
        event
    }

    /// Publish a rejected operation as an error event
    pub fn err(&self, operation: &str, kind: ErrorKind, reason: impl Into<String>) -> EngineEvent {
        let rejected = OperationRejected::new(operation, kind, reason);
        warn!("{}", rejected);
        self.publish(rejected)
    }

    /// Number of events published through this handle and its clones
    pub fn published(&self) -> u64 {
        self.seq.load(Ordering::SeqCst)
    }

    pub fn history(&self) -> Addr<HistoryCollector<EngineEvent>> {
        EventBus::<EngineEvent>::history(&self.bus)
    }

    pub fn errors(&self) -> Addr<HistoryCollector<EngineEvent>> {
        EventBus::<EngineEvent>::error(&self.bus, "OperationRejected")
    }

    pub fn subscribe(&self, event_type: &str, recipient: Recipient<EngineEvent>) {
        self.bus.do_send(Subscribe::new(event_type, recipient))
    }

    pub fn bus(&self) -> &Addr<EventBus<EngineEvent>> {
        &self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Address, ErrorEvent, Event, EvaluatorAuthorized, GetErrors, TakeEvents};

    #[actix::test]
    async fn publishes_in_sequence_to_history() -> anyhow::Result<()> {
        let bus = BusHandle::start(EventBusConfig::default());
        let history = bus.history();
        let errors = bus.errors();

        bus.publish(EvaluatorAuthorized {
            evaluator: Address::from_low_u64(1),
        });
        bus.err("end_period", ErrorKind::State, "no active period");
        bus.publish(EvaluatorAuthorized {
            evaluator: Address::from_low_u64(1),
        });

        let events = history.send(TakeEvents::new(3)).await?;
        assert_eq!(bus.published(), 3);
        let seqs: Vec<u64> = events.iter().map(|e| e.seq()).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(events[1].event_type(), "OperationRejected");
        assert!(events[1].as_error().is_some());

        let errs = errors.send(GetErrors::<EngineEvent>::new()).await?;
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].operation, "end_period");
        Ok(())
    }
}
