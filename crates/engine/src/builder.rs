// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Engine, EngineActor, SimulatedOracle};
use actix::Addr;
use anyhow::Result;
use derivative::Derivative;
use std::sync::Arc;
use tracing::info;
use veil_config::EngineConfig;
use veil_disclosure::{KeyedDigestVerifier, SimulatedKms};
use veil_events::{BusHandle, EngineEvent, EventBusConfig, HistoryCollector};
use veil_fhe::SimulatedFhe;
use veil_logger::SimpleLogger;
use veil_utils::{SharedClock, SystemClock};

/// Wires an engine instance together with its bus, simulated back end and oracle.
/// Must be called from inside a running actix system.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct EngineBuilder {
    config: EngineConfig,
    #[derivative(Debug = "ignore")]
    clock: Option<SharedClock>,
    bus: Option<BusHandle>,
    logging: Option<String>,
    testmode_history: bool,
    testmode_errors: bool,
}

impl EngineBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            clock: None,
            bus: None,
            logging: None,
            testmode_history: false,
            testmode_errors: false,
        }
    }

    /// Defaults to the system clock
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Publish onto an existing bus instead of starting a new one
    pub fn with_bus(mut self, bus: BusHandle) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn with_logging(mut self, name: &str) -> Self {
        self.logging = Some(name.to_owned());
        self
    }

    /// Record every published event
    pub fn testmode_with_history(mut self) -> Self {
        self.testmode_history = true;
        self
    }

    /// Record every rejected operation
    pub fn testmode_with_errors(mut self) -> Self {
        self.testmode_errors = true;
        self
    }

    pub fn build(self) -> Result<EngineHandle> {
        let bus = match self.bus {
            Some(bus) => bus,
            None => BusHandle::start(EventBusConfig {
                deduplicate: self.config.deduplicate(),
            }),
        };
        let history = self.testmode_history.then(|| bus.history());
        let errors = self.testmode_errors.then(|| bus.errors());
        if let Some(name) = &self.logging {
            SimpleLogger::attach_to(name, &bus);
        }

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let fhe = Arc::new(SimulatedFhe::new());
        let verifier = KeyedDigestVerifier::new(*self.config.signing_key().as_bytes());

        let engine = Engine::new(
            &self.config,
            fhe.clone(),
            Arc::new(verifier.clone()),
            clock,
        )?;
        let engine = EngineActor::attach(engine, &bus);
        let oracle = SimulatedOracle::attach(
            &bus,
            SimulatedKms::new(fhe.clone(), verifier),
            engine.clone().recipient(),
            self.config.oracle_mode(),
        );
        info!(
            administrator = %self.config.administrator(),
            max_score = self.config.max_score(),
            "engine started"
        );

        Ok(EngineHandle {
            engine,
            oracle,
            bus,
            history,
            errors,
            fhe,
        })
    }
}

/// Everything a caller needs to drive a running engine
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct EngineHandle {
    pub engine: Addr<EngineActor>,
    pub oracle: Addr<SimulatedOracle>,
    pub bus: BusHandle,
    pub history: Option<Addr<HistoryCollector<EngineEvent>>>,
    pub errors: Option<Addr<HistoryCollector<EngineEvent>>>,
    #[derivative(Debug = "ignore")]
    pub fhe: Arc<SimulatedFhe>,
}

impl EngineHandle {
    pub fn history(&self) -> Option<Addr<HistoryCollector<EngineEvent>>> {
        self.history.clone()
    }

    pub fn errors(&self) -> Option<Addr<HistoryCollector<EngineEvent>>> {
        self.errors.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AuthorizeEvaluator, GetGrantCount};
    use veil_events::{Address, TakeEvents};

    #[actix::test]
    async fn builds_a_working_instance() -> anyhow::Result<()> {
        let admin = Address::from_low_u64(1);
        let handle = EngineBuilder::new(EngineConfig::new(admin))
            .testmode_with_history()
            .build()?;
        handle
            .engine
            .send(AuthorizeEvaluator {
                caller: admin,
                evaluator: Address::from_low_u64(2),
            })
            .await??;
        assert_eq!(handle.engine.send(GetGrantCount).await?, 0);

        let history = handle.history().ok_or_else(|| anyhow::anyhow!("no history"))?;
        let events = history.send(TakeEvents::new(1)).await?;
        assert_eq!(events.len(), 1);
        assert!(handle.errors().is_none());
        Ok(())
    }
}
