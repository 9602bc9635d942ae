// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::ADMIN;
use actix::Addr;
use anyhow::*;
use std::{ops::Deref, sync::Arc, time::Duration};
use tokio::time::timeout;
use veil_config::{EngineConfig, OracleMode};
use veil_engine::{
    AuthorizeEvaluator, DecryptionCallback, Disclosure, EngineActor, EngineBuilder, EngineError,
    EngineHandle, GetPendingRequests, GetProject, RequestDisclosure, SimulatedOracle,
    SubmitEvaluation, SubmitProject, TakeResponse, SCORE_TYPE,
};
use veil_disclosure::DecryptionResponse;
use veil_evaluation::{Project, Scores};
use veil_events::{
    Address, BusHandle, EngineEvent, Event, GetErrors, OperationRejected, ProjectId, RequestId,
    ResetHistory, TakeEvents, WaitForEvents,
};
use veil_fhe::{ExternalInput, SimulatedFhe};
use veil_utils::ManualClock;

const DEFAULT_TIMEOUT: Duration = Duration::from_millis(4000);

/// Builds a complete engine on a manual clock for scenario tests
/// ```ignore
/// let system = EngineSystemBuilder::new()
///     .with_oracle_mode(OracleMode::Manual)
///     .build()?;
/// system.authorize(&[evaluator(1), evaluator(2)]).await?;
/// ```
pub struct EngineSystemBuilder {
    config: EngineConfig,
    start_time: u64,
    logging: Option<String>,
}

impl Default for EngineSystemBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineSystemBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::new(ADMIN),
            start_time: 1_700_000_000,
            logging: None,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_max_score(mut self, max_score: u8) -> Self {
        self.config = self.config.with_max_score(max_score);
        self
    }

    pub fn with_oracle_mode(mut self, mode: OracleMode) -> Self {
        self.config = self.config.with_oracle_mode(mode);
        self
    }

    pub fn starting_at(mut self, start_time: u64) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn with_logging(mut self, name: &str) -> Self {
        self.logging = Some(name.to_owned());
        self
    }

    pub fn build(self) -> Result<EngineSystem> {
        let clock = ManualClock::new(self.start_time);
        let admin = self.config.administrator();
        let mut builder = EngineBuilder::new(self.config)
            .with_clock(Arc::new(clock.clone()))
            .testmode_with_history()
            .testmode_with_errors();
        if let Some(name) = &self.logging {
            builder = builder.with_logging(name);
        }
        Ok(EngineSystem {
            handle: builder.build()?,
            clock,
            admin,
        })
    }
}

pub struct EngineSystem {
    handle: EngineHandle,
    clock: ManualClock,
    admin: Address,
}

impl EngineSystem {
    pub fn engine(&self) -> &Addr<EngineActor> {
        &self.handle.engine
    }

    pub fn oracle(&self) -> &Addr<SimulatedOracle> {
        &self.handle.oracle
    }

    pub fn bus(&self) -> &BusHandle {
        &self.handle.bus
    }

    pub fn fhe(&self) -> &Arc<SimulatedFhe> {
        &self.handle.fhe
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    /// Move the clock forward and return the new time
    pub fn advance(&self, secs: u64) -> u64 {
        self.clock.advance(secs)
    }

    pub async fn take_history(&self, count: usize) -> Result<EngineHistory> {
        self.take_history_with_timeout(count, DEFAULT_TIMEOUT).await
    }

    pub async fn take_history_with_timeout(
        &self,
        count: usize,
        tout: Duration,
    ) -> Result<EngineHistory> {
        let Some(history) = self.handle.history() else {
            bail!("history was not recorded");
        };
        let events = timeout(tout, history.send(TakeEvents::new(count)))
            .await
            .context(format!("Could not take {} events", count))??;
        Ok(EngineHistory(events))
    }

    /// Wait until `count` events of `event_type` have been recorded
    pub async fn wait_for(&self, event_type: &str, count: usize) -> Result<EngineHistory> {
        let Some(history) = self.handle.history() else {
            bail!("history was not recorded");
        };
        let events = timeout(
            DEFAULT_TIMEOUT,
            history.send(WaitForEvents::new(event_type, count)),
        )
        .await
        .context(format!("Timed out waiting for {} x {}", count, event_type))??;
        Ok(EngineHistory(events))
    }

    pub async fn reset_history(&self) -> Result<()> {
        if let Some(history) = self.handle.history() {
            history.send(ResetHistory).await?;
        }
        Ok(())
    }

    /// Wait for `count` rejections, then return every rejection recorded so far
    pub async fn errors(&self, count: usize) -> Result<Vec<OperationRejected>> {
        self.wait_for("OperationRejected", count).await?;
        let Some(errors) = self.handle.errors() else {
            bail!("errors were not recorded");
        };
        Ok(errors.send(GetErrors::<EngineEvent>::new()).await?)
    }

    pub async fn authorize(&self, evaluators: &[Address]) -> Result<()> {
        for evaluator in evaluators {
            self.engine()
                .send(AuthorizeEvaluator {
                    caller: self.admin,
                    evaluator: *evaluator,
                })
                .await??;
        }
        Ok(())
    }

    pub async fn submit_project(&self, submitter: Address, title: &str) -> Result<ProjectId> {
        Ok(self
            .engine()
            .send(SubmitProject {
                caller: submitter,
                title: title.to_owned(),
                description: format!("{} description", title),
            })
            .await??)
    }

    pub async fn evaluate(
        &self,
        evaluator: Address,
        project_id: ProjectId,
        scores: Scores,
    ) -> Result<u64> {
        Ok(self
            .engine()
            .send(SubmitEvaluation {
                caller: evaluator,
                project_id,
                scores,
            })
            .await??)
    }

    pub async fn request_disclosure(&self, project_id: ProjectId) -> Result<RequestId> {
        Ok(self
            .engine()
            .send(RequestDisclosure {
                caller: self.admin,
                project_id,
            })
            .await??)
    }

    pub async fn project(&self, project_id: ProjectId) -> Result<Project> {
        self.engine()
            .send(GetProject(project_id))
            .await?
            .ok_or_else(|| anyhow!("no such project {}", project_id))
    }

    /// Wait until the oracle holds `request_id`, then take its signed answer without
    /// delivering it
    pub async fn held_response(&self, request_id: RequestId) -> Result<DecryptionResponse> {
        let oracle = self.oracle().clone();
        timeout(DEFAULT_TIMEOUT, async move {
            loop {
                if oracle.send(GetPendingRequests).await?.contains(&request_id) {
                    return std::result::Result::Ok::<_, anyhow::Error>(oracle.send(TakeResponse(request_id)).await??);
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .context(format!("Oracle never saw {}", request_id))?
    }

    /// Deliver a callback to the engine as the oracle would
    pub async fn deliver(
        &self,
        response: DecryptionResponse,
    ) -> Result<std::result::Result<Disclosure, EngineError>> {
        Ok(self
            .engine()
            .send(DecryptionCallback::from(response))
            .await?)
    }

    /// Client side encryption of four score dimensions bound to `owner`
    pub fn encrypt_scores(&self, owner: Address, values: [u64; 4]) -> Result<[ExternalInput; 4]> {
        let mut inputs = Vec::with_capacity(values.len());
        for value in values {
            inputs.push(self.fhe().encrypt_input(value, SCORE_TYPE, &owner)?);
        }
        inputs
            .try_into()
            .map_err(|_| anyhow!("expected four encrypted scores"))
    }
}

#[derive(Debug, Clone)]
pub struct EngineHistory(Vec<EngineEvent>);

impl EngineHistory {
    pub fn filter_by_event_type(&self, event_type: &str) -> Vec<EngineEvent> {
        self.0
            .iter()
            .filter(|e| e.event_type() == event_type)
            .cloned()
            .collect()
    }

    pub fn event_types(&self) -> Vec<String> {
        self.0.iter().map(|e| e.event_type().to_string()).collect()
    }
}

impl Deref for EngineHistory {
    type Target = Vec<EngineEvent>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
