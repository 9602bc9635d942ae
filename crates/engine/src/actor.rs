// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Disclosure, Engine, EngineError};
use actix::prelude::*;
use veil_disclosure::{DecryptionRequest, DecryptionResponse};
use veil_evaluation::{Evaluation, EvaluationPeriod, Leaderboard, LifecycleState, Project, Scores};
use veil_events::{Address, BusHandle, PeriodId, ProjectId, RequestId};
use veil_fhe::ExternalInput;
use veil_utils::ArcBytes;

////////////////////////////////////////////////////////////////////////////////
// Commands
////////////////////////////////////////////////////////////////////////////////

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), EngineError>")]
pub struct AuthorizeEvaluator {
    pub caller: Address,
    pub evaluator: Address,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), EngineError>")]
pub struct RevokeEvaluator {
    pub caller: Address,
    pub evaluator: Address,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<PeriodId, EngineError>")]
pub struct StartEvaluationPeriod {
    pub caller: Address,
    /// Seconds
    pub duration: u64,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<PeriodId, EngineError>")]
pub struct EndEvaluationPeriod {
    pub caller: Address,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<ProjectId, EngineError>")]
pub struct SubmitProject {
    pub caller: Address,
    pub title: String,
    pub description: String,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<u64, EngineError>")]
pub struct SubmitEvaluation {
    pub caller: Address,
    pub project_id: ProjectId,
    pub scores: Scores,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<u64, EngineError>")]
pub struct SubmitEncryptedEvaluation {
    pub caller: Address,
    pub project_id: ProjectId,
    pub inputs: [ExternalInput; 4],
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<RequestId, EngineError>")]
pub struct RequestDisclosure {
    pub caller: Address,
    pub project_id: ProjectId,
}

/// Delivered by the decryption oracle
#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<Disclosure, EngineError>")]
pub struct DecryptionCallback {
    pub request_id: RequestId,
    pub cleartext: ArcBytes,
    pub proof: ArcBytes,
}

impl From<DecryptionResponse> for DecryptionCallback {
    fn from(value: DecryptionResponse) -> Self {
        Self {
            request_id: value.request_id,
            cleartext: value.cleartext,
            proof: value.proof,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Queries
////////////////////////////////////////////////////////////////////////////////

#[derive(Message, Clone, Debug)]
#[rtype(result = "Option<Project>")]
pub struct GetProject(pub ProjectId);

#[derive(Message, Clone, Debug)]
#[rtype(result = "Option<EvaluationPeriod>")]
pub struct GetPeriod(pub PeriodId);

#[derive(Message, Clone, Debug)]
#[rtype(result = "Option<EvaluationPeriod>")]
pub struct GetActivePeriod;

#[derive(Message, Clone, Debug)]
#[rtype(result = "Option<Evaluation>")]
pub struct GetEvaluation {
    pub project_id: ProjectId,
    pub evaluator: Address,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Option<LifecycleState>")]
pub struct GetLifecycleState(pub ProjectId);

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<Leaderboard, EngineError>")]
pub struct GetLeaderboard(pub Option<PeriodId>);

#[derive(Message, Clone, Debug)]
#[rtype(result = "Vec<DecryptionRequest>")]
pub struct GetOutstandingRequests;

/// Size of the capability grant log
#[derive(Message, Clone, Debug)]
#[rtype(result = "usize")]
pub struct GetGrantCount;

////////////////////////////////////////////////////////////////////////////////
// Actor
////////////////////////////////////////////////////////////////////////////////

/// Serialises every call into the [`Engine`] and publishes what happened. Successful
/// operations publish their staged events; rejected ones publish a single
/// `OperationRejected`.
pub struct EngineActor {
    engine: Engine,
    bus: BusHandle,
}

impl EngineActor {
    pub fn new(engine: Engine, bus: BusHandle) -> Self {
        Self { engine, bus }
    }

    pub fn attach(engine: Engine, bus: &BusHandle) -> Addr<Self> {
        Self::new(engine, bus.clone()).start()
    }

    fn settle<T>(&mut self, operation: &str, result: Result<T, EngineError>) -> Result<T, EngineError> {
        for data in self.engine.drain_events() {
            self.bus.publish(data);
        }
        if let Err(err) = &result {
            self.bus.err(operation, err.kind(), err.reason());
        }
        result
    }
}

impl Actor for EngineActor {
    type Context = Context<Self>;
}

impl Handler<AuthorizeEvaluator> for EngineActor {
    type Result = Result<(), EngineError>;
    fn handle(&mut self, msg: AuthorizeEvaluator, _: &mut Self::Context) -> Self::Result {
        let res = self.engine.authorize_evaluator(msg.caller, msg.evaluator);
        self.settle("authorize_evaluator", res)
    }
}

impl Handler<RevokeEvaluator> for EngineActor {
    type Result = Result<(), EngineError>;
    fn handle(&mut self, msg: RevokeEvaluator, _: &mut Self::Context) -> Self::Result {
        let res = self.engine.revoke_evaluator(msg.caller, msg.evaluator);
        self.settle("revoke_evaluator", res)
    }
}

impl Handler<StartEvaluationPeriod> for EngineActor {
    type Result = Result<PeriodId, EngineError>;
    fn handle(&mut self, msg: StartEvaluationPeriod, _: &mut Self::Context) -> Self::Result {
        let res = self.engine.start_period(msg.caller, msg.duration);
        self.settle("start_evaluation_period", res)
    }
}

impl Handler<EndEvaluationPeriod> for EngineActor {
    type Result = Result<PeriodId, EngineError>;
    fn handle(&mut self, msg: EndEvaluationPeriod, _: &mut Self::Context) -> Self::Result {
        let res = self.engine.end_period(msg.caller);
        self.settle("end_evaluation_period", res)
    }
}

impl Handler<SubmitProject> for EngineActor {
    type Result = Result<ProjectId, EngineError>;
    fn handle(&mut self, msg: SubmitProject, _: &mut Self::Context) -> Self::Result {
        let res = self
            .engine
            .submit_project(msg.caller, msg.title, msg.description);
        self.settle("submit_project", res)
    }
}

impl Handler<SubmitEvaluation> for EngineActor {
    type Result = Result<u64, EngineError>;
    fn handle(&mut self, msg: SubmitEvaluation, _: &mut Self::Context) -> Self::Result {
        let res = self
            .engine
            .submit_evaluation(msg.caller, msg.project_id, msg.scores);
        self.settle("submit_evaluation", res)
    }
}

impl Handler<SubmitEncryptedEvaluation> for EngineActor {
    type Result = Result<u64, EngineError>;
    fn handle(&mut self, msg: SubmitEncryptedEvaluation, _: &mut Self::Context) -> Self::Result {
        let res = self
            .engine
            .submit_encrypted_evaluation(msg.caller, msg.project_id, &msg.inputs);
        self.settle("submit_encrypted_evaluation", res)
    }
}

impl Handler<RequestDisclosure> for EngineActor {
    type Result = Result<RequestId, EngineError>;
    fn handle(&mut self, msg: RequestDisclosure, _: &mut Self::Context) -> Self::Result {
        let res = self.engine.request_disclosure(msg.caller, msg.project_id);
        self.settle("request_disclosure", res)
    }
}

impl Handler<DecryptionCallback> for EngineActor {
    type Result = Result<Disclosure, EngineError>;
    fn handle(&mut self, msg: DecryptionCallback, _: &mut Self::Context) -> Self::Result {
        let res = self
            .engine
            .on_decryption_callback(msg.request_id, &msg.cleartext, &msg.proof);
        self.settle("decryption_callback", res)
    }
}

impl Handler<GetProject> for EngineActor {
    type Result = Option<Project>;
    fn handle(&mut self, msg: GetProject, _: &mut Self::Context) -> Self::Result {
        self.engine.project(msg.0).cloned()
    }
}

impl Handler<GetPeriod> for EngineActor {
    type Result = Option<EvaluationPeriod>;
    fn handle(&mut self, msg: GetPeriod, _: &mut Self::Context) -> Self::Result {
        self.engine.period(msg.0).cloned()
    }
}

impl Handler<GetActivePeriod> for EngineActor {
    type Result = Option<EvaluationPeriod>;
    fn handle(&mut self, _: GetActivePeriod, _: &mut Self::Context) -> Self::Result {
        self.engine.active_period().cloned()
    }
}

impl Handler<GetEvaluation> for EngineActor {
    type Result = Option<Evaluation>;
    fn handle(&mut self, msg: GetEvaluation, _: &mut Self::Context) -> Self::Result {
        self.engine
            .evaluation(msg.project_id, &msg.evaluator)
            .cloned()
    }
}

impl Handler<GetLifecycleState> for EngineActor {
    type Result = Option<LifecycleState>;
    fn handle(&mut self, msg: GetLifecycleState, _: &mut Self::Context) -> Self::Result {
        self.engine.lifecycle_state(msg.0)
    }
}

impl Handler<GetLeaderboard> for EngineActor {
    type Result = Result<Leaderboard, EngineError>;
    fn handle(&mut self, msg: GetLeaderboard, _: &mut Self::Context) -> Self::Result {
        self.engine.leaderboard(msg.0)
    }
}

impl Handler<GetOutstandingRequests> for EngineActor {
    type Result = Vec<DecryptionRequest>;
    fn handle(&mut self, _: GetOutstandingRequests, _: &mut Self::Context) -> Self::Result {
        self.engine.pending_requests()
    }
}

impl Handler<GetGrantCount> for EngineActor {
    type Result = usize;
    fn handle(&mut self, _: GetGrantCount, _: &mut Self::Context) -> Self::Result {
        self.engine.grants().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use veil_config::EngineConfig;
    use veil_disclosure::KeyedDigestVerifier;
    use veil_events::{
        EngineEvent, EngineEventData, ErrorKind, Event, EventBusConfig, GetErrors, TakeEvents,
    };
    use veil_fhe::SimulatedFhe;
    use veil_utils::ManualClock;

    fn start() -> (Addr<EngineActor>, BusHandle) {
        let bus = BusHandle::start(EventBusConfig::default());
        let engine = Engine::new(
            &EngineConfig::new(Address::from_low_u64(1)),
            Arc::new(SimulatedFhe::new()),
            Arc::new(KeyedDigestVerifier::new([1; 32])),
            Arc::new(ManualClock::new(0)),
        )
        .unwrap();
        (EngineActor::attach(engine, &bus), bus)
    }

    #[actix::test]
    async fn publishes_events_for_successful_operations() -> anyhow::Result<()> {
        let (engine, bus) = start();
        let history = bus.history();

        engine
            .send(AuthorizeEvaluator {
                caller: Address::from_low_u64(1),
                evaluator: Address::from_low_u64(2),
            })
            .await??;
        let project = engine
            .send(SubmitProject {
                caller: Address::from_low_u64(3),
                title: "Rainwater".to_string(),
                description: String::new(),
            })
            .await??;

        let events: Vec<EngineEvent> = history.send(TakeEvents::new(2)).await?;
        assert_eq!(events[0].event_type(), "EvaluatorAuthorized");
        match events[1].get_data() {
            EngineEventData::ProjectSubmitted(data) => assert_eq!(data.project_id, project),
            other => panic!("unexpected {}", other),
        }
        Ok(())
    }

    #[actix::test]
    async fn rejections_become_error_events() -> anyhow::Result<()> {
        let (engine, bus) = start();
        let history = bus.history();
        let errors = bus.errors();

        let err = engine
            .send(EndEvaluationPeriod {
                caller: Address::from_low_u64(1),
            })
            .await?
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
        assert_eq!(engine.send(GetGrantCount).await?, 0);
        history.send(TakeEvents::new(1)).await?;

        let errs = errors.send(GetErrors::<EngineEvent>::new()).await?;
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].operation, "end_evaluation_period");
        assert_eq!(errs[0].kind, ErrorKind::State);
        Ok(())
    }
}
