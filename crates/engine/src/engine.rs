// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Administrator, EngineError};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use veil_acl::{Acl, AllowedHandle, CapabilityGrant, Principal};
use veil_config::EngineConfig;
use veil_disclosure::{DecryptionRequest, DisclosureProtocol, ProofVerifier};
use veil_evaluation::{
    Evaluation, EvaluationPeriod, EvaluationRegistry, Leaderboard, LifecycleState, Project,
    ProjectStatus, Scores, DIMENSIONS,
};
use veil_events::{
    Address, DisclosureRequested, EngineEventData, EvaluationPeriodEnded,
    EvaluationPeriodStarted, EvaluationSubmitted, EvaluatorAuthorized, EvaluatorRevoked, FheType,
    PeriodId, ProjectId, ProjectSubmitted, RequestId, ResultDisclosed,
};
use veil_fhe::{Arithmetic, ExternalInput, SharedBackend};
use veil_utils::SharedClock;

/// Width of a single score dimension
pub const SCORE_TYPE: FheType = FheType::U8;
/// Width of evaluator totals and project aggregates
pub const AGGREGATE_TYPE: FheType = FheType::U32;

/// Outcome of a verified decryption callback
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Disclosure {
    pub request_id: RequestId,
    pub project_id: ProjectId,
    pub final_score: u64,
    pub rank: u32,
}

/// The hosting program. Every public operation is all-or-nothing: on error no state, grant or
/// event it produced survives.
///
/// Events describing successful transitions are staged and handed out by
/// [`Engine::drain_events`].
pub struct Engine {
    administrator: Administrator,
    max_score: u8,
    clock: SharedClock,
    acl: Acl,
    arith: Arithmetic,
    registry: EvaluationRegistry,
    disclosure: DisclosureProtocol,
    verifier: Arc<dyn ProofVerifier>,
    staged: Vec<EngineEventData>,
}

impl Engine {
    pub fn new(
        config: &EngineConfig,
        backend: SharedBackend,
        verifier: Arc<dyn ProofVerifier>,
        clock: SharedClock,
    ) -> Result<Self, EngineError> {
        let max_score = config.max_score();
        if max_score == 0 {
            return Err(EngineError::Validation(
                "maximum score must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            administrator: Administrator::new(config.administrator())?,
            max_score,
            clock,
            acl: Acl::new(),
            arith: Arithmetic::new(backend),
            registry: EvaluationRegistry::new(),
            disclosure: DisclosureProtocol::new(),
            verifier,
            staged: Vec::new(),
        })
    }

    fn now(&self) -> u64 {
        self.clock.now()
    }

    fn stage(&mut self, data: impl Into<EngineEventData>) {
        self.staged.push(data.into());
    }

    /// Run `op`, undoing its grants and staged events if it fails
    fn atomically<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let checkpoint = self.acl.checkpoint();
        let staged = self.staged.len();
        let result = op(self);
        if result.is_err() {
            self.acl.rollback(checkpoint);
            self.staged.truncate(staged);
        }
        result
    }

    /// Hand out the events of every operation completed since the last drain
    pub fn drain_events(&mut self) -> Vec<EngineEventData> {
        std::mem::take(&mut self.staged)
    }

    ////////////////////////////////////////////////////////////////////////////
    // Administration
    ////////////////////////////////////////////////////////////////////////////

    pub fn authorize_evaluator(
        &mut self,
        caller: Address,
        evaluator: Address,
    ) -> Result<(), EngineError> {
        self.atomically(|engine| {
            engine
                .administrator
                .authorize(&caller, "authorize evaluators")?;
            engine.registry.authorize_evaluator(evaluator)?;
            engine.stage(EvaluatorAuthorized { evaluator });
            Ok(())
        })
    }

    pub fn revoke_evaluator(
        &mut self,
        caller: Address,
        evaluator: Address,
    ) -> Result<(), EngineError> {
        self.atomically(|engine| {
            engine
                .administrator
                .authorize(&caller, "revoke evaluators")?;
            engine.registry.revoke_evaluator(evaluator)?;
            engine.stage(EvaluatorRevoked { evaluator });
            Ok(())
        })
    }

    pub fn start_period(&mut self, caller: Address, duration: u64) -> Result<PeriodId, EngineError> {
        self.atomically(|engine| {
            engine
                .administrator
                .authorize(&caller, "start evaluation periods")?;
            let now = engine.now();
            let period = engine.registry.start_period(now, duration)?;
            let started = EvaluationPeriodStarted {
                period_id: period.id,
                start_time: period.start_time,
                end_time: period.end_time,
            };
            engine.stage(started.clone());
            Ok(started.period_id)
        })
    }

    pub fn end_period(&mut self, caller: Address) -> Result<PeriodId, EngineError> {
        self.atomically(|engine| {
            engine
                .administrator
                .authorize(&caller, "end evaluation periods")?;
            let now = engine.now();
            let period = engine.registry.end_period(now)?;
            let ended = EvaluationPeriodEnded {
                period_id: period.id,
                ended_at: now,
                project_count: period.projects.len(),
            };
            engine.stage(ended.clone());
            Ok(ended.period_id)
        })
    }

    ////////////////////////////////////////////////////////////////////////////
    // Submission
    ////////////////////////////////////////////////////////////////////////////

    pub fn submit_project(
        &mut self,
        caller: Address,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<ProjectId, EngineError> {
        let title = title.into();
        let description = description.into();
        self.atomically(|engine| {
            engine.registry.check_project_submission(&caller, &title)?;
            let aggregate = engine
                .arith
                .encrypt(0, AGGREGATE_TYPE)?
                .grant(&mut engine.acl, Principal::Host);
            let now = engine.now();
            let project =
                engine
                    .registry
                    .insert_project(caller, title, description, now, aggregate);
            let submitted = ProjectSubmitted {
                project_id: project.id,
                submitter: project.submitter,
                title: project.title.clone(),
                period_id: project.period_id,
                created_at: project.created_at,
            };
            engine.stage(submitted.clone());
            Ok(submitted.project_id)
        })
    }

    /// Submit plaintext scores which are encrypted on arrival. Returns the project's new
    /// evaluation count.
    pub fn submit_evaluation(
        &mut self,
        caller: Address,
        project_id: ProjectId,
        scores: Scores,
    ) -> Result<u64, EngineError> {
        self.atomically(|engine| {
            engine.require_evaluator(&caller)?;
            scores.validate(engine.max_score)?;
            engine.registry.check_evaluation(project_id, &caller)?;

            let originator = Principal::Account(caller);
            let mut dimensions = Vec::with_capacity(DIMENSIONS);
            for value in scores.values() {
                let handle = engine
                    .arith
                    .encrypt(value as u64, SCORE_TYPE)?
                    .grant(&mut engine.acl, originator);
                dimensions.push(handle);
            }
            engine.record(caller, project_id, dimensions, false)
        })
    }

    /// Submit externally encrypted scores. Each input proof is verified before use and every
    /// dimension is clamped to the maximum score without decrypting it.
    pub fn submit_encrypted_evaluation(
        &mut self,
        caller: Address,
        project_id: ProjectId,
        inputs: &[ExternalInput; DIMENSIONS],
    ) -> Result<u64, EngineError> {
        self.atomically(|engine| {
            engine.require_evaluator(&caller)?;
            engine.registry.check_evaluation(project_id, &caller)?;

            let originator = Principal::Account(caller);
            let max = engine
                .arith
                .encrypt(engine.max_score as u64, SCORE_TYPE)?
                .grant(&mut engine.acl, Principal::Host);
            let mut dimensions = Vec::with_capacity(DIMENSIONS);
            for input in inputs {
                if input.handle.fhe_type() != SCORE_TYPE {
                    return Err(EngineError::Validation(format!(
                        "encrypted scores must be {}, got {}",
                        SCORE_TYPE,
                        input.handle.fhe_type()
                    )));
                }
                let score = engine
                    .arith
                    .ingest(input, &caller)?
                    .grant(&mut engine.acl, originator);
                let over = engine
                    .arith
                    .gt(&engine.acl, &score, &max)?
                    .grant(&mut engine.acl, originator);
                let clamped = engine
                    .arith
                    .select(&engine.acl, &over, &max, &score)?
                    .grant(&mut engine.acl, originator);
                dimensions.push(clamped);
            }
            engine.record(caller, project_id, dimensions, true)
        })
    }

    fn require_evaluator(&self, caller: &Address) -> Result<(), EngineError> {
        if self.registry.is_evaluator(caller) {
            return Ok(());
        }
        Err(EngineError::Authorization(format!(
            "{} is not an authorized evaluator",
            caller
        )))
    }

    /// Widen and sum the dimensions, fold the total into the project aggregate and store the
    /// evaluation
    fn record(
        &mut self,
        caller: Address,
        project_id: ProjectId,
        dimensions: Vec<AllowedHandle>,
        encrypted_input: bool,
    ) -> Result<u64, EngineError> {
        let originator = Principal::Account(caller);
        let aggregate = self.registry.check_evaluation(project_id, &caller)?.aggregate;

        let mut total: Option<AllowedHandle> = None;
        for dimension in &dimensions {
            let wide = self
                .arith
                .widen(&self.acl, dimension, AGGREGATE_TYPE)?
                .grant(&mut self.acl, originator);
            total = Some(match total {
                None => wide,
                Some(sum) => self
                    .arith
                    .add(&self.acl, &sum, &wide)?
                    .grant(&mut self.acl, originator),
            });
        }
        let total = total.ok_or_else(|| {
            EngineError::Validation("an evaluation needs at least one dimension".to_string())
        })?;
        let dimensions: [AllowedHandle; DIMENSIONS] = dimensions.try_into().map_err(|d: Vec<_>| {
            EngineError::Validation(format!("expected {} dimensions, got {}", DIMENSIONS, d.len()))
        })?;

        let new_aggregate = self
            .arith
            .add(&self.acl, &aggregate, &total)?
            .grant(&mut self.acl, Principal::Host);

        let now = self.now();
        let count = self.registry.record_evaluation(
            Evaluation {
                project_id,
                evaluator: caller,
                dimensions,
                total,
                submitted: true,
                submitted_at: now,
                encrypted_input,
            },
            new_aggregate,
        )?;
        self.stage(EvaluationSubmitted {
            project_id,
            evaluator: caller,
            evaluation_count: count,
            encrypted_input,
            submitted_at: now,
        });
        Ok(count)
    }

    ////////////////////////////////////////////////////////////////////////////
    // Disclosure
    ////////////////////////////////////////////////////////////////////////////

    /// Request phase. Asking again for a project that is still awaiting its callback issues a
    /// fresh request which replaces the outstanding one.
    pub fn request_disclosure(
        &mut self,
        caller: Address,
        project_id: ProjectId,
    ) -> Result<RequestId, EngineError> {
        self.atomically(|engine| {
            engine
                .administrator
                .authorize(&caller, "request disclosure")?;
            let aggregate = engine.registry.check_disclosure(project_id)?.aggregate;
            let now = engine.now();
            let (request, superseded) =
                engine
                    .disclosure
                    .issue(&engine.acl, project_id, &[aggregate], now)?;
            engine
                .registry
                .mark_disclosure_requested(project_id, request.id)?;
            engine.stage(DisclosureRequested {
                request_id: request.id,
                project_id,
                handles: request.handles.clone(),
                supersedes: superseded,
            });
            Ok(request.id)
        })
    }

    /// Callback phase. Nothing is trusted until the proof verifies; a failure leaves the
    /// request outstanding.
    pub fn on_decryption_callback(
        &mut self,
        request_id: RequestId,
        cleartext: &[u8],
        proof: &[u8],
    ) -> Result<Disclosure, EngineError> {
        self.atomically(|engine| {
            let verified =
                engine
                    .disclosure
                    .verify(engine.verifier.as_ref(), request_id, cleartext, proof)?;
            let project_id = verified.request.project_id;
            let project = engine
                .registry
                .project(project_id)
                .ok_or_else(|| EngineError::State(format!("unknown {}", project_id)))?;
            if project.status != ProjectStatus::DisclosureRequested {
                return Err(EngineError::State(format!(
                    "{} is {}, not awaiting disclosure",
                    project_id, project.status
                )));
            }
            let aggregate = verified.values.first().copied().ok_or_else(|| {
                EngineError::Validation(format!("{} carried no value", request_id))
            })?;
            let final_score = aggregate
                .checked_div(project.evaluation_count)
                .ok_or_else(|| EngineError::State(format!("{} has no evaluations", project_id)))?;
            let evaluation_count = project.evaluation_count;
            let period_id = project.period_id;

            let rank = engine.registry.provisional_rank(project_id, final_score)?;
            engine
                .registry
                .mark_disclosed(project_id, final_score, rank)?;
            engine.disclosure.consume(request_id)?;
            info!(project = %project_id, final_score, rank, "disclosure complete");

            engine.stage(ResultDisclosed {
                request_id,
                project_id,
                period_id,
                evaluation_count,
                final_score,
                rank,
            });
            Ok(Disclosure {
                request_id,
                project_id,
                final_score,
                rank,
            })
        })
    }

    ////////////////////////////////////////////////////////////////////////////
    // Reads
    ////////////////////////////////////////////////////////////////////////////

    pub fn administrator(&self) -> Address {
        self.administrator.address()
    }

    pub fn max_score(&self) -> u8 {
        self.max_score
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.registry.project(id)
    }

    pub fn period(&self, id: PeriodId) -> Option<&EvaluationPeriod> {
        self.registry.period(id)
    }

    pub fn active_period(&self) -> Option<&EvaluationPeriod> {
        self.registry.active_period()
    }

    pub fn evaluation(&self, project: ProjectId, evaluator: &Address) -> Option<&Evaluation> {
        self.registry.evaluation(project, evaluator)
    }

    pub fn is_evaluator(&self, address: &Address) -> bool {
        self.registry.is_evaluator(address)
    }

    pub fn lifecycle_state(&self, id: ProjectId) -> Option<LifecycleState> {
        self.registry.lifecycle_state(id, self.now())
    }

    pub fn leaderboard(&self, period: Option<PeriodId>) -> Result<Leaderboard, EngineError> {
        Ok(self.registry.leaderboard(period)?)
    }

    pub fn pending_requests(&self) -> Vec<DecryptionRequest> {
        self.disclosure.pending().cloned().collect()
    }

    pub fn grants(&self) -> &[CapabilityGrant] {
        self.acl.grants()
    }

    pub fn acl(&self) -> &Acl {
        &self.acl
    }
}
