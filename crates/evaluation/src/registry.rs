// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{
    rank_against, Evaluation, EvaluationPeriod, Leaderboard, LifecycleError, LifecycleState,
    Project, ProjectStatus,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;
use veil_acl::AllowedHandle;
use veil_events::{Address, OrderedSet, PeriodId, ProjectId, RequestId};

/// Holds every project, period and evaluation and owns the rules for moving between states.
///
/// Checks (`check_*`) never mutate. Mutations assume the matching check already passed in the
/// same operation.
#[derive(Debug, Default)]
pub struct EvaluationRegistry {
    projects: BTreeMap<ProjectId, Project>,
    periods: BTreeMap<PeriodId, EvaluationPeriod>,
    evaluations: BTreeMap<(ProjectId, Address), Evaluation>,
    evaluators: BTreeSet<Address>,
    active_period: Option<PeriodId>,
    last_project: u64,
    last_period: u64,
}

impl EvaluationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    ////////////////////////////////////////////////////////////////////////////
    // Evaluators
    ////////////////////////////////////////////////////////////////////////////

    pub fn is_evaluator(&self, address: &Address) -> bool {
        self.evaluators.contains(address)
    }

    pub fn evaluators(&self) -> impl Iterator<Item = &Address> {
        self.evaluators.iter()
    }

    pub fn authorize_evaluator(&mut self, evaluator: Address) -> Result<(), LifecycleError> {
        if evaluator.is_zero() {
            return Err(LifecycleError::ZeroAddress);
        }
        if !self.evaluators.insert(evaluator) {
            return Err(LifecycleError::AlreadyAuthorized(evaluator));
        }
        info!(evaluator = %evaluator, "evaluator authorized");
        Ok(())
    }

    /// Submitted evaluations stay where they are
    pub fn revoke_evaluator(&mut self, evaluator: Address) -> Result<(), LifecycleError> {
        if evaluator.is_zero() {
            return Err(LifecycleError::ZeroAddress);
        }
        if !self.evaluators.remove(&evaluator) {
            return Err(LifecycleError::NotAnEvaluator(evaluator));
        }
        info!(evaluator = %evaluator, "evaluator revoked");
        Ok(())
    }

    ////////////////////////////////////////////////////////////////////////////
    // Periods
    ////////////////////////////////////////////////////////////////////////////

    pub fn active_period(&self) -> Option<&EvaluationPeriod> {
        self.active_period.and_then(|id| self.periods.get(&id))
    }

    pub fn period(&self, id: PeriodId) -> Option<&EvaluationPeriod> {
        self.periods.get(&id)
    }

    pub fn start_period(
        &mut self,
        now: u64,
        duration: u64,
    ) -> Result<&EvaluationPeriod, LifecycleError> {
        if duration == 0 {
            return Err(LifecycleError::InvalidDuration);
        }
        let end_time = now
            .checked_add(duration)
            .ok_or(LifecycleError::InvalidDuration)?;
        if let Some(active) = self.active_period {
            return Err(LifecycleError::PeriodAlreadyActive(active));
        }

        self.last_period += 1;
        let id = PeriodId::new(self.last_period);
        self.active_period = Some(id);
        info!(period = %id, start = now, end = end_time, "evaluation period started");
        let period = self.periods.entry(id).or_insert(EvaluationPeriod {
            id,
            start_time: now,
            end_time,
            active: true,
            ended_at: None,
            projects: OrderedSet::new(),
        });
        Ok(&*period)
    }

    /// Closes the period without touching any project in it
    pub fn end_period(&mut self, now: u64) -> Result<&EvaluationPeriod, LifecycleError> {
        let id = self.active_period.ok_or(LifecycleError::NoActivePeriod)?;
        let period = self
            .periods
            .get_mut(&id)
            .ok_or(LifecycleError::UnknownPeriod(id))?;
        if !period.has_elapsed(now) {
            return Err(LifecycleError::PeriodNotOver {
                period: id,
                ends_at: period.end_time,
            });
        }

        period.active = false;
        period.ended_at = Some(now);
        self.active_period = None;
        info!(period = %id, projects = period.projects.len(), "evaluation period ended");
        Ok(&*period)
    }

    ////////////////////////////////////////////////////////////////////////////
    // Projects
    ////////////////////////////////////////////////////////////////////////////

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.get(&id)
    }

    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    pub fn check_project_submission(
        &self,
        submitter: &Address,
        title: &str,
    ) -> Result<(), LifecycleError> {
        if submitter.is_zero() {
            return Err(LifecycleError::ZeroAddress);
        }
        if title.trim().is_empty() {
            return Err(LifecycleError::EmptyTitle);
        }
        Ok(())
    }

    /// Create a project in `Active`, bound to the active period if there is one
    pub fn insert_project(
        &mut self,
        submitter: Address,
        title: String,
        description: String,
        now: u64,
        aggregate: AllowedHandle,
    ) -> &Project {
        self.last_project += 1;
        let id = ProjectId::new(self.last_project);
        let period_id = self.active_period;
        if let Some(period) = period_id.and_then(|p| self.periods.get_mut(&p)) {
            period.projects.insert(id);
        }
        info!(project = %id, submitter = %submitter, period = ?period_id, "project submitted");
        self.projects.entry(id).or_insert(Project {
            id,
            title,
            description,
            submitter,
            status: ProjectStatus::Active,
            created_at: now,
            period_id,
            evaluation_count: 0,
            aggregate,
            pending_request: None,
            disclosed_score: None,
            rank: None,
        })
    }

    pub fn lifecycle_state(&self, id: ProjectId, now: u64) -> Option<LifecycleState> {
        let project = self.projects.get(&id)?;
        Some(match project.status {
            ProjectStatus::Active => {
                let closed = project
                    .period_id
                    .and_then(|p| self.periods.get(&p))
                    .map(|p| !p.active || p.has_elapsed(now))
                    .unwrap_or(false);
                if closed {
                    LifecycleState::PeriodClosed
                } else {
                    LifecycleState::Active
                }
            }
            ProjectStatus::DisclosureRequested => LifecycleState::DisclosureRequested,
            ProjectStatus::Disclosed => LifecycleState::Disclosed,
        })
    }

    ////////////////////////////////////////////////////////////////////////////
    // Evaluations
    ////////////////////////////////////////////////////////////////////////////

    pub fn evaluation(&self, project: ProjectId, evaluator: &Address) -> Option<&Evaluation> {
        self.evaluations.get(&(project, *evaluator))
    }

    /// Everything except score ranges, which depend on how the scores arrive
    pub fn check_evaluation(
        &self,
        project: ProjectId,
        evaluator: &Address,
    ) -> Result<&Project, LifecycleError> {
        if !self.is_evaluator(evaluator) {
            return Err(LifecycleError::UnauthorizedEvaluator(*evaluator));
        }
        let found = self
            .projects
            .get(&project)
            .ok_or(LifecycleError::UnknownProject(project))?;
        if !found.is_active() {
            return Err(LifecycleError::ProjectNotActive {
                project,
                status: found.status,
            });
        }
        if self.evaluations.contains_key(&(project, *evaluator)) {
            return Err(LifecycleError::AlreadyEvaluated {
                project,
                evaluator: *evaluator,
            });
        }
        Ok(found)
    }

    /// Store the evaluation and the new aggregate. Returns the new evaluation count.
    pub fn record_evaluation(
        &mut self,
        evaluation: Evaluation,
        aggregate: AllowedHandle,
    ) -> Result<u64, LifecycleError> {
        let key = (evaluation.project_id, evaluation.evaluator);
        let project = self
            .projects
            .get_mut(&evaluation.project_id)
            .ok_or(LifecycleError::UnknownProject(evaluation.project_id))?;
        project.aggregate = aggregate;
        project.evaluation_count += 1;
        let count = project.evaluation_count;
        info!(project = %key.0, evaluator = %key.1, count, "evaluation recorded");
        self.evaluations.entry(key).or_insert(evaluation);
        Ok(count)
    }

    ////////////////////////////////////////////////////////////////////////////
    // Disclosure
    ////////////////////////////////////////////////////////////////////////////

    /// A project awaiting disclosure may be asked again; the new request replaces the old one
    pub fn check_disclosure(&self, project: ProjectId) -> Result<&Project, LifecycleError> {
        let found = self
            .projects
            .get(&project)
            .ok_or(LifecycleError::UnknownProject(project))?;
        if found.is_disclosed() {
            return Err(LifecycleError::AlreadyDisclosed(project));
        }
        if found.evaluation_count == 0 {
            return Err(LifecycleError::NoEvaluations(project));
        }
        Ok(found)
    }

    /// Returns the request this one supersedes, if any
    pub fn mark_disclosure_requested(
        &mut self,
        project: ProjectId,
        request: RequestId,
    ) -> Result<Option<RequestId>, LifecycleError> {
        let found = self
            .projects
            .get_mut(&project)
            .ok_or(LifecycleError::UnknownProject(project))?;
        found.status = ProjectStatus::DisclosureRequested;
        Ok(found.pending_request.replace(request))
    }

    /// Rank a freshly decrypted score against the project's cohort
    pub fn provisional_rank(&self, project: ProjectId, score: u64) -> Result<u32, LifecycleError> {
        let found = self
            .projects
            .get(&project)
            .ok_or(LifecycleError::UnknownProject(project))?;
        let others = self
            .cohort(found.period_id)
            .filter(|p| p.id != project)
            .filter_map(|p| p.disclosed_score);
        Ok(rank_against(score, others))
    }

    pub fn mark_disclosed(
        &mut self,
        project: ProjectId,
        score: u64,
        rank: u32,
    ) -> Result<&Project, LifecycleError> {
        let found = self
            .projects
            .get_mut(&project)
            .ok_or(LifecycleError::UnknownProject(project))?;
        if found.status != ProjectStatus::DisclosureRequested {
            return Err(LifecycleError::DisclosureNotRequested(project));
        }
        found.status = ProjectStatus::Disclosed;
        found.pending_request = None;
        found.disclosed_score = Some(score);
        found.rank = Some(rank);
        info!(project = %project, score, rank, "result disclosed");
        Ok(&*found)
    }

    /// Projects ranked together: those bound to `period`, or all unbound projects
    fn cohort(&self, period: Option<PeriodId>) -> impl Iterator<Item = &Project> {
        self.projects
            .values()
            .filter(move |p| p.period_id == period)
    }

    pub fn leaderboard(&self, period: Option<PeriodId>) -> Result<Leaderboard, LifecycleError> {
        if let Some(id) = period {
            if !self.periods.contains_key(&id) {
                return Err(LifecycleError::UnknownPeriod(id));
            }
        }
        let disclosed = self.cohort(period).filter_map(|p| match (p.disclosed_score, p.rank) {
            (Some(score), Some(rank)) => Some((p.id, score, rank)),
            _ => None,
        });
        Ok(Leaderboard::build(period, disclosed))
    }
}
