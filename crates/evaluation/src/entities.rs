// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::DIMENSIONS;
use serde::Serialize;
use std::fmt;
use veil_acl::AllowedHandle;
use veil_events::{Address, OrderedSet, PeriodId, ProjectId, RequestId};

/// Stored status of a project
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ProjectStatus {
    Active,
    DisclosureRequested,
    Disclosed,
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectStatus::Active => write!(f, "active"),
            ProjectStatus::DisclosureRequested => write!(f, "awaiting disclosure"),
            ProjectStatus::Disclosed => write!(f, "disclosed"),
        }
    }
}

/// Lifecycle state as reported to readers. `PeriodClosed` is derived from an active project
/// whose bound period has ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum LifecycleState {
    Active,
    PeriodClosed,
    DisclosureRequested,
    Disclosed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub description: String,
    pub submitter: Address,
    pub status: ProjectStatus,
    pub created_at: u64,
    pub period_id: Option<PeriodId>,
    pub evaluation_count: u64,
    /// Running encrypted sum of every evaluator total
    pub aggregate: AllowedHandle,
    pub pending_request: Option<RequestId>,
    pub disclosed_score: Option<u64>,
    /// Provisional rank fixed at disclosure
    pub rank: Option<u32>,
}

impl Project {
    pub fn is_active(&self) -> bool {
        self.status == ProjectStatus::Active
    }

    pub fn is_disclosed(&self) -> bool {
        self.status == ProjectStatus::Disclosed
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EvaluationPeriod {
    pub id: PeriodId,
    pub start_time: u64,
    pub end_time: u64,
    pub active: bool,
    pub ended_at: Option<u64>,
    pub projects: OrderedSet<ProjectId>,
}

impl EvaluationPeriod {
    pub fn has_elapsed(&self, now: u64) -> bool {
        now >= self.end_time
    }
}

/// One evaluator's submission for one project. Never mutated once recorded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub project_id: ProjectId,
    pub evaluator: Address,
    pub dimensions: [AllowedHandle; DIMENSIONS],
    /// Sum of the widened dimensions. Only the evaluator may decrypt it.
    pub total: AllowedHandle,
    pub submitted: bool,
    pub submitted_at: u64,
    pub encrypted_input: bool,
}
