// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Dimension, ProjectStatus};
use thiserror::Error;
use veil_events::{Address, ErrorKind, PeriodId, ProjectId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("address must not be zero")]
    ZeroAddress,
    #[error("project title must not be empty")]
    EmptyTitle,
    #[error("{dimension} score {value} is outside 0..={max}")]
    ScoreOutOfRange {
        dimension: Dimension,
        value: u8,
        max: u8,
    },
    #[error("period duration must be positive and representable")]
    InvalidDuration,
    #[error("{0} is not an authorized evaluator")]
    UnauthorizedEvaluator(Address),
    #[error("{0} is already an authorized evaluator")]
    AlreadyAuthorized(Address),
    #[error("{0} is not an evaluator")]
    NotAnEvaluator(Address),
    #[error("unknown {0}")]
    UnknownProject(ProjectId),
    #[error("unknown {0}")]
    UnknownPeriod(PeriodId),
    #[error("{project} is {status}, not active")]
    ProjectNotActive {
        project: ProjectId,
        status: ProjectStatus,
    },
    #[error("{evaluator} already evaluated {project}")]
    AlreadyEvaluated {
        project: ProjectId,
        evaluator: Address,
    },
    #[error("{0} is still active")]
    PeriodAlreadyActive(PeriodId),
    #[error("there is no active evaluation period")]
    NoActivePeriod,
    #[error("{period} does not end until {ends_at}")]
    PeriodNotOver { period: PeriodId, ends_at: u64 },
    #[error("{0} has no evaluations")]
    NoEvaluations(ProjectId),
    #[error("{0} has already been disclosed")]
    AlreadyDisclosed(ProjectId),
    #[error("{0} has no outstanding disclosure")]
    DisclosureNotRequested(ProjectId),
}

impl LifecycleError {
    pub fn kind(&self) -> ErrorKind {
        use LifecycleError::*;
        match self {
            ZeroAddress | EmptyTitle | ScoreOutOfRange { .. } | InvalidDuration => {
                ErrorKind::Validation
            }
            UnauthorizedEvaluator(_) => ErrorKind::Authorization,
            _ => ErrorKind::State,
        }
    }
}
