// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Address, PeriodId, ProjectId};
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct ProjectSubmitted {
    pub project_id: ProjectId,
    pub submitter: Address,
    pub title: String,
    /// The period the project is permanently bound to, if one was active
    pub period_id: Option<PeriodId>,
    pub created_at: u64,
}

impl Display for ProjectSubmitted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ProjectSubmitted {{ project_id: {}, submitter: {}, period_id: {:?} }}",
            self.project_id, self.submitter, self.period_id
        )
    }
}
