// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{PeriodId, ProjectId, RequestId};
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct ResultDisclosed {
    pub request_id: RequestId,
    pub project_id: ProjectId,
    pub period_id: Option<PeriodId>,
    pub evaluation_count: u64,
    pub final_score: u64,
    /// Provisional rank at the time of disclosure
    pub rank: u32,
}

impl Display for ResultDisclosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ResultDisclosed {{ project_id: {}, final_score: {}, rank: {} }}",
            self.project_id, self.final_score, self.rank
        )
    }
}
