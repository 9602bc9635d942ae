// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::PeriodId;
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct EvaluationPeriodEnded {
    pub period_id: PeriodId,
    pub ended_at: u64,
    pub project_count: usize,
}

impl Display for EvaluationPeriodEnded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EvaluationPeriodEnded {{ period_id: {}, projects: {} }}",
            self.period_id, self.project_count
        )
    }
}
