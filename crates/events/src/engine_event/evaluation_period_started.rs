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
pub struct EvaluationPeriodStarted {
    pub period_id: PeriodId,
    pub start_time: u64,
    pub end_time: u64,
}

impl Display for EvaluationPeriodStarted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EvaluationPeriodStarted {{ period_id: {}, {}..{} }}",
            self.period_id, self.start_time, self.end_time
        )
    }
}
