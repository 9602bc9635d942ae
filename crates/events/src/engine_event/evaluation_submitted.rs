// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Address, ProjectId};
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct EvaluationSubmitted {
    pub project_id: ProjectId,
    pub evaluator: Address,
    /// Number of evaluations on the project including this one
    pub evaluation_count: u64,
    /// True when the scores arrived as externally encrypted inputs
    pub encrypted_input: bool,
    pub submitted_at: u64,
}

impl Display for EvaluationSubmitted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EvaluationSubmitted {{ project_id: {}, evaluator: {}, count: {} }}",
            self.project_id, self.evaluator, self.evaluation_count
        )
    }
}
