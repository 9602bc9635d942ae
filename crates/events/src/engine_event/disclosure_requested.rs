// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{EncryptedHandle, ProjectId, RequestId};
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Emitted in the request phase of a disclosure. The decryption oracle listens for this event
/// and answers with a callback carrying the same request id.
#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct DisclosureRequested {
    pub request_id: RequestId,
    pub project_id: ProjectId,
    pub handles: Vec<EncryptedHandle>,
    /// A previous outstanding request for the same project that this one replaces
    pub supersedes: Option<RequestId>,
}

impl Display for DisclosureRequested {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DisclosureRequested {{ request_id: {}, project_id: {}, handles: {} }}",
            self.request_id,
            self.project_id,
            self.handles.len()
        )
    }
}
