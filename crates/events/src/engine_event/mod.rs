// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod disclosure_requested;
mod evaluation_period_ended;
mod evaluation_period_started;
mod evaluation_submitted;
mod evaluator_authorized;
mod evaluator_revoked;
mod operation_rejected;
mod project_submitted;
mod result_disclosed;

pub use disclosure_requested::*;
pub use evaluation_period_ended::*;
pub use evaluation_period_started::*;
pub use evaluation_submitted::*;
pub use evaluator_authorized::*;
pub use evaluator_revoked::*;
pub use operation_rejected::*;
pub use project_submitted::*;
pub use result_disclosed::*;

use crate::{ErrorEvent, Event, EventId, ProjectId};
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to help define From traits for EngineEventData and the variant name lookup
macro_rules! impl_event_data {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for EngineEventData {
                fn from(data: $variant) -> Self {
                    EngineEventData::$variant(data)
                }
            }
        )*

        impl EngineEventData {
            pub fn event_type(&self) -> &'static str {
                match self {
                    $(EngineEventData::$variant(_) => stringify!($variant),)*
                }
            }
        }

        impl fmt::Display for EngineEventData {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(EngineEventData::$variant(data) => fmt::Display::fmt(data, f),)*
                }
            }
        }
    };
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineEventData {
    ProjectSubmitted(ProjectSubmitted),
    EvaluationSubmitted(EvaluationSubmitted),
    EvaluationPeriodStarted(EvaluationPeriodStarted),
    EvaluationPeriodEnded(EvaluationPeriodEnded),
    EvaluatorAuthorized(EvaluatorAuthorized),
    EvaluatorRevoked(EvaluatorRevoked),
    DisclosureRequested(DisclosureRequested),
    ResultDisclosed(ResultDisclosed),
    OperationRejected(OperationRejected),
}

impl_event_data!(
    ProjectSubmitted,
    EvaluationSubmitted,
    EvaluationPeriodStarted,
    EvaluationPeriodEnded,
    EvaluatorAuthorized,
    EvaluatorRevoked,
    DisclosureRequested,
    ResultDisclosed,
    OperationRejected
);

impl EngineEventData {
    pub fn project_id(&self) -> Option<ProjectId> {
        match self {
            EngineEventData::ProjectSubmitted(data) => Some(data.project_id),
            EngineEventData::EvaluationSubmitted(data) => Some(data.project_id),
            EngineEventData::DisclosureRequested(data) => Some(data.project_id),
            EngineEventData::ResultDisclosed(data) => Some(data.project_id),
            _ => None,
        }
    }
}

/// A single entry of the engine audit trail. `seq` is assigned by the publishing
/// [`crate::BusHandle`] and is strictly increasing per engine instance.
#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct EngineEvent {
    seq: u64,
    id: EventId,
    data: EngineEventData,
}

impl EngineEvent {
    pub fn new(seq: u64, data: impl Into<EngineEventData>) -> Self {
        let data = data.into();
        let id = EventId::of(&(seq, &data));
        Self { seq, id, data }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

impl Event for EngineEvent {
    type Id = EventId;
    type Data = EngineEventData;

    fn event_type(&self) -> &'static str {
        self.data.event_type()
    }

    fn event_id(&self) -> Self::Id {
        self.id
    }

    fn get_data(&self) -> &Self::Data {
        &self.data
    }

    fn into_data(self) -> Self::Data {
        self.data
    }
}

impl ErrorEvent for EngineEvent {
    type Error = OperationRejected;

    fn as_error(&self) -> Option<&Self::Error> {
        match &self.data {
            EngineEventData::OperationRejected(data) => Some(data),
            _ => None,
        }
    }
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}({})", self.seq, self.event_type(), self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Address, PeriodId};

    fn authorized(n: u64) -> EvaluatorAuthorized {
        EvaluatorAuthorized {
            evaluator: Address::from_low_u64(n),
        }
    }

    #[test]
    fn event_type_is_the_variant_name() {
        let evt = EngineEvent::new(0, authorized(1));
        assert_eq!(evt.event_type(), "EvaluatorAuthorized");

        let evt = EngineEvent::new(
            1,
            EvaluationPeriodEnded {
                period_id: PeriodId::new(1),
                ended_at: 10,
                project_count: 0,
            },
        );
        assert_eq!(evt.event_type(), "EvaluationPeriodEnded");
    }

    #[test]
    fn identical_payloads_at_different_positions_get_distinct_ids() {
        let a = EngineEvent::new(0, authorized(1));
        let b = EngineEvent::new(1, authorized(1));
        assert_ne!(a.event_id(), b.event_id());
        assert_eq!(a.event_id(), EngineEvent::new(0, authorized(1)).event_id());
    }

    #[test]
    fn only_rejections_are_error_events() {
        let ok = EngineEvent::new(0, authorized(1));
        assert!(ok.as_error().is_none());

        let rejected = EngineEvent::new(
            1,
            OperationRejected::new("submit_evaluation", ErrorKind::State, "project not active"),
        );
        let err = rejected.as_error().expect("rejection is an error event");
        assert_eq!(err.kind.code(), "STATE_ERROR");
        assert_eq!(
            rejected.to_string(),
            "#1 OperationRejected(submit_evaluation rejected [STATE_ERROR]: project not active)"
        );
    }

    #[test]
    fn events_survive_bincode() -> anyhow::Result<()> {
        let evt = EngineEvent::new(
            7,
            ProjectSubmitted {
                project_id: ProjectId::new(1),
                submitter: Address::from_low_u64(9),
                title: "Solar grid".to_string(),
                period_id: Some(PeriodId::new(2)),
                created_at: 100,
            },
        );
        let decoded = EngineEvent::from_bytes(&evt.to_bytes()?)?;
        assert_eq!(decoded, evt);
        assert_eq!(decoded.get_data().project_id(), Some(ProjectId::new(1)));
        Ok(())
    }
}
