// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fmt, path::Path};
use veil_config::{load_yaml_with_env, OracleMode};
use veil_events::{Address, PeriodId, ProjectId, RequestId};

/// A scripted run. Administrative steps are sent as the configured administrator unless they
/// name another `caller`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Scenario {
    /// Used when no config file provides one
    #[serde(default)]
    pub administrator: Option<Address>,
    #[serde(default)]
    pub oracle_mode: Option<OracleMode>,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = load_yaml_with_env(path, true)?;
        serde_yaml::from_str(&yaml)
            .with_context(|| format!("Could not parse scenario {}", path.display()))
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Authorize {
        evaluator: Address,
        #[serde(default)]
        caller: Option<Address>,
    },
    Revoke {
        evaluator: Address,
        #[serde(default)]
        caller: Option<Address>,
    },
    StartPeriod {
        duration: u64,
        #[serde(default)]
        caller: Option<Address>,
    },
    EndPeriod {
        #[serde(default)]
        caller: Option<Address>,
    },
    SubmitProject {
        submitter: Address,
        title: String,
        #[serde(default)]
        description: String,
    },
    Evaluate {
        evaluator: Address,
        project: ProjectId,
        scores: [u8; 4],
    },
    /// Scores are encrypted client side before submission
    EvaluateEncrypted {
        evaluator: Address,
        project: ProjectId,
        scores: [u64; 4],
    },
    Advance {
        seconds: u64,
    },
    RequestDisclosure {
        project: ProjectId,
        #[serde(default)]
        caller: Option<Address>,
    },
    /// Manual oracle only
    Fulfill {
        request: RequestId,
    },
    /// Manual oracle only
    Drop {
        request: RequestId,
    },
    Show {
        project: ProjectId,
    },
    Leaderboard {
        #[serde(default)]
        period: Option<PeriodId>,
    },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Authorize { evaluator, .. } => write!(f, "authorize {}", evaluator),
            Step::Revoke { evaluator, .. } => write!(f, "revoke {}", evaluator),
            Step::StartPeriod { duration, .. } => write!(f, "start period ({}s)", duration),
            Step::EndPeriod { .. } => write!(f, "end period"),
            Step::SubmitProject { title, .. } => write!(f, "submit project {:?}", title),
            Step::Evaluate {
                evaluator, project, ..
            } => write!(f, "evaluate {} as {}", project, evaluator),
            Step::EvaluateEncrypted {
                evaluator, project, ..
            } => write!(f, "evaluate {} as {} (encrypted)", project, evaluator),
            Step::Advance { seconds } => write!(f, "advance {}s", seconds),
            Step::RequestDisclosure { project, .. } => write!(f, "request disclosure of {}", project),
            Step::Fulfill { request } => write!(f, "fulfil {}", request),
            Step::Drop { request } => write!(f, "drop {}", request),
            Step::Show { project } => write!(f, "show {}", project),
            Step::Leaderboard { period } => match period {
                Some(period) => write!(f, "leaderboard {}", period),
                None => write!(f, "leaderboard (unbound)"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SCENARIO: &str = r#"
administrator: "0x00000000000000000000000000000000000000ad"
oracle_mode: manual
steps:
  - authorize: { evaluator: "0x00000000000000000000000000000000000000e1" }
  - start_period: { duration: 604800 }
  - submit_project: { submitter: "0x0000000000000000000000000000000000000051", title: "Solar" }
  - evaluate:
      evaluator: "0x00000000000000000000000000000000000000e1"
      project: 1
      scores: [8, 7, 9, 8]
  - advance: { seconds: 604800 }
  - end_period: {}
  - request_disclosure: { project: 1 }
  - fulfill: { request: 1 }
  - leaderboard: { period: 1 }
"#;

    #[test]
    fn parses_every_step_shape() -> Result<()> {
        let scenario: Scenario = serde_yaml::from_str(SCENARIO)?;
        assert_eq!(scenario.oracle_mode, Some(OracleMode::Manual));
        assert_eq!(scenario.steps.len(), 9);
        assert_eq!(
            scenario.steps[3],
            Step::Evaluate {
                evaluator: "0x00000000000000000000000000000000000000e1".parse()?,
                project: ProjectId::new(1),
                scores: [8, 7, 9, 8],
            }
        );
        assert_eq!(
            scenario.steps[5],
            Step::EndPeriod { caller: None }
        );
        assert_eq!(scenario.steps[8].to_string(), "leaderboard period:1");
        Ok(())
    }

    #[test]
    fn load_expands_environment() -> Result<()> {
        std::env::set_var("VEIL_SCENARIO_TITLE", "Orchard");
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "steps:")?;
        writeln!(file, "  - submit_project:")?;
        writeln!(file, "      submitter: \"0x0000000000000000000000000000000000000051\"")?;
        writeln!(file, "      title: ${{VEIL_SCENARIO_TITLE}}")?;
        let scenario = Scenario::load(file.path())?;
        match &scenario.steps[0] {
            Step::SubmitProject { title, .. } => assert_eq!(title, "Orchard"),
            other => panic!("unexpected {}", other),
        }
        Ok(())
    }
}
