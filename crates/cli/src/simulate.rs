// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::scenario::{Scenario, Step};
use anyhow::{anyhow, Context, Result};
use std::{fmt, fs::File, io::Write, path::Path, sync::Arc, time::Duration};
use tokio::time::{sleep, timeout};
use tracing::{info, warn};
use veil_config::{EngineConfig, OracleMode};
use veil_engine::{
    AuthorizeEvaluator, DropRequest, EndEvaluationPeriod, EngineBuilder, EngineError,
    EngineHandle, FulfillRequest, GetLeaderboard, GetPendingRequests, GetProject,
    RequestDisclosure, RevokeEvaluator, StartEvaluationPeriod, SubmitEncryptedEvaluation,
    SubmitEvaluation, SubmitProject, SCORE_TYPE,
};
use veil_evaluation::{Project, Scores};
use veil_events::{Address, ProjectId, RequestId, TakeEvents};
use veil_fhe::ExternalInput;
use veil_utils::{Clock, ManualClock, SystemClock};

const ORACLE_TIMEOUT: Duration = Duration::from_secs(5);

/// What happened to a single step
enum Outcome {
    Ok(String),
    Rejected(EngineError),
    Failed(String),
}

impl Outcome {
    fn ok(detail: impl Into<String>) -> Self {
        Outcome::Ok(detail.into())
    }

    fn from_engine<T>(result: Result<T, EngineError>, detail: impl FnOnce(T) -> String) -> Self {
        match result {
            Ok(value) => Outcome::Ok(detail(value)),
            Err(err) => Outcome::Rejected(err),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Ok(detail) if detail.is_empty() => write!(f, "ok"),
            Outcome::Ok(detail) => write!(f, "ok {}", detail),
            Outcome::Rejected(err) => write!(f, "rejected [{}] {}", err.code(), err.reason()),
            Outcome::Failed(reason) => write!(f, "failed {}", reason),
        }
    }
}

/// Replay `scenario` against a fresh engine, printing one line per step. Rejected operations
/// are reported and the run carries on.
pub async fn execute(
    config: Result<EngineConfig>,
    scenario: &Path,
    audit: Option<&Path>,
) -> Result<()> {
    let scenario = Scenario::load(scenario)?;
    let config = resolve_config(config, &scenario)?;
    let runner = Runner::start(config)?;

    for (index, step) in scenario.steps.iter().enumerate() {
        let outcome = runner.run(step).await?;
        println!("{:>3}. {}: {}", index + 1, step, outcome);
    }

    if let Some(path) = audit {
        let written = runner.write_audit(path).await?;
        info!("wrote {} audit events to {}", written, path.display());
    }
    Ok(())
}

fn resolve_config(config: Result<EngineConfig>, scenario: &Scenario) -> Result<EngineConfig> {
    let config = match (config, scenario.administrator) {
        (Ok(config), _) => config,
        (Err(err), Some(administrator)) => {
            warn!("using scenario defaults: {:#}", err);
            EngineConfig::new(administrator)
        }
        (Err(err), None) => {
            return Err(err.context("no configuration and the scenario names no administrator"))
        }
    };
    Ok(match scenario.oracle_mode {
        Some(mode) => config.with_oracle_mode(mode),
        None => config,
    })
}

struct Runner {
    handle: EngineHandle,
    clock: ManualClock,
    admin: Address,
    mode: OracleMode,
}

impl Runner {
    fn start(config: EngineConfig) -> Result<Self> {
        let clock = ManualClock::new(SystemClock.now());
        let admin = config.administrator();
        let mode = config.oracle_mode();
        let handle = EngineBuilder::new(config)
            .with_clock(Arc::new(clock.clone()))
            .with_logging("veil")
            .testmode_with_history()
            .build()?;
        Ok(Self {
            handle,
            clock,
            admin,
            mode,
        })
    }

    async fn run(&self, step: &Step) -> Result<Outcome> {
        let engine = &self.handle.engine;
        let caller = |c: &Option<Address>| c.unwrap_or(self.admin);

        let outcome = match step {
            Step::Authorize { evaluator, caller: c } => Outcome::from_engine(
                engine
                    .send(AuthorizeEvaluator {
                        caller: caller(c),
                        evaluator: *evaluator,
                    })
                    .await?,
                |_| String::new(),
            ),
            Step::Revoke { evaluator, caller: c } => Outcome::from_engine(
                engine
                    .send(RevokeEvaluator {
                        caller: caller(c),
                        evaluator: *evaluator,
                    })
                    .await?,
                |_| String::new(),
            ),
            Step::StartPeriod { duration, caller: c } => Outcome::from_engine(
                engine
                    .send(StartEvaluationPeriod {
                        caller: caller(c),
                        duration: *duration,
                    })
                    .await?,
                |period| period.to_string(),
            ),
            Step::EndPeriod { caller: c } => Outcome::from_engine(
                engine
                    .send(EndEvaluationPeriod { caller: caller(c) })
                    .await?,
                |period| format!("{} ended", period),
            ),
            Step::SubmitProject {
                submitter,
                title,
                description,
            } => Outcome::from_engine(
                engine
                    .send(SubmitProject {
                        caller: *submitter,
                        title: title.clone(),
                        description: description.clone(),
                    })
                    .await?,
                |project| project.to_string(),
            ),
            Step::Evaluate {
                evaluator,
                project,
                scores,
            } => Outcome::from_engine(
                engine
                    .send(SubmitEvaluation {
                        caller: *evaluator,
                        project_id: *project,
                        scores: Scores::from(*scores),
                    })
                    .await?,
                |count| format!("{} evaluation(s)", count),
            ),
            Step::EvaluateEncrypted {
                evaluator,
                project,
                scores,
            } => match self.encrypt(evaluator, *scores) {
                Ok(inputs) => Outcome::from_engine(
                    engine
                        .send(SubmitEncryptedEvaluation {
                            caller: *evaluator,
                            project_id: *project,
                            inputs,
                        })
                        .await?,
                    |count| format!("{} evaluation(s)", count),
                ),
                Err(err) => Outcome::Rejected(err),
            },
            Step::Advance { seconds } => {
                Outcome::ok(format!("now {}", self.clock.advance(*seconds)))
            }
            Step::RequestDisclosure { project, caller: c } => {
                let result = engine
                    .send(RequestDisclosure {
                        caller: caller(c),
                        project_id: *project,
                    })
                    .await?;
                match result {
                    Ok(request) if self.mode == OracleMode::Immediate => {
                        let disclosed = self.await_disclosure(*project).await?;
                        Outcome::ok(format!("{} {}", request, describe_disclosure(&disclosed)))
                    }
                    other => Outcome::from_engine(other, |request| request.to_string()),
                }
            }
            Step::Fulfill { request } => self.fulfil(*request).await?,
            Step::Drop { request } => {
                if self.handle.oracle.send(DropRequest(*request)).await? {
                    Outcome::ok("")
                } else {
                    Outcome::Failed(format!("oracle holds no {}", request))
                }
            }
            Step::Show { project } => match engine.send(GetProject(*project)).await? {
                Some(project) => Outcome::ok(describe_project(&project)),
                None => Outcome::Failed(format!("no such {}", project)),
            },
            Step::Leaderboard { period } => {
                Outcome::from_engine(engine.send(GetLeaderboard(*period)).await?, |board| {
                    board
                        .entries
                        .iter()
                        .map(|e| {
                            format!(
                                "\n       #{} {} score {} (ranked {} at disclosure)",
                                e.standing, e.project_id, e.final_score, e.provisional_rank
                            )
                        })
                        .collect()
                })
            }
        };
        Ok(outcome)
    }

    fn encrypt(
        &self,
        owner: &Address,
        values: [u64; 4],
    ) -> Result<[ExternalInput; 4], EngineError> {
        let mut inputs = Vec::with_capacity(values.len());
        for value in values {
            inputs.push(self.handle.fhe.encrypt_input(value, SCORE_TYPE, owner)?);
        }
        inputs
            .try_into()
            .map_err(|_| EngineError::Validation("expected four encrypted scores".to_string()))
    }

    /// Manual mode only: the oracle sees requests through the bus, so wait until it holds
    /// this one before asking for it
    async fn fulfil(&self, request: RequestId) -> Result<Outcome> {
        let oracle = self.handle.oracle.clone();
        let held = timeout(ORACLE_TIMEOUT, async {
            loop {
                if oracle.send(GetPendingRequests).await?.contains(&request) {
                    return Ok::<_, anyhow::Error>(());
                }
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        match held {
            Ok(result) => result?,
            Err(_) => return Ok(Outcome::Failed(format!("oracle holds no {}", request))),
        }

        Ok(match oracle.send(FulfillRequest(request)).await? {
            Ok(disclosure) => Outcome::ok(format!(
                "{} score {} rank {}",
                disclosure.project_id, disclosure.final_score, disclosure.rank
            )),
            Err(err) => match err.downcast::<EngineError>() {
                Ok(err) => Outcome::Rejected(err),
                Err(err) => Outcome::Failed(format!("{:#}", err)),
            },
        })
    }

    async fn await_disclosure(&self, project_id: ProjectId) -> Result<Project> {
        let engine = self.handle.engine.clone();
        timeout(ORACLE_TIMEOUT, async move {
            loop {
                if let Some(project) = engine.send(GetProject(project_id)).await? {
                    if project.is_disclosed() {
                        return Ok::<_, anyhow::Error>(project);
                    }
                }
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .context(format!("{} was never disclosed", project_id))?
    }

    /// Write every event published so far as one JSON object per line
    async fn write_audit(&self, path: &Path) -> Result<usize> {
        let history = self
            .handle
            .history()
            .ok_or_else(|| anyhow!("history was not recorded"))?;
        let count = self.handle.bus.published() as usize;
        let events = timeout(ORACLE_TIMEOUT, history.send(TakeEvents::new(count)))
            .await
            .context("Timed out collecting the audit trail")??;

        let mut file = File::create(path)
            .with_context(|| format!("Could not create {}", path.display()))?;
        for event in &events {
            writeln!(file, "{}", serde_json::to_string(event)?)?;
        }
        Ok(events.len())
    }
}

fn describe_disclosure(project: &Project) -> String {
    match (project.disclosed_score, project.rank) {
        (Some(score), Some(rank)) => format!("score {} rank {}", score, rank),
        _ => String::new(),
    }
}

fn describe_project(project: &Project) -> String {
    let mut out = format!(
        "{:?} by {} is {} with {} evaluation(s)",
        project.title, project.submitter, project.status, project.evaluation_count
    );
    if let Some(period) = project.period_id {
        out.push_str(&format!(" in {}", period));
    }
    if project.is_disclosed() {
        out.push_str(&format!(", {}", describe_disclosure(project)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const SCENARIO: &str = r#"
administrator: "0x00000000000000000000000000000000000000ad"
steps:
  - authorize: { evaluator: "0x00000000000000000000000000000000000000e1" }
  - authorize: { evaluator: "0x00000000000000000000000000000000000000e2" }
  - submit_project: { submitter: "0x0000000000000000000000000000000000000051", title: "Clean water" }
  - evaluate: { evaluator: "0x00000000000000000000000000000000000000e1", project: 1, scores: [8, 7, 9, 8] }
  - evaluate: { evaluator: "0x00000000000000000000000000000000000000e2", project: 1, scores: [7, 8, 8, 9] }
  - evaluate: { evaluator: "0x00000000000000000000000000000000000000e2", project: 1, scores: [1, 1, 1, 1] }
  - request_disclosure: { project: 1 }
  - show: { project: 1 }
"#;

    #[actix::test]
    async fn replays_a_scenario_and_writes_the_audit_trail() -> Result<()> {
        let dir = tempdir()?;
        let scenario = dir.path().join("scenario.yaml");
        let audit = dir.path().join("audit.jsonl");
        fs::write(&scenario, SCENARIO)?;

        execute(
            Err(anyhow!("no config file")),
            &scenario,
            Some(audit.as_path()),
        )
        .await?;

        let trail = fs::read_to_string(&audit)?;
        let lines: Vec<&str> = trail.lines().collect();
        // 2 authorisations, 1 project, 2 evaluations, 1 rejection, request and disclosure
        assert_eq!(lines.len(), 8);
        assert!(lines[5].contains("OperationRejected"));
        assert!(lines[7].contains("ResultDisclosed"));
        Ok(())
    }

    #[test]
    fn needs_an_administrator_from_somewhere() -> Result<()> {
        let scenario: Scenario = serde_yaml::from_str("oracle_mode: manual\nsteps: []\n")?;
        assert!(resolve_config(Err(anyhow!("missing")), &scenario).is_err());

        let admin = Address::from_low_u64(7);
        let config = resolve_config(Ok(EngineConfig::new(admin)), &scenario)?;
        assert_eq!(config.administrator(), admin);
        assert_eq!(config.oracle_mode(), OracleMode::Manual);
        Ok(())
    }
}
