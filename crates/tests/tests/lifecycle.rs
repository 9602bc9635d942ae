// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use veil_config::OracleMode;
use veil_engine::{
    EndEvaluationPeriod, GetEvaluation, GetGrantCount, GetLeaderboard, GetLifecycleState,
    GetPeriod, RevokeEvaluator, StartEvaluationPeriod, SubmitEncryptedEvaluation,
};
use veil_evaluation::{LifecycleState, Scores};
use veil_events::{EngineEventData, ErrorKind, Event};
use veil_fhe::PlaintextLookup;
use veil_test_helpers::{evaluator, submitter, EngineSystemBuilder};

const DAY: u64 = 24 * 60 * 60;

#[actix::test]
async fn projects_stay_bound_to_their_period() -> Result<()> {
    let system = EngineSystemBuilder::new().build()?;
    system.authorize(&[evaluator(1)]).await?;
    let admin = system.admin();

    let first = system
        .engine()
        .send(StartEvaluationPeriod {
            caller: admin,
            duration: 7 * DAY,
        })
        .await??;
    let early = system.submit_project(submitter(1), "Early").await?;

    let err = system
        .engine()
        .send(EndEvaluationPeriod { caller: admin })
        .await?
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);

    system.advance(7 * DAY);
    system
        .engine()
        .send(EndEvaluationPeriod { caller: admin })
        .await??;
    let second = system
        .engine()
        .send(StartEvaluationPeriod {
            caller: admin,
            duration: 7 * DAY,
        })
        .await??;
    let late = system.submit_project(submitter(2), "Late").await?;

    assert_eq!(system.project(early).await?.period_id, Some(first));
    assert_eq!(system.project(late).await?.period_id, Some(second));
    assert_eq!(
        system.engine().send(GetLifecycleState(early)).await?,
        Some(LifecycleState::PeriodClosed)
    );
    assert_eq!(
        system.engine().send(GetLifecycleState(late)).await?,
        Some(LifecycleState::Active)
    );

    let period = system
        .engine()
        .send(GetPeriod(first))
        .await?
        .ok_or_else(|| anyhow::anyhow!("missing period"))?;
    assert!(!period.active);
    assert!(period.projects.contains(&early));
    assert!(!period.projects.contains(&late));

    let ended = system.wait_for("EvaluationPeriodEnded", 1).await?;
    let EngineEventData::EvaluationPeriodEnded(data) = ended[0].get_data() else {
        panic!("expected EvaluationPeriodEnded");
    };
    assert_eq!(data.project_count, 1);
    Ok(())
}

#[actix::test]
async fn ranks_are_scoped_to_the_period() -> Result<()> {
    let system = EngineSystemBuilder::new().build()?;
    system.authorize(&[evaluator(1)]).await?;
    let admin = system.admin();

    let period = system
        .engine()
        .send(StartEvaluationPeriod {
            caller: admin,
            duration: DAY,
        })
        .await??;
    let a = system.submit_project(submitter(1), "A").await?;
    let b = system.submit_project(submitter(2), "B").await?;
    system.advance(DAY);
    system
        .engine()
        .send(EndEvaluationPeriod { caller: admin })
        .await??;
    // outside any period
    let loose = system.submit_project(submitter(3), "Loose").await?;

    for (project, s) in [(a, 10), (b, 5), (loose, 10)] {
        system
            .evaluate(evaluator(1), project, Scores::new(s, s, s, s))
            .await?;
    }
    // B is disclosed before A, so it is first when it is ranked
    for project in [b, a, loose] {
        system.request_disclosure(project).await?;
        system.wait_for("ResultDisclosed", 1).await?;
        system.reset_history().await?;
    }

    assert_eq!(system.project(b).await?.rank, Some(1));
    assert_eq!(system.project(a).await?.rank, Some(1));
    assert_eq!(system.project(loose).await?.rank, Some(1));

    let board = system.engine().send(GetLeaderboard(Some(period))).await??;
    let order: Vec<_> = board
        .entries
        .iter()
        .map(|e| (e.project_id, e.final_score, e.standing, e.provisional_rank))
        .collect();
    assert_eq!(order, vec![(a, 40, 1, 1), (b, 20, 2, 1)]);

    let unbound = system.engine().send(GetLeaderboard(None)).await??;
    assert_eq!(unbound.entries.len(), 1);
    assert_eq!(unbound.entries[0].project_id, loose);
    Ok(())
}

#[actix::test]
async fn encrypted_scores_are_clamped() -> Result<()> {
    let system = EngineSystemBuilder::new()
        .with_oracle_mode(OracleMode::Immediate)
        .build()?;
    system.authorize(&[evaluator(1), evaluator(2)]).await?;
    let project = system.submit_project(submitter(1), "Sensors").await?;

    let inputs = system.encrypt_scores(evaluator(1), [200, 10, 11, 4])?;
    let count = system
        .engine()
        .send(SubmitEncryptedEvaluation {
            caller: evaluator(1),
            project_id: project,
            inputs,
        })
        .await??;
    assert_eq!(count, 1);

    let evaluation = system
        .engine()
        .send(GetEvaluation {
            project_id: project,
            evaluator: evaluator(1),
        })
        .await?
        .ok_or_else(|| anyhow::anyhow!("missing evaluation"))?;
    assert!(evaluation.encrypted_input);
    assert_eq!(
        system.fhe().plaintext(&evaluation.total.handle()),
        Some(10 + 10 + 10 + 4)
    );

    system
        .evaluate(evaluator(2), project, Scores::new(10, 10, 10, 10))
        .await?;
    system.request_disclosure(project).await?;
    let disclosed = system.wait_for("ResultDisclosed", 1).await?;
    let EngineEventData::ResultDisclosed(result) = disclosed[0].get_data() else {
        panic!("expected ResultDisclosed");
    };
    assert_eq!(result.final_score, (34 + 40) / 2);
    Ok(())
}

#[actix::test]
async fn rejected_operations_leave_no_trace() -> Result<()> {
    let system = EngineSystemBuilder::new().build()?;
    system.authorize(&[evaluator(1), evaluator(2)]).await?;
    let project = system.submit_project(submitter(1), "Transit").await?;
    let grants = system.engine().send(GetGrantCount).await?;

    // proofs are bound to evaluator 1
    let inputs = system.encrypt_scores(evaluator(1), [1, 2, 3, 4])?;
    let err = system
        .engine()
        .send(SubmitEncryptedEvaluation {
            caller: evaluator(2),
            project_id: project,
            inputs,
        })
        .await?
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    for scores in [Scores::new(11, 0, 0, 0), Scores::new(0, 0, 0, 11)] {
        assert!(system.evaluate(evaluator(1), project, scores).await.is_err());
    }
    assert_eq!(system.engine().send(GetGrantCount).await?, grants);
    assert_eq!(system.project(project).await?.evaluation_count, 0);

    system
        .engine()
        .send(RevokeEvaluator {
            caller: system.admin(),
            evaluator: evaluator(2),
        })
        .await??;
    let err = system
        .evaluate(evaluator(2), project, Scores::new(1, 1, 1, 1))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("authorization error"));

    let errors = system.errors(4).await?;
    let codes: Vec<_> = errors.iter().map(|e| e.kind.code()).collect();
    assert_eq!(
        codes,
        vec![
            "VALIDATION_ERROR",
            "VALIDATION_ERROR",
            "VALIDATION_ERROR",
            "AUTHORIZATION_ERROR"
        ]
    );
    Ok(())
}
