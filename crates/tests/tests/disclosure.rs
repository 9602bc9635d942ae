// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use veil_config::OracleMode;
use veil_engine::{FulfillRequest, GetLifecycleState, GetOutstandingRequests};
use veil_evaluation::{LifecycleState, ProjectStatus, Scores};
use veil_events::{EngineEventData, ErrorKind, Event};
use veil_test_helpers::{evaluator, submitter, test_tracing, EngineSystem, EngineSystemBuilder};
use veil_utils::ArcBytes;

async fn manual_system() -> Result<EngineSystem> {
    let system = EngineSystemBuilder::new()
        .with_oracle_mode(OracleMode::Manual)
        .build()?;
    system.authorize(&[evaluator(1), evaluator(2)]).await?;
    Ok(system)
}

#[actix::test]
async fn worked_example_with_immediate_oracle() -> Result<()> {
    let _guard = test_tracing("info");
    let system = EngineSystemBuilder::new().with_logging("audit").build()?;
    system.authorize(&[evaluator(1), evaluator(2)]).await?;
    let project = system.submit_project(submitter(1), "Clean water").await?;

    system
        .evaluate(evaluator(1), project, Scores::new(8, 7, 9, 8))
        .await?;
    assert_eq!(
        system
            .evaluate(evaluator(2), project, Scores::new(7, 8, 8, 9))
            .await?,
        2
    );
    system.request_disclosure(project).await?;

    let disclosed = system.wait_for("ResultDisclosed", 1).await?;
    let EngineEventData::ResultDisclosed(result) = disclosed[0].get_data() else {
        panic!("expected ResultDisclosed");
    };
    assert_eq!(result.project_id, project);
    assert_eq!(result.final_score, 32);
    assert_eq!(result.evaluation_count, 2);
    assert_eq!(result.rank, 1);

    let stored = system.project(project).await?;
    assert_eq!(stored.status, ProjectStatus::Disclosed);
    assert_eq!(stored.disclosed_score, Some(32));
    Ok(())
}

#[actix::test]
async fn overlapping_callbacks_resolve_out_of_order() -> Result<()> {
    let system = manual_system().await?;
    let a = system.submit_project(submitter(1), "A").await?;
    let b = system.submit_project(submitter(2), "B").await?;
    system
        .evaluate(evaluator(1), a, Scores::new(10, 10, 10, 10))
        .await?;
    system
        .evaluate(evaluator(1), b, Scores::new(5, 5, 5, 5))
        .await?;

    let request_a = system.request_disclosure(a).await?;
    let request_b = system.request_disclosure(b).await?;
    let response_a = system.held_response(request_a).await?;
    let response_b = system.held_response(request_b).await?;

    // B's answer arrives first
    let disclosed_b = system.deliver(response_b).await??;
    assert_eq!(disclosed_b.project_id, b);
    assert_eq!(disclosed_b.final_score, 20);
    assert_eq!(disclosed_b.rank, 1);

    let disclosed_a = system.deliver(response_a).await??;
    assert_eq!(disclosed_a.project_id, a);
    assert_eq!(disclosed_a.final_score, 40);
    assert_eq!(disclosed_a.rank, 1);

    // B keeps the rank it was given when it was disclosed
    assert_eq!(system.project(b).await?.rank, Some(1));
    Ok(())
}

#[actix::test]
async fn tampered_proof_is_rejected_then_valid_callback_succeeds() -> Result<()> {
    let system = manual_system().await?;
    let project = system.submit_project(submitter(1), "Reforest").await?;
    system
        .evaluate(evaluator(1), project, Scores::new(8, 7, 9, 8))
        .await?;
    let request = system.request_disclosure(project).await?;
    let genuine = system.held_response(request).await?;

    let mut forged = genuine.clone();
    let mut proof = forged.proof.extract_bytes();
    proof[0] ^= 0x01;
    forged.proof = ArcBytes::from_bytes(proof);
    let err = system.deliver(forged).await?.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProofVerification);

    let mut inflated = genuine.clone();
    let mut cleartext = inflated.cleartext.extract_bytes();
    cleartext[31] = 0xff;
    inflated.cleartext = ArcBytes::from_bytes(cleartext);
    assert_eq!(
        system.deliver(inflated).await?.unwrap_err().kind(),
        ErrorKind::ProofVerification
    );

    assert_eq!(
        system.project(project).await?.status,
        ProjectStatus::DisclosureRequested
    );

    let disclosure = system.deliver(genuine).await??;
    assert_eq!(disclosure.final_score, 32);

    let errors = system.errors(2).await?;
    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .all(|e| e.operation == "decryption_callback" && e.kind == ErrorKind::ProofVerification));
    Ok(())
}

#[actix::test]
async fn stuck_request_can_be_superseded() -> Result<()> {
    let system = manual_system().await?;
    let project = system.submit_project(submitter(1), "Bridge").await?;
    system
        .evaluate(evaluator(1), project, Scores::new(6, 6, 6, 6))
        .await?;

    let stuck = system.request_disclosure(project).await?;
    let stale = system.held_response(stuck).await?;

    // nothing times out
    system.advance(30 * 24 * 60 * 60);
    assert_eq!(
        system.engine().send(GetLifecycleState(project)).await?,
        Some(LifecycleState::DisclosureRequested)
    );

    let retry = system.request_disclosure(project).await?;
    assert_ne!(retry, stuck);
    let outstanding = system.engine().send(GetOutstandingRequests).await?;
    assert_eq!(outstanding.len(), 1);
    assert_eq!(outstanding[0].id, retry);

    // the superseded answer turns up late
    assert_eq!(
        system.deliver(stale).await?.unwrap_err().kind(),
        ErrorKind::State
    );

    let history = system.wait_for("DisclosureRequested", 2).await?;
    let EngineEventData::DisclosureRequested(second) = history[1].get_data() else {
        panic!("expected DisclosureRequested");
    };
    assert_eq!(second.supersedes, Some(stuck));

    let disclosure = system.oracle().send(FulfillRequest(retry)).await??;
    assert_eq!(disclosure.final_score, 24);
    Ok(())
}

#[actix::test]
async fn disclosure_is_idempotent() -> Result<()> {
    let system = manual_system().await?;
    let project = system.submit_project(submitter(1), "Library").await?;
    system
        .evaluate(evaluator(1), project, Scores::new(3, 4, 5, 6))
        .await?;
    let request = system.request_disclosure(project).await?;
    let response = system.held_response(request).await?;
    system.deliver(response.clone()).await??;

    let err = system.request_disclosure(project).await.unwrap_err();
    assert!(err.to_string().contains("state error"));
    assert_eq!(
        system.deliver(response).await?.unwrap_err().kind(),
        ErrorKind::State
    );

    let stored = system.project(project).await?;
    assert_eq!(stored.disclosed_score, Some(18));
    assert_eq!(stored.rank, Some(1));
    Ok(())
}
