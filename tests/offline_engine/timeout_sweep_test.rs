//! Timeout Sweep Tests
//!
//! Reconciliation over expired requests: quiet expiry for pending mints,
//! auto-refund for escrowed burns, auto-dispute where funds may already have
//! moved off-platform, and per-item failure isolation.

use ramp_engine::models::{
    BurnStatus, DisputeOpener, DisputeReason, EscrowStatus, MintStatus,
};

use crate::mock_infrastructure::EngineFixture;

#[tokio::test]
async fn test_sweep_ignores_requests_within_their_window() {
    let fx = EngineFixture::new();
    let mint = fx.pending_mint(1_000).await;
    let burn = fx.escrowed_burn(1_000).await;

    fx.advance_minutes(29);
    let report = fx.scheduler.run_sweep().await;

    assert!(report.is_noop());
    assert_eq!(fx.store.mint(mint.id).await.unwrap().status, MintStatus::Pending);
    assert_eq!(fx.store.burn(burn.id).await.unwrap().status, BurnStatus::Escrowed);
}

#[tokio::test]
async fn test_expired_pending_mint_expires_quietly() {
    let fx = EngineFixture::new();
    let mint = fx.pending_mint(1_000).await;

    fx.advance_minutes(31);
    let report = fx.scheduler.run_sweep().await;

    assert_eq!(report.mints_expired, 1);
    assert_eq!(fx.store.mint(mint.id).await.unwrap().status, MintStatus::Expired);
    // No funds were ever involved
    assert_eq!(fx.ledger.mint_count(), 0);
    assert_eq!(fx.ledger.refund_count(), 0);
}

#[tokio::test]
async fn test_expired_proof_submitted_mint_is_disputed_not_expired() {
    let fx = EngineFixture::new();
    let mint = fx.proof_submitted_mint(1_000).await;

    fx.advance_minutes(31);
    let report = fx.scheduler.run_sweep().await;

    assert_eq!(report.mints_disputed, 1);
    assert_eq!(report.mints_expired, 0);
    assert_eq!(fx.store.mint(mint.id).await.unwrap().status, MintStatus::Disputed);

    let dispute = fx.store.unresolved_dispute_for_mint(mint.id).await.unwrap();
    assert_eq!(dispute.reason, DisputeReason::AutoExpired);
    assert_eq!(dispute.opened_by, DisputeOpener::System);
    assert!(dispute.details.contains("https://proofs.test/mint.png"));
}

#[tokio::test]
async fn test_expired_escrowed_burn_is_refunded() {
    let fx = EngineFixture::new();
    let burn = fx.escrowed_burn(5_000).await;
    let escrow_id = burn.escrow_id.unwrap();

    fx.advance_minutes(31);
    let report = fx.scheduler.run_sweep().await;

    assert_eq!(report.burns_refunded, 1);
    assert_eq!(fx.store.burn(burn.id).await.unwrap().status, BurnStatus::Expired);
    assert!(fx.ledger.was_refunded(escrow_id));
    let escrow = fx.store.escrow(escrow_id).await.unwrap();
    assert_eq!(escrow.status, EscrowStatus::Refunded);
    assert_eq!(escrow.refund_reason.as_deref(), Some("auto_expired"));
}

#[tokio::test]
async fn test_expired_fiat_sent_burn_is_disputed_with_funds_held() {
    let fx = EngineFixture::new();
    let burn = fx.fiat_sent_burn(5_000).await;
    let escrow_id = burn.escrow_id.unwrap();

    // Past the 60-minute confirmation window
    fx.advance_minutes(61);
    let report = fx.scheduler.run_sweep().await;

    assert_eq!(report.burns_disputed, 1);
    assert_eq!(report.burns_refunded, 0);
    assert_eq!(fx.store.burn(burn.id).await.unwrap().status, BurnStatus::Disputed);
    assert_eq!(
        fx.store.escrow(escrow_id).await.unwrap().status,
        EscrowStatus::Disputed
    );
    // The agent may genuinely have paid; nothing moves without an arbiter
    assert_eq!(fx.ledger.refund_count(), 0);
    assert_eq!(fx.ledger.release_count(), 0);

    let dispute = fx.store.unresolved_dispute_for_escrow(escrow_id).await.unwrap();
    assert_eq!(dispute.reason, DisputeReason::AutoExpired);
}

#[tokio::test]
async fn test_sweep_opens_exactly_one_dispute_per_request() {
    let fx = EngineFixture::new();
    let burn = fx.fiat_sent_burn(5_000).await;
    let escrow_id = burn.escrow_id.unwrap();

    fx.advance_minutes(61);
    fx.scheduler.run_sweep().await;
    let second = fx.scheduler.run_sweep().await;

    assert!(second.is_noop());
    assert_eq!(fx.store.disputes_for_escrow(escrow_id).await.len(), 1);
}

#[tokio::test]
async fn test_fiat_sent_never_expires_on_the_escrow_deadline() {
    let fx = EngineFixture::new();
    let burn = fx.escrowed_burn(5_000).await;

    // Agent pays 29 minutes in; the old escrow deadline passes 2 minutes later
    fx.advance_minutes(29);
    fx.burns
        .mark_fiat_sent(burn.id, "AGT-1".into(), "https://p.test/1.png".into())
        .await
        .unwrap();
    fx.advance_minutes(2);

    let report = fx.scheduler.run_sweep().await;

    assert!(report.is_noop());
    assert_eq!(fx.store.burn(burn.id).await.unwrap().status, BurnStatus::FiatSent);
}

#[tokio::test]
async fn test_refund_failure_isolates_and_retries_next_sweep() {
    let fx = EngineFixture::new();
    let stuck = fx.escrowed_burn(1_000).await;
    let healthy = fx.pending_mint(1_000).await;

    fx.advance_minutes(31);
    fx.ledger.set_down(true);
    let report = fx.scheduler.run_sweep().await;

    // The mint pass still ran; the burn refund failed and was counted
    assert_eq!(report.mints_expired, 1);
    assert_eq!(report.burns_refunded, 0);
    assert_eq!(report.failures, 1);
    assert_eq!(fx.store.mint(healthy.id).await.unwrap().status, MintStatus::Expired);
    assert_eq!(fx.store.burn(stuck.id).await.unwrap().status, BurnStatus::Escrowed);

    // Gateway recovers; the next sweep repairs the stuck burn
    fx.ledger.set_down(false);
    let report = fx.scheduler.run_sweep().await;
    assert_eq!(report.burns_refunded, 1);
    assert_eq!(report.failures, 0);
    assert_eq!(fx.store.burn(stuck.id).await.unwrap().status, BurnStatus::Expired);
}

#[tokio::test]
async fn test_sweep_processes_mixed_batch() {
    let fx = EngineFixture::new();
    let pending_mint = fx.pending_mint(1_000).await;
    let proof_mint = fx.proof_submitted_mint(2_000).await;
    let escrowed_burn = fx.escrowed_burn(3_000).await;
    let fresh_mint_amounts = 4_000;

    fx.advance_minutes(31);
    // Created after the others; still inside its own window
    let fresh_mint = fx.pending_mint(fresh_mint_amounts).await;

    let report = fx.scheduler.run_sweep().await;

    assert_eq!(report.mints_expired, 1);
    assert_eq!(report.mints_disputed, 1);
    assert_eq!(report.burns_refunded, 1);
    assert_eq!(report.failures, 0);
    assert_eq!(
        fx.store.mint(pending_mint.id).await.unwrap().status,
        MintStatus::Expired
    );
    assert_eq!(
        fx.store.mint(proof_mint.id).await.unwrap().status,
        MintStatus::Disputed
    );
    assert_eq!(
        fx.store.burn(escrowed_burn.id).await.unwrap().status,
        BurnStatus::Expired
    );
    assert_eq!(
        fx.store.mint(fresh_mint.id).await.unwrap().status,
        MintStatus::Pending
    );
}
