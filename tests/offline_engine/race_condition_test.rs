//! Race Condition Tests
//!
//! Concurrent actors on the same request serialize on its row lock: exactly
//! one wins the transition and the loser observes the new status. Ledger
//! effects must never double up.

use ramp_engine::error::EngineError;
use ramp_engine::models::{BurnStatus, EscrowStatus, MintStatus, Resolution};

use crate::mock_infrastructure::EngineFixture;

#[tokio::test]
async fn test_double_confirm_mints_exactly_once() {
    let fx = EngineFixture::new();
    let request = fx.proof_submitted_mint(1_000).await;

    let (a, b) = tokio::join!(fx.mints.confirm(request.id), fx.mints.confirm(request.id));

    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    let loser = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
    assert!(matches!(loser, EngineError::InvalidState { .. }));
    assert_eq!(fx.ledger.mint_count(), 1);
}

#[tokio::test]
async fn test_confirm_races_sweep_expiry() {
    let fx = EngineFixture::new();
    let request = fx.pending_mint(1_000).await;
    fx.advance_minutes(31);

    // Agent confirmation cannot race here (no proof), but expiry racing a
    // late proof submission is the same one-winner shape.
    let (proof, sweep) = tokio::join!(
        fx.mints
            .submit_proof(request.id, "https://p.test/late.png".into(), None),
        fx.mints.expire(request.id)
    );

    assert!(proof.is_ok() != sweep.is_ok(), "exactly one side must win");
    let status = fx.store.mint(request.id).await.unwrap().status;
    if proof.is_ok() {
        assert_eq!(status, MintStatus::ProofSubmitted);
    } else {
        assert_eq!(status, MintStatus::Expired);
    }
}

#[tokio::test]
async fn test_fiat_sent_races_burn_expiry() {
    let fx = EngineFixture::new();
    let request = fx.escrowed_burn(2_000).await;
    let escrow_id = request.escrow_id.unwrap();
    fx.advance_minutes(31);

    let (sent, expired) = tokio::join!(
        fx.burns
            .mark_fiat_sent(request.id, "AGT-1".into(), "https://p.test/1.png".into()),
        fx.burns.expire(request.id)
    );

    assert!(sent.is_ok() != expired.is_ok(), "exactly one side must win");
    let request = fx.store.burn(request.id).await.unwrap();
    let escrow = fx.store.escrow(escrow_id).await.unwrap();
    if sent.is_ok() {
        // The agent won: funds stay locked for the confirmation phase
        assert_eq!(request.status, BurnStatus::FiatSent);
        assert_eq!(escrow.status, EscrowStatus::Locked);
        assert_eq!(fx.ledger.refund_count(), 0);
    } else {
        assert_eq!(request.status, BurnStatus::Expired);
        assert_eq!(escrow.status, EscrowStatus::Refunded);
        assert_eq!(fx.ledger.refund_count(), 1);
    }
}

#[tokio::test]
async fn test_release_is_idempotent_with_one_ledger_call() {
    let fx = EngineFixture::new();
    let request = fx.fiat_sent_burn(2_000).await;
    let escrow_id = request.escrow_id.unwrap();
    fx.burns.confirm_receipt(request.id).await.unwrap();
    assert_eq!(fx.ledger.release_count(), 1);

    // Retried release on the completed hold is a quiet no-op
    let (a, b) = tokio::join!(
        fx.escrows.release(escrow_id, fx.agent_id),
        fx.escrows.release(escrow_id, fx.agent_id)
    );

    assert!(a.is_ok() && b.is_ok());
    assert_eq!(fx.ledger.release_count(), 1);
}

#[tokio::test]
async fn test_refund_is_idempotent_with_one_ledger_call() {
    let fx = EngineFixture::new();
    let request = fx.escrowed_burn(2_000).await;
    let escrow_id = request.escrow_id.unwrap();
    fx.advance_minutes(31);

    let (a, b) = tokio::join!(fx.burns.expire(request.id), fx.burns.expire(request.id));

    // One caller performs the expiry, the other loses the status check; the
    // refund itself happens once either way.
    assert!(a.is_ok() != b.is_ok());
    assert_eq!(fx.ledger.refund_count(), 1);
    assert!(
        fx.escrows.refund(escrow_id, "auto_expired", None).await.is_ok(),
        "direct refund retry on a refunded hold is a no-op"
    );
    assert_eq!(fx.ledger.refund_count(), 1);
}

#[tokio::test]
async fn test_concurrent_resolutions_apply_exactly_one_verdict() {
    let fx = EngineFixture::new();
    let request = fx.fiat_sent_burn(2_000).await;
    let escrow_id = request.escrow_id.unwrap();
    fx.burns
        .open_dispute(
            request.id,
            ramp_engine::models::DisputeOpener::User(fx.user_id),
            ramp_engine::models::DisputeReason::PaymentNotReceived,
            "x".into(),
        )
        .await
        .unwrap();
    let dispute = fx.store.unresolved_dispute_for_escrow(escrow_id).await.unwrap();

    let (release, refund) = tokio::join!(
        fx.disputes
            .resolve(dispute.id, Resolution::Release, uuid::Uuid::new_v4(), None),
        fx.disputes
            .resolve(dispute.id, Resolution::Refund, uuid::Uuid::new_v4(), None)
    );

    assert!(release.is_ok() != refund.is_ok(), "exactly one verdict applies");
    assert_eq!(fx.ledger.release_count() + fx.ledger.refund_count(), 1);
    let escrow = fx.store.escrow(escrow_id).await.unwrap();
    assert!(matches!(
        escrow.status,
        EscrowStatus::Completed | EscrowStatus::Refunded
    ));
}
