//! Mint request state machine
//!
//! PENDING → PROOF_SUBMITTED → {CONFIRMED | REJECTED}. A request with no
//! proof expires quietly; a request with proof never expires, because the
//! user's fiat may already have left their account. The sweep escalates it to
//! a dispute instead.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::TimeoutConfig;
use crate::error::{EngineError, EngineResult};
use crate::ledger::LedgerGateway;
use crate::models::{DisputeLink, DisputeOpener, DisputeReason, MintRequest, MintStatus, TokenType};
use crate::notify::{EngineEvent, Notifier};
use crate::store::MemoryStore;

use super::{ledger_call, DisputeService};

/// Drives mint requests through their lifecycle
pub struct MintService {
    store: Arc<MemoryStore>,
    ledger: Arc<dyn LedgerGateway>,
    disputes: Arc<DisputeService>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    config: TimeoutConfig,
}

impl MintService {
    pub fn new(
        store: Arc<MemoryStore>,
        ledger: Arc<dyn LedgerGateway>,
        disputes: Arc<DisputeService>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: TimeoutConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            disputes,
            notifier,
            clock,
            config,
        }
    }

    /// Create a mint request: the user has picked an agent and an amount and
    /// now has one policy window to pay fiat and submit proof.
    pub async fn create(
        &self,
        user_id: Uuid,
        agent_id: Uuid,
        amount: i64,
        token_type: TokenType,
    ) -> EngineResult<MintRequest> {
        if amount <= 0 {
            return Err(EngineError::InvalidAmount(amount));
        }

        let now = self.clock.now();
        let request = MintRequest {
            id: Uuid::new_v4(),
            user_id,
            agent_id,
            amount,
            token_type,
            status: MintStatus::Pending,
            payment_proof_url: None,
            user_bank_reference: None,
            reject_reason: None,
            escrow_id: None,
            created_at: now,
            expires_at: now + self.config.mint_window(),
        };
        self.store.insert_mint(request.clone()).await;

        info!(
            request_id = %request.id,
            user_id = %user_id,
            agent_id = %agent_id,
            amount = amount,
            token = %token_type,
            "mint request created"
        );
        self.notifier.notify(EngineEvent::MintRequestCreated {
            request_id: request.id,
            user_id,
            agent_id,
        });
        Ok(request)
    }

    /// User attaches proof of the fiat payment. Only legal from `Pending`.
    pub async fn submit_proof(
        &self,
        request_id: Uuid,
        proof_url: String,
        bank_reference: Option<String>,
    ) -> EngineResult<MintRequest> {
        let row = self.store.mint_row(request_id).await?;
        let mut request = row.lock().await;

        if request.status != MintStatus::Pending {
            return Err(EngineError::invalid_state(
                "mint request",
                request_id,
                request.status,
            ));
        }

        request.status = MintStatus::ProofSubmitted;
        request.payment_proof_url = Some(proof_url);
        request.user_bank_reference = bank_reference;

        info!(request_id = %request_id, "mint payment proof submitted");
        self.notifier.notify(EngineEvent::MintProofSubmitted {
            request_id,
            agent_id: request.agent_id,
        });
        Ok(request.clone())
    }

    /// Agent confirms the fiat arrived: tokens are minted to the user, then
    /// the request completes. Only legal from `ProofSubmitted`. A gateway
    /// failure leaves the request in `ProofSubmitted` for a retry.
    pub async fn confirm(&self, request_id: Uuid) -> EngineResult<MintRequest> {
        let row = self.store.mint_row(request_id).await?;
        let mut request = row.lock().await;

        if request.status != MintStatus::ProofSubmitted {
            return Err(EngineError::invalid_state(
                "mint request",
                request_id,
                request.status,
            ));
        }

        ledger_call(&self.config, "mint", request_id, || {
            self.ledger
                .mint(request.user_id, request.amount, request.token_type)
        })
        .await?;

        request.status = MintStatus::Confirmed;

        info!(
            request_id = %request_id,
            user_id = %request.user_id,
            amount = request.amount,
            "mint request confirmed, tokens minted"
        );
        self.notifier.notify(EngineEvent::MintConfirmed {
            request_id,
            user_id: request.user_id,
        });
        Ok(request.clone())
    }

    /// Agent declines the request. Legal from `Pending` or `ProofSubmitted`;
    /// no funds have moved on-platform either way.
    pub async fn reject(&self, request_id: Uuid, reason: String) -> EngineResult<MintRequest> {
        let row = self.store.mint_row(request_id).await?;
        let mut request = row.lock().await;

        if !matches!(
            request.status,
            MintStatus::Pending | MintStatus::ProofSubmitted
        ) {
            return Err(EngineError::invalid_state(
                "mint request",
                request_id,
                request.status,
            ));
        }

        request.status = MintStatus::Rejected;
        request.reject_reason = Some(reason);

        info!(request_id = %request_id, "mint request rejected");
        self.notifier.notify(EngineEvent::MintRejected {
            request_id,
            user_id: request.user_id,
        });
        Ok(request.clone())
    }

    /// Sweep entry point: expire a `Pending` request whose deadline passed.
    /// No funds are involved before proof, so expiry is quiet and final.
    pub async fn expire(&self, request_id: Uuid) -> EngineResult<()> {
        let row = self.store.mint_row(request_id).await?;
        let mut request = row.lock().await;

        let now = self.clock.now();
        if request.status != MintStatus::Pending || !request.is_expired(now) {
            return Err(EngineError::invalid_state(
                "mint request",
                request_id,
                request.status,
            ));
        }

        request.status = MintStatus::Expired;

        info!(request_id = %request_id, "mint request expired, no proof submitted");
        self.notifier.notify(EngineEvent::MintExpired {
            request_id,
            user_id: request.user_id,
        });
        Ok(())
    }

    /// Sweep entry point: a `ProofSubmitted` request whose deadline passed is
    /// escalated to a dispute: the agent neither confirmed nor rejected and
    /// the user claims to have paid.
    pub async fn auto_dispute(&self, request_id: Uuid) -> EngineResult<()> {
        let row = self.store.mint_row(request_id).await?;
        let mut request = row.lock().await;

        let now = self.clock.now();
        if request.status != MintStatus::ProofSubmitted || !request.is_expired(now) {
            return Err(EngineError::invalid_state(
                "mint request",
                request_id,
                request.status,
            ));
        }

        let details = format!(
            "Agent did not act on submitted proof before the deadline. Payment proof: {}",
            request.payment_proof_url.as_deref().unwrap_or("None")
        );
        self.disputes
            .open(
                DisputeLink::mint(request_id, request.escrow_id),
                DisputeOpener::System,
                request.agent_id,
                DisputeReason::AutoExpired,
                details,
            )
            .await?;

        request.status = MintStatus::Disputed;

        info!(request_id = %request_id, "mint request auto-disputed after deadline");
        Ok(())
    }
}
