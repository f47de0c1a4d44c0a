//! Burn request state machine
//!
//! PENDING → ESCROWED → FIAT_SENT → CONFIRMED. The user's tokens go into
//! escrow up front; the agent then pays fiat off-platform and the user's
//! receipt confirmation releases the escrow to the agent. An escrow the agent
//! never acted on is safe to auto-refund; once the agent claims to have paid,
//! only a dispute can take the funds either way.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::TimeoutConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    BankAccount, BurnRequest, BurnStatus, DisputeLink, DisputeOpener, DisputeReason, TokenType,
};
use crate::notify::{EngineEvent, Notifier};
use crate::store::MemoryStore;

use super::{DisputeService, EscrowManager};

/// Drives burn requests through their lifecycle
pub struct BurnService {
    store: Arc<MemoryStore>,
    escrows: Arc<EscrowManager>,
    disputes: Arc<DisputeService>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    config: TimeoutConfig,
}

impl BurnService {
    pub fn new(
        store: Arc<MemoryStore>,
        escrows: Arc<EscrowManager>,
        disputes: Arc<DisputeService>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: TimeoutConfig,
    ) -> Self {
        Self {
            store,
            escrows,
            disputes,
            notifier,
            clock,
            config,
        }
    }

    /// Create a burn request and immediately attempt to lock the user's
    /// tokens. If the ledger is unavailable the request is still created and
    /// stays `Pending`; [`BurnService::retry_escrow`] re-attempts the lock.
    pub async fn create(
        &self,
        user_id: Uuid,
        agent_id: Uuid,
        amount: i64,
        token_type: TokenType,
        bank_account: BankAccount,
    ) -> EngineResult<BurnRequest> {
        if amount <= 0 {
            return Err(EngineError::InvalidAmount(amount));
        }
        bank_account.validate()?;

        let now = self.clock.now();
        let request = BurnRequest {
            id: Uuid::new_v4(),
            user_id,
            agent_id,
            amount,
            token_type,
            status: BurnStatus::Pending,
            escrow_id: None,
            agent_bank_reference: None,
            fiat_proof_url: None,
            user_bank_account: bank_account,
            reject_reason: None,
            created_at: now,
            expires_at: now + self.config.burn_escrow_ttl(),
        };
        let request_id = request.id;
        self.store.insert_burn(request).await;

        info!(
            request_id = %request_id,
            user_id = %user_id,
            agent_id = %agent_id,
            amount = amount,
            token = %token_type,
            "burn request created"
        );
        self.notifier.notify(EngineEvent::BurnRequestCreated {
            request_id,
            user_id,
            agent_id,
        });

        match self.try_lock_escrow(request_id).await {
            Ok(request) => Ok(request),
            Err(err) if err.is_transient() => {
                warn!(
                    request_id = %request_id,
                    error = %err,
                    "escrow lock failed, burn request left pending for retry"
                );
                self.store.burn(request_id).await
            }
            Err(err) => Err(err),
        }
    }

    /// Re-attempt the escrow lock for a request stuck in `Pending` after a
    /// ledger outage.
    pub async fn retry_escrow(&self, request_id: Uuid) -> EngineResult<BurnRequest> {
        self.try_lock_escrow(request_id).await
    }

    async fn try_lock_escrow(&self, request_id: Uuid) -> EngineResult<BurnRequest> {
        let row = self.store.burn_row(request_id).await?;
        let mut request = row.lock().await;

        if request.status != BurnStatus::Pending {
            return Err(EngineError::invalid_state(
                "burn request",
                request_id,
                request.status,
            ));
        }

        let escrow = self
            .escrows
            .lock(
                request.user_id,
                request.agent_id,
                request.amount,
                request.token_type,
                self.config.burn_escrow_ttl(),
            )
            .await?;

        request.status = BurnStatus::Escrowed;
        request.escrow_id = Some(escrow.id);
        // Deadline restarts from the lock, not from request creation
        request.expires_at = escrow.expires_at;

        info!(
            request_id = %request_id,
            escrow_id = %escrow.id,
            "burn request escrowed"
        );
        self.notifier.notify(EngineEvent::BurnEscrowed {
            request_id,
            escrow_id: escrow.id,
        });
        Ok(request.clone())
    }

    /// Agent marks the fiat payout sent, with their transfer reference and
    /// proof. Only legal from `Escrowed`. The confirmation deadline restarts
    /// so the user has a full window to confirm receipt.
    pub async fn mark_fiat_sent(
        &self,
        request_id: Uuid,
        agent_reference: String,
        proof_url: String,
    ) -> EngineResult<BurnRequest> {
        let row = self.store.burn_row(request_id).await?;
        let mut request = row.lock().await;

        if request.status != BurnStatus::Escrowed {
            return Err(EngineError::invalid_state(
                "burn request",
                request_id,
                request.status,
            ));
        }

        request.status = BurnStatus::FiatSent;
        request.agent_bank_reference = Some(agent_reference);
        request.fiat_proof_url = Some(proof_url);
        request.expires_at = self.clock.now() + self.config.fiat_confirmation_window();

        info!(request_id = %request_id, "burn fiat payout marked sent");
        self.notifier.notify(EngineEvent::BurnFiatSent {
            request_id,
            user_id: request.user_id,
        });
        Ok(request.clone())
    }

    /// User confirms the fiat arrived: the escrow is released to the agent
    /// and the request completes. Only legal from `FiatSent`.
    pub async fn confirm_receipt(&self, request_id: Uuid) -> EngineResult<BurnRequest> {
        let row = self.store.burn_row(request_id).await?;
        let mut request = row.lock().await;

        if request.status != BurnStatus::FiatSent {
            return Err(EngineError::invalid_state(
                "burn request",
                request_id,
                request.status,
            ));
        }
        let escrow_id = request.escrow_id.ok_or_else(|| {
            EngineError::invalid_state("burn request", request_id, "fiat_sent without escrow")
        })?;

        self.escrows.release(escrow_id, request.agent_id).await?;

        request.status = BurnStatus::Confirmed;

        info!(
            request_id = %request_id,
            escrow_id = %escrow_id,
            agent_id = %request.agent_id,
            "burn confirmed, escrow released to agent"
        );
        self.notifier.notify(EngineEvent::BurnConfirmed {
            request_id,
            agent_id: request.agent_id,
        });
        Ok(request.clone())
    }

    /// Open a dispute on a burn request (user action, or the sweep via
    /// [`BurnService::auto_dispute`]). Legal from `Escrowed` or `FiatSent`.
    pub async fn open_dispute(
        &self,
        request_id: Uuid,
        opened_by: DisputeOpener,
        reason: DisputeReason,
        details: String,
    ) -> EngineResult<BurnRequest> {
        let row = self.store.burn_row(request_id).await?;
        let mut request = row.lock().await;
        self.dispute_locked(&mut request, opened_by, reason, details)
            .await?;
        Ok(request.clone())
    }

    /// Agent declines a burn before paying fiat. Legal from `Pending` or
    /// `Escrowed`; an escrowed reject refunds the user's tokens first.
    pub async fn reject(&self, request_id: Uuid, reason: String) -> EngineResult<BurnRequest> {
        let row = self.store.burn_row(request_id).await?;
        let mut request = row.lock().await;

        match request.status {
            BurnStatus::Pending => {}
            BurnStatus::Escrowed => {
                let escrow_id = request.escrow_id.ok_or_else(|| {
                    EngineError::invalid_state(
                        "burn request",
                        request_id,
                        "escrowed without escrow",
                    )
                })?;
                self.escrows
                    .refund(escrow_id, "agent_rejected", Some(reason.clone()))
                    .await?;
            }
            status => {
                return Err(EngineError::invalid_state(
                    "burn request",
                    request_id,
                    status,
                ));
            }
        }

        request.status = BurnStatus::Rejected;
        request.reject_reason = Some(reason);

        info!(request_id = %request_id, "burn request rejected by agent");
        self.notifier.notify(EngineEvent::BurnRejected {
            request_id,
            user_id: request.user_id,
        });
        Ok(request.clone())
    }

    /// Sweep entry point: an `Escrowed` request past its deadline means the
    /// agent never claimed to have paid, so returning the tokens is safe. The
    /// escrow refund must succeed before the request expires; on a transient
    /// failure the request stays `Escrowed` and the next sweep retries.
    pub async fn expire(&self, request_id: Uuid) -> EngineResult<()> {
        let row = self.store.burn_row(request_id).await?;
        let mut request = row.lock().await;

        let now = self.clock.now();
        if request.status != BurnStatus::Escrowed || !request.is_expired(now) {
            return Err(EngineError::invalid_state(
                "burn request",
                request_id,
                request.status,
            ));
        }
        let escrow_id = request.escrow_id.ok_or_else(|| {
            EngineError::invalid_state("burn request", request_id, "escrowed without escrow")
        })?;

        self.escrows.refund(escrow_id, "auto_expired", None).await?;

        request.status = BurnStatus::Expired;

        info!(
            request_id = %request_id,
            escrow_id = %escrow_id,
            "burn request expired, escrow auto-refunded"
        );
        self.notifier.notify(EngineEvent::BurnExpired {
            request_id,
            user_id: request.user_id,
        });
        Ok(())
    }

    /// Sweep entry point: a `FiatSent` request past its deadline cannot be
    /// refunded unilaterally, since the agent may genuinely have paid. It
    /// goes to arbitration instead.
    pub async fn auto_dispute(&self, request_id: Uuid) -> EngineResult<()> {
        let row = self.store.burn_row(request_id).await?;
        let mut request = row.lock().await;

        let now = self.clock.now();
        if request.status != BurnStatus::FiatSent || !request.is_expired(now) {
            return Err(EngineError::invalid_state(
                "burn request",
                request_id,
                request.status,
            ));
        }

        let details = format!(
            "User did not confirm fiat receipt before the deadline. Payout proof: {}",
            request.fiat_proof_url.as_deref().unwrap_or("None")
        );
        self.dispute_locked(
            &mut request,
            DisputeOpener::System,
            DisputeReason::AutoExpired,
            details,
        )
        .await?;

        info!(request_id = %request_id, "burn request auto-disputed after deadline");
        Ok(())
    }

    async fn dispute_locked(
        &self,
        request: &mut BurnRequest,
        opened_by: DisputeOpener,
        reason: DisputeReason,
        details: String,
    ) -> EngineResult<()> {
        if !matches!(request.status, BurnStatus::Escrowed | BurnStatus::FiatSent) {
            return Err(EngineError::invalid_state(
                "burn request",
                request.id,
                request.status,
            ));
        }
        let escrow_id = request.escrow_id.ok_or_else(|| {
            EngineError::invalid_state("burn request", request.id, "disputed without escrow")
        })?;

        self.disputes
            .open(
                DisputeLink::burn(request.id, escrow_id),
                opened_by,
                request.agent_id,
                reason,
                details,
            )
            .await?;

        request.status = BurnStatus::Disputed;
        Ok(())
    }
}
