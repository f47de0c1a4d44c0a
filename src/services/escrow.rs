//! Escrow manager
//!
//! Wraps the ledger gateway's lock/release/refund with status bookkeeping and
//! expiry metadata. The gateway call and the local status write happen under
//! the escrow's row lock, so from the engine's perspective they commit
//! together: at-least-once gateway call (idempotent per hold id), at-most-once
//! state transition.

use std::sync::Arc;

use chrono::Duration;
use tracing::info;
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::TimeoutConfig;
use crate::error::{EngineError, EngineResult};
use crate::ledger::LedgerGateway;
use crate::models::{Escrow, EscrowStatus, TokenType};
use crate::notify::{EngineEvent, Notifier};
use crate::store::MemoryStore;

use super::ledger_call;

/// Manages escrow holds and their state transitions
pub struct EscrowManager {
    store: Arc<MemoryStore>,
    ledger: Arc<dyn LedgerGateway>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    config: TimeoutConfig,
}

impl EscrowManager {
    pub fn new(
        store: Arc<MemoryStore>,
        ledger: Arc<dyn LedgerGateway>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: TimeoutConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            notifier,
            clock,
            config,
        }
    }

    /// Take a hold of `amount` tokens from `owner_id`, pending resolution
    /// toward `agent_id`.
    ///
    /// All-or-nothing: if the gateway does not acknowledge the lock, no
    /// escrow record is created.
    pub async fn lock(
        &self,
        owner_id: Uuid,
        agent_id: Uuid,
        amount: i64,
        token_type: TokenType,
        ttl: Duration,
    ) -> EngineResult<Escrow> {
        if amount <= 0 {
            return Err(EngineError::InvalidAmount(amount));
        }

        let escrow_id = Uuid::new_v4();
        ledger_call(&self.config, "lock", escrow_id, || {
            self.ledger.lock(escrow_id, owner_id, amount, token_type)
        })
        .await?;

        let now = self.clock.now();
        let escrow = Escrow {
            id: escrow_id,
            owner_id,
            agent_id,
            amount,
            token_type,
            status: EscrowStatus::Locked,
            refund_reason: None,
            notes: None,
            created_at: now,
            expires_at: now + ttl,
        };
        self.store.insert_escrow(escrow.clone()).await;

        info!(
            escrow_id = %escrow_id,
            owner_id = %owner_id,
            agent_id = %agent_id,
            amount = amount,
            token = %token_type,
            "escrow locked"
        );
        Ok(escrow)
    }

    /// Pay the held amount out to `to_owner` and complete the hold.
    ///
    /// Only legal from `Locked`. Idempotent: a second call on an
    /// already-completed escrow is a no-op, so retries are safe.
    pub async fn release(&self, escrow_id: Uuid, to_owner: Uuid) -> EngineResult<()> {
        self.do_release(escrow_id, to_owner, false).await
    }

    /// Release on behalf of a dispute resolution; also legal from `Disputed`.
    pub(crate) async fn release_disputed(&self, escrow_id: Uuid, to_owner: Uuid) -> EngineResult<()> {
        self.do_release(escrow_id, to_owner, true).await
    }

    async fn do_release(
        &self,
        escrow_id: Uuid,
        to_owner: Uuid,
        from_dispute: bool,
    ) -> EngineResult<()> {
        let row = self.store.escrow_row(escrow_id).await?;
        let mut escrow = row.lock().await;

        match escrow.status {
            EscrowStatus::Completed => {
                info!(escrow_id = %escrow_id, "escrow already completed, release is a no-op");
                return Ok(());
            }
            EscrowStatus::Locked => {}
            EscrowStatus::Disputed if from_dispute => {}
            status => {
                return Err(EngineError::invalid_state("escrow", escrow_id, status));
            }
        }

        ledger_call(&self.config, "release", escrow_id, || {
            self.ledger.release(escrow_id, to_owner)
        })
        .await?;

        escrow.status = EscrowStatus::Completed;
        info!(escrow_id = %escrow_id, to_owner = %to_owner, "escrow released");
        self.notifier.notify(EngineEvent::EscrowReleased {
            escrow_id,
            to_owner,
        });
        Ok(())
    }

    /// Return the held amount to its originator and refund the hold.
    ///
    /// Only legal from `Locked`. Idempotent like `release`.
    pub async fn refund(
        &self,
        escrow_id: Uuid,
        reason: &str,
        notes: Option<String>,
    ) -> EngineResult<()> {
        self.do_refund(escrow_id, reason, notes, false).await
    }

    /// Refund on behalf of a dispute resolution; also legal from `Disputed`.
    pub(crate) async fn refund_disputed(
        &self,
        escrow_id: Uuid,
        reason: &str,
        notes: Option<String>,
    ) -> EngineResult<()> {
        self.do_refund(escrow_id, reason, notes, true).await
    }

    async fn do_refund(
        &self,
        escrow_id: Uuid,
        reason: &str,
        notes: Option<String>,
        from_dispute: bool,
    ) -> EngineResult<()> {
        let row = self.store.escrow_row(escrow_id).await?;
        let mut escrow = row.lock().await;

        match escrow.status {
            EscrowStatus::Refunded => {
                info!(escrow_id = %escrow_id, "escrow already refunded, refund is a no-op");
                return Ok(());
            }
            EscrowStatus::Locked => {}
            EscrowStatus::Disputed if from_dispute => {}
            status => {
                return Err(EngineError::invalid_state("escrow", escrow_id, status));
            }
        }

        ledger_call(&self.config, "refund", escrow_id, || {
            self.ledger.refund(escrow_id)
        })
        .await?;

        let owner_id = escrow.owner_id;
        escrow.status = EscrowStatus::Refunded;
        escrow.refund_reason = Some(reason.to_string());
        escrow.notes = notes;
        info!(escrow_id = %escrow_id, owner_id = %owner_id, reason = reason, "escrow refunded");
        self.notifier.notify(EngineEvent::EscrowRefunded {
            escrow_id,
            owner_id,
        });
        Ok(())
    }

    /// Freeze a hold pending arbitration. No funds movement: the hold stays
    /// on the ledger until the dispute resolves to release or refund.
    pub async fn mark_disputed(&self, escrow_id: Uuid) -> EngineResult<()> {
        let row = self.store.escrow_row(escrow_id).await?;
        let mut escrow = row.lock().await;

        if escrow.status != EscrowStatus::Locked {
            return Err(EngineError::invalid_state(
                "escrow",
                escrow_id,
                escrow.status,
            ));
        }

        escrow.status = EscrowStatus::Disputed;
        info!(escrow_id = %escrow_id, "escrow marked disputed, funds remain held");
        Ok(())
    }
}
