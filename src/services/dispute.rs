//! Dispute manager
//!
//! Opens and resolves arbitration records when the cooperative protocol
//! between user and agent breaks down. At most one unresolved dispute exists
//! per escrow (or per mint request before any escrow is taken). Resolution is
//! deliberately NOT idempotent: replaying a financial verdict must fail
//! loudly, unlike escrow release/refund which the ledger dedupes per hold id.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    dispute::MAX_ESCALATION_LEVEL, Dispute, DisputeLink, DisputeOpener, DisputeReason,
    DisputeStatus, Resolution,
};
use crate::notify::{EngineEvent, Notifier};
use crate::store::MemoryStore;

use super::EscrowManager;

/// Manages dispute records and drives linked escrows on resolution
pub struct DisputeService {
    store: Arc<MemoryStore>,
    escrows: Arc<EscrowManager>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl DisputeService {
    pub fn new(
        store: Arc<MemoryStore>,
        escrows: Arc<EscrowManager>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            escrows,
            notifier,
            clock,
        }
    }

    /// Open a dispute against an escrow and/or request.
    ///
    /// Fails `AlreadyDisputed` when an unresolved dispute exists for the same
    /// subject. When an escrow is linked it is frozen via
    /// [`EscrowManager::mark_disputed`] before the record is persisted.
    pub async fn open(
        &self,
        link: DisputeLink,
        opened_by: DisputeOpener,
        agent_id: Uuid,
        reason: DisputeReason,
        details: String,
    ) -> EngineResult<Dispute> {
        if let Some(escrow_id) = link.escrow_id {
            if let Some(existing) = self.store.unresolved_dispute_for_escrow(escrow_id).await {
                info!(
                    escrow_id = %escrow_id,
                    dispute_id = %existing.id,
                    "dispute open rejected: unresolved dispute exists"
                );
                return Err(EngineError::AlreadyDisputed(escrow_id));
            }
        }
        if let Some(mint_id) = link.mint_request_id {
            if self.store.unresolved_dispute_for_mint(mint_id).await.is_some() {
                return Err(EngineError::AlreadyDisputed(mint_id));
            }
        }

        if let Some(escrow_id) = link.escrow_id {
            self.escrows.mark_disputed(escrow_id).await?;
        }

        let dispute = Dispute {
            id: Uuid::new_v4(),
            link,
            opened_by,
            agent_id,
            reason,
            details,
            status: DisputeStatus::Open,
            escalation_level: 1,
            resolution: None,
            resolved_by: None,
            resolution_notes: None,
            created_at: self.clock.now(),
            resolved_at: None,
        };
        self.store.insert_dispute(dispute.clone()).await;

        info!(
            dispute_id = %dispute.id,
            escrow_id = ?link.escrow_id,
            reason = reason.as_str(),
            "dispute opened"
        );
        self.notifier.notify(EngineEvent::DisputeOpened {
            dispute_id: dispute.id,
            escrow_id: link.escrow_id,
            reason,
        });
        Ok(dispute)
    }

    /// Resolve a dispute: `Release` pays the escrow out to the agent,
    /// `Refund` returns it to the user. Drives the linked escrow first, then
    /// marks the dispute resolved, so a gateway failure leaves the dispute
    /// open and retryable with nothing half-committed.
    ///
    /// Resolving an already-resolved dispute fails `InvalidState`.
    pub async fn resolve(
        &self,
        dispute_id: Uuid,
        resolution: Resolution,
        resolved_by: Uuid,
        notes: Option<String>,
    ) -> EngineResult<Dispute> {
        let row = self.store.dispute_row(dispute_id).await?;
        let mut dispute = row.lock().await;

        if dispute.status == DisputeStatus::Resolved {
            return Err(EngineError::invalid_state(
                "dispute",
                dispute_id,
                dispute.status,
            ));
        }

        if let Some(escrow_id) = dispute.link.escrow_id {
            let escrow = self.store.escrow(escrow_id).await?;
            match resolution {
                Resolution::Release => {
                    self.escrows
                        .release_disputed(escrow_id, escrow.agent_id)
                        .await?;
                }
                Resolution::Refund => {
                    self.escrows
                        .refund_disputed(escrow_id, "dispute_refund", notes.clone())
                        .await?;
                }
            }
        }

        dispute.status = DisputeStatus::Resolved;
        dispute.resolution = Some(resolution);
        dispute.resolved_by = Some(resolved_by);
        dispute.resolution_notes = notes;
        dispute.resolved_at = Some(self.clock.now());

        info!(
            dispute_id = %dispute_id,
            resolution = resolution.as_str(),
            resolved_by = %resolved_by,
            "dispute resolved"
        );
        self.notifier.notify(EngineEvent::DisputeResolved {
            dispute_id,
            resolution,
        });
        Ok(dispute.clone())
    }

    /// Bump the dispute one arbitration level (max 3). Which role may resolve
    /// at each level is the authorization collaborator's concern.
    pub async fn escalate(&self, dispute_id: Uuid) -> EngineResult<Dispute> {
        let row = self.store.dispute_row(dispute_id).await?;
        let mut dispute = row.lock().await;

        if dispute.status == DisputeStatus::Resolved {
            return Err(EngineError::invalid_state(
                "dispute",
                dispute_id,
                dispute.status,
            ));
        }
        if dispute.escalation_level >= MAX_ESCALATION_LEVEL {
            return Err(EngineError::invalid_state(
                "dispute",
                dispute_id,
                format!("escalated (level {})", dispute.escalation_level),
            ));
        }

        dispute.escalation_level += 1;
        dispute.status = DisputeStatus::Escalated;

        info!(
            dispute_id = %dispute_id,
            escalation_level = dispute.escalation_level,
            "dispute escalated"
        );
        self.notifier.notify(EngineEvent::DisputeEscalated {
            dispute_id,
            escalation_level: dispute.escalation_level,
        });
        Ok(dispute.clone())
    }
}
