//! Notification seam
//!
//! Lifecycle transitions emit fire-and-forget events for the notification
//! collaborator (push/email/websocket delivery lives elsewhere). A sink must
//! never block and its failures never fail the transition that emitted the
//! event; implementations should hand off to their own queue or task.

use uuid::Uuid;

use crate::models::{DisputeReason, Resolution};

/// Events emitted by the engine as state transitions commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    MintRequestCreated { request_id: Uuid, user_id: Uuid, agent_id: Uuid },
    MintProofSubmitted { request_id: Uuid, agent_id: Uuid },
    MintConfirmed { request_id: Uuid, user_id: Uuid },
    MintRejected { request_id: Uuid, user_id: Uuid },
    MintExpired { request_id: Uuid, user_id: Uuid },

    BurnRequestCreated { request_id: Uuid, user_id: Uuid, agent_id: Uuid },
    BurnEscrowed { request_id: Uuid, escrow_id: Uuid },
    BurnFiatSent { request_id: Uuid, user_id: Uuid },
    BurnConfirmed { request_id: Uuid, agent_id: Uuid },
    BurnRejected { request_id: Uuid, user_id: Uuid },
    BurnExpired { request_id: Uuid, user_id: Uuid },

    EscrowReleased { escrow_id: Uuid, to_owner: Uuid },
    EscrowRefunded { escrow_id: Uuid, owner_id: Uuid },

    DisputeOpened { dispute_id: Uuid, escrow_id: Option<Uuid>, reason: DisputeReason },
    DisputeEscalated { dispute_id: Uuid, escalation_level: u8 },
    DisputeResolved { dispute_id: Uuid, resolution: Resolution },
}

/// Fire-and-forget event sink
pub trait Notifier: Send + Sync {
    fn notify(&self, event: EngineEvent);
}

/// Sink that drops every event; useful for tests and batch tooling
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: EngineEvent) {}
}
