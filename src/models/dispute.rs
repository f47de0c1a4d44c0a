//! Dispute model
//!
//! An arbitration record tied to one escrow and/or one request. Opened by a
//! user or by the reconciliation sweep when the cooperative protocol breaks
//! down; resolved by an authorized arbiter into release-to-agent or
//! refund-to-user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Dispute status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    Open,
    /// Bumped to a higher arbitration level; still awaiting resolution
    Escalated,
    /// Terminal. Financial resolutions are never replayed.
    Resolved,
}

impl DisputeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DisputeStatus::Resolved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DisputeStatus::Open => "open",
            DisputeStatus::Escalated => "escalated",
            DisputeStatus::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the dispute was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeReason {
    /// Opened by the reconciliation sweep on a timed-out request
    AutoExpired,
    PaymentNotReceived,
    PaymentNotConfirmed,
    WrongAmount,
    Other,
}

impl DisputeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisputeReason::AutoExpired => "auto_expired",
            DisputeReason::PaymentNotReceived => "payment_not_received",
            DisputeReason::PaymentNotConfirmed => "payment_not_confirmed",
            DisputeReason::WrongAmount => "wrong_amount",
            DisputeReason::Other => "other",
        }
    }
}

/// Who opened the dispute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeOpener {
    User(Uuid),
    /// The reconciliation sweep
    System,
}

/// Arbiter's verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Return escrowed funds to the user
    Refund,
    /// Pay the escrowed funds out to the agent
    Release,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Refund => "refund",
            Resolution::Release => "release",
        }
    }
}

/// What a dispute is attached to. At least one field is always set; a burn
/// dispute links both the request and its escrow, a pre-escrow mint dispute
/// links only the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeLink {
    pub escrow_id: Option<Uuid>,
    pub mint_request_id: Option<Uuid>,
    pub burn_request_id: Option<Uuid>,
}

impl DisputeLink {
    pub fn escrow(escrow_id: Uuid) -> Self {
        Self {
            escrow_id: Some(escrow_id),
            ..Default::default()
        }
    }

    pub fn burn(burn_request_id: Uuid, escrow_id: Uuid) -> Self {
        Self {
            escrow_id: Some(escrow_id),
            burn_request_id: Some(burn_request_id),
            ..Default::default()
        }
    }

    pub fn mint(mint_request_id: Uuid, escrow_id: Option<Uuid>) -> Self {
        Self {
            escrow_id,
            mint_request_id: Some(mint_request_id),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.escrow_id.is_none() && self.mint_request_id.is_none() && self.burn_request_id.is_none()
    }
}

/// Maximum escalation level (senior arbiter)
pub const MAX_ESCALATION_LEVEL: u8 = 3;

/// An arbitration record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispute {
    pub id: Uuid,
    pub link: DisputeLink,
    pub opened_by: DisputeOpener,
    pub agent_id: Uuid,
    pub reason: DisputeReason,
    pub details: String,
    pub status: DisputeStatus,
    /// 1..=3; which arbiter role may resolve is enforced by the
    /// authorization collaborator, not here
    pub escalation_level: u8,
    pub resolution: Option<Resolution>,
    pub resolved_by: Option<Uuid>,
    pub resolution_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}
