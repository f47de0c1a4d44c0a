//! Escrow hold model
//!
//! An escrow is a hold of a fixed amount of one token taken from one owner
//! pending resolution. Once a hold leaves `Locked` it is immutable: resolved
//! holds are audit records, never re-locked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::token::TokenType;

/// Escrow hold status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowStatus {
    /// Funds held, pending resolution
    Locked,
    /// Released to the counterparty (terminal)
    Completed,
    /// Frozen pending arbitration; funds stay held
    Disputed,
    /// Returned to the originator (terminal)
    Refunded,
}

impl EscrowStatus {
    /// Check if this is a terminal (final) state
    pub fn is_terminal(&self) -> bool {
        matches!(self, EscrowStatus::Completed | EscrowStatus::Refunded)
    }

    /// Get all valid next states from the current state.
    ///
    /// `Disputed` may still resolve either way; that path is only taken by
    /// dispute resolution, never by the cooperative protocol.
    pub fn valid_transitions(&self) -> Vec<EscrowStatus> {
        use EscrowStatus::*;
        match self {
            Locked => vec![Completed, Disputed, Refunded],
            Disputed => vec![Completed, Refunded],
            Completed => vec![],
            Refunded => vec![],
        }
    }

    pub fn can_transition(&self, to: EscrowStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EscrowStatus::Locked => "locked",
            EscrowStatus::Completed => "completed",
            EscrowStatus::Disputed => "disputed",
            EscrowStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A platform-held token hold backing one request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Escrow {
    pub id: Uuid,
    /// User whose funds are held (the originator refunds go back to)
    pub owner_id: Uuid,
    /// Counterparty agent (the target of a release)
    pub agent_id: Uuid,
    pub amount: i64,
    pub token_type: TokenType,
    pub status: EscrowStatus,
    /// Why the hold was refunded, when it was (e.g. "auto_expired")
    pub refund_reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Escrow {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
