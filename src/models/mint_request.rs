//! Mint request model
//!
//! A user acquiring tokens: the user pays fiat to an agent off-platform,
//! submits proof, and the agent confirms, which mints tokens to the user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::token::TokenType;

/// Mint request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MintStatus {
    /// Created; waiting for the user's payment proof
    Pending,
    /// User submitted proof of fiat payment; waiting on the agent
    ProofSubmitted,
    /// Agent confirmed, tokens minted (terminal)
    Confirmed,
    /// Agent rejected (terminal)
    Rejected,
    /// No proof arrived before the deadline (terminal)
    Expired,
    /// Escalated to arbitration
    Disputed,
}

impl MintStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MintStatus::Confirmed | MintStatus::Rejected | MintStatus::Expired
        )
    }

    /// Valid next states. `ProofSubmitted` never expires: once proof exists
    /// only agent action or a dispute resolves the request, because the
    /// user's fiat may already have left their account.
    pub fn valid_transitions(&self) -> Vec<MintStatus> {
        use MintStatus::*;
        match self {
            Pending => vec![ProofSubmitted, Rejected, Expired],
            ProofSubmitted => vec![Confirmed, Rejected, Disputed],
            Disputed => vec![],
            Confirmed => vec![],
            Rejected => vec![],
            Expired => vec![],
        }
    }

    pub fn can_transition(&self, to: MintStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MintStatus::Pending => "pending",
            MintStatus::ProofSubmitted => "proof_submitted",
            MintStatus::Confirmed => "confirmed",
            MintStatus::Rejected => "rejected",
            MintStatus::Expired => "expired",
            MintStatus::Disputed => "disputed",
        }
    }
}

impl std::fmt::Display for MintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's request to acquire tokens via an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub agent_id: Uuid,
    pub amount: i64,
    pub token_type: TokenType,
    pub status: MintStatus,
    /// URL of the user's payment proof (receipt screenshot, transfer slip)
    pub payment_proof_url: Option<String>,
    /// Bank reference the user quoted for the fiat transfer
    pub user_bank_reference: Option<String>,
    pub reject_reason: Option<String>,
    /// Agent-liquidity hold, when the platform takes one for this request
    pub escrow_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl MintRequest {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
