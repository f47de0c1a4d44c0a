//! Burn request model
//!
//! A user redeeming tokens for fiat: the user's tokens are escrowed, the
//! agent pays fiat off-platform, and the user's confirmation of receipt
//! releases the escrow to the agent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::bank_account::BankAccount;
use super::token::TokenType;

/// Burn request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BurnStatus {
    /// Created but tokens not yet locked (ledger lock failed or not attempted)
    Pending,
    /// User's tokens locked in escrow; waiting for the agent to pay fiat
    Escrowed,
    /// Agent marked the fiat payout sent; waiting for the user to confirm
    FiatSent,
    /// User confirmed receipt; escrow released to the agent (terminal)
    Confirmed,
    /// Agent declined before paying; escrow refunded if one was taken (terminal)
    Rejected,
    /// Deadline passed before the agent acted; escrow refunded (terminal)
    Expired,
    /// Escalated to arbitration
    Disputed,
}

impl BurnStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BurnStatus::Confirmed | BurnStatus::Rejected | BurnStatus::Expired
        )
    }

    /// Valid next states. `FiatSent` never expires to `Expired`: the agent
    /// claims to have paid, so the deadline escalates to a dispute instead of
    /// a unilateral refund.
    pub fn valid_transitions(&self) -> Vec<BurnStatus> {
        use BurnStatus::*;
        match self {
            Pending => vec![Escrowed, Rejected, Expired],
            Escrowed => vec![FiatSent, Rejected, Expired, Disputed],
            FiatSent => vec![Confirmed, Disputed],
            Disputed => vec![],
            Confirmed => vec![],
            Rejected => vec![],
            Expired => vec![],
        }
    }

    pub fn can_transition(&self, to: BurnStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BurnStatus::Pending => "pending",
            BurnStatus::Escrowed => "escrowed",
            BurnStatus::FiatSent => "fiat_sent",
            BurnStatus::Confirmed => "confirmed",
            BurnStatus::Rejected => "rejected",
            BurnStatus::Expired => "expired",
            BurnStatus::Disputed => "disputed",
        }
    }
}

impl std::fmt::Display for BurnStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's request to redeem tokens for fiat via an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurnRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub agent_id: Uuid,
    pub amount: i64,
    pub token_type: TokenType,
    pub status: BurnStatus,
    /// Hold on the user's tokens; set once the request reaches `Escrowed`
    pub escrow_id: Option<Uuid>,
    /// Reference the agent quoted for the fiat payout
    pub agent_bank_reference: Option<String>,
    /// URL of the agent's payout proof
    pub fiat_proof_url: Option<String>,
    /// Where the agent sends fiat
    pub user_bank_account: BankAccount,
    pub reject_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl BurnRequest {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
