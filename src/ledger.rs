//! Ledger gateway seam
//!
//! The engine never moves tokens itself. All balance effects go through this
//! trait, implemented by the platform's wallet/ledger service. Every
//! operation is idempotent per hold id, which is what makes the engine's
//! bounded retries safe: a crash between "gateway call succeeded" and "local
//! status persisted" is repaired by retrying with the same id.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::TokenType;

/// Gateway failure. The gateway reports success or failure only, no partial
/// states.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The gateway could not be reached or did not acknowledge in time
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// External ledger/wallet service
///
/// `hold_id` is chosen by the engine (the escrow id), so the gateway can
/// deduplicate retried calls.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Take a hold of `amount` of `token` from `owner`
    async fn lock(
        &self,
        hold_id: Uuid,
        owner: Uuid,
        amount: i64,
        token: TokenType,
    ) -> Result<(), LedgerError>;

    /// Pay a held amount out to `to_owner`
    async fn release(&self, hold_id: Uuid, to_owner: Uuid) -> Result<(), LedgerError>;

    /// Return a held amount to its originator
    async fn refund(&self, hold_id: Uuid) -> Result<(), LedgerError>;

    /// Mint freshly issued tokens to `to_owner` (confirmed mint requests)
    async fn mint(&self, to_owner: Uuid, amount: i64, token: TokenType)
        -> Result<(), LedgerError>;
}
