//! Typed error taxonomy for engine operations
//!
//! Every lifecycle operation validates its preconditions and fails fast with
//! one of these variants. Nothing is persisted on failure, so callers can
//! surface the error unchanged and retry where it makes sense.

use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by escrow, request and dispute operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// Amount must be strictly positive
    #[error("invalid amount {0}: must be greater than zero")]
    InvalidAmount(i64),

    /// The operation is not legal from the entity's current status.
    ///
    /// This is also what the loser of a race observes: two concurrent callers
    /// (say an agent confirming while the sweep expires) both acquire the row
    /// lock in turn; the second one finds the status already changed.
    #[error("{entity} {id} is '{status}': operation not permitted")]
    InvalidState {
        entity: &'static str,
        id: Uuid,
        status: String,
    },

    /// Payout destination failed shape validation
    #[error("invalid bank account: {0}")]
    InvalidBankAccount(&'static str),

    /// An unresolved dispute already exists for this escrow or request
    #[error("an unresolved dispute already exists for {0}")]
    AlreadyDisputed(Uuid),

    /// Ledger gateway could not be reached or did not acknowledge in time.
    /// Transient: state was left unchanged and the call may be retried by the
    /// caller or by the next reconciliation sweep.
    #[error("ledger gateway unavailable: {0}")]
    LedgerUnavailable(String),

    /// No entity with this id exists
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },
}

impl EngineError {
    /// Returns true if this error is transient and the operation should be
    /// retried (by the caller or the next sweep)
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::LedgerUnavailable(_))
    }

    pub(crate) fn not_found(entity: &'static str, id: Uuid) -> Self {
        EngineError::NotFound { entity, id }
    }

    pub(crate) fn invalid_state(entity: &'static str, id: Uuid, status: impl ToString) -> Self {
        EngineError::InvalidState {
            entity,
            id,
            status: status.to_string(),
        }
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
