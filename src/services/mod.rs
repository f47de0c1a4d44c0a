//! Lifecycle services
//!
//! Each service owns one concern: escrow holds, mint requests, burn requests,
//! disputes, and the periodic reconciliation sweep. Services share the store
//! and the external seams (ledger gateway, notifier, clock) behind `Arc`s.

pub mod burn;
pub mod dispute;
pub mod escrow;
pub mod mint;
pub mod reconciler;

pub use burn::BurnService;
pub use dispute::DisputeService;
pub use escrow::EscrowManager;
pub use mint::MintService;
pub use reconciler::{ReconciliationScheduler, SweepReport};

use std::future::Future;

use tracing::warn;
use uuid::Uuid;

use crate::config::TimeoutConfig;
use crate::error::{EngineError, EngineResult};
use crate::ledger::LedgerError;

/// Drive one ledger gateway call to acknowledgement.
///
/// Calls are bounded by the configured timeout and retried up to the
/// configured attempt count. Retrying is safe because gateway operations are
/// idempotent per hold id; a call that succeeded on the gateway but timed out
/// on our side is simply acknowledged on the next attempt. Exhausted attempts
/// surface `LedgerUnavailable` with local state untouched, so the caller or
/// the next sweep can retry the whole operation.
pub(crate) async fn ledger_call<F, Fut>(
    config: &TimeoutConfig,
    op: &'static str,
    hold_id: Uuid,
    make_call: F,
) -> EngineResult<()>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<(), LedgerError>>,
{
    let attempts = config.ledger_retry_attempts.max(1);
    for attempt in 1..=attempts {
        match tokio::time::timeout(config.ledger_timeout(), make_call()).await {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(LedgerError::Unavailable(reason))) => {
                warn!(
                    op = op,
                    hold_id = %hold_id,
                    attempt = attempt,
                    attempts = attempts,
                    reason = %reason,
                    "ledger call failed"
                );
            }
            Err(_) => {
                warn!(
                    op = op,
                    hold_id = %hold_id,
                    attempt = attempt,
                    attempts = attempts,
                    timeout_secs = config.ledger_timeout_secs,
                    "ledger call timed out"
                );
            }
        }
    }
    Err(EngineError::LedgerUnavailable(format!(
        "{op} for hold {hold_id} did not succeed after {attempts} attempts"
    )))
}
