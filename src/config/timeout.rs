//! Policy windows and scheduler timing
//!
//! All deadlines are policy values, configurable via environment variables
//! with sane defaults and bounds clamping. Out-of-range values are clamped
//! (with a warning) rather than rejected, so a bad deployment variable
//! degrades instead of preventing startup.

use std::env;
use std::time::Duration;

/// Default window for a user to submit payment proof on a mint request (30 min)
pub const DEFAULT_MINT_WINDOW_SECS: u64 = 30 * 60;

/// Default lifetime of a burn escrow hold before the sweep refunds it (30 min)
pub const DEFAULT_BURN_ESCROW_TTL_SECS: u64 = 30 * 60;

/// Default window for the user to confirm fiat receipt after the agent marks
/// it sent (60 min)
pub const DEFAULT_FIAT_CONFIRMATION_WINDOW_SECS: u64 = 60 * 60;

/// Default reconciliation sweep interval (5 min)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5 * 60;

/// Minimum sweep interval. Below this the sweep would contend with itself.
pub const MIN_POLL_INTERVAL_SECS: u64 = 10;

/// Default per-call ledger gateway timeout
pub const DEFAULT_LEDGER_TIMEOUT_SECS: u64 = 10;

/// Maximum per-call ledger gateway timeout
pub const MAX_LEDGER_TIMEOUT_SECS: u64 = 60;

/// Default number of ledger gateway attempts before surfacing
/// `LedgerUnavailable` (retries are safe: gateway ops are idempotent per
/// hold id)
pub const DEFAULT_LEDGER_RETRY_ATTEMPTS: u32 = 3;

/// Timeout configuration (deadlines and polling intervals)
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Seconds a mint request may sit in `Pending` before it expires
    pub mint_window_secs: u64,
    /// Seconds a burn escrow stays locked before the sweep auto-refunds it
    pub burn_escrow_ttl_secs: u64,
    /// Seconds the user has to confirm receipt after `FiatSent`
    pub fiat_confirmation_window_secs: u64,
    /// Reconciliation sweep interval in seconds
    pub poll_interval_secs: u64,
    /// Per-call ledger gateway timeout in seconds
    pub ledger_timeout_secs: u64,
    /// Ledger gateway attempts per operation
    pub ledger_retry_attempts: u32,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            mint_window_secs: DEFAULT_MINT_WINDOW_SECS,
            burn_escrow_ttl_secs: DEFAULT_BURN_ESCROW_TTL_SECS,
            fiat_confirmation_window_secs: DEFAULT_FIAT_CONFIRMATION_WINDOW_SECS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            ledger_timeout_secs: DEFAULT_LEDGER_TIMEOUT_SECS,
            ledger_retry_attempts: DEFAULT_LEDGER_RETRY_ATTEMPTS,
        }
    }
}

impl TimeoutConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            mint_window_secs: read_secs("RAMP_MINT_WINDOW_SECS", defaults.mint_window_secs),
            burn_escrow_ttl_secs: read_secs(
                "RAMP_BURN_ESCROW_TTL_SECS",
                defaults.burn_escrow_ttl_secs,
            ),
            fiat_confirmation_window_secs: read_secs(
                "RAMP_FIAT_CONFIRMATION_WINDOW_SECS",
                defaults.fiat_confirmation_window_secs,
            ),
            poll_interval_secs: read_secs("RAMP_POLL_INTERVAL_SECS", defaults.poll_interval_secs)
                .max(MIN_POLL_INTERVAL_SECS),
            ledger_timeout_secs: clamp_ledger_timeout(read_secs(
                "RAMP_LEDGER_TIMEOUT_SECS",
                defaults.ledger_timeout_secs,
            )),
            ledger_retry_attempts: env::var("RAMP_LEDGER_RETRY_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(|n: u32| n.max(1))
                .unwrap_or(defaults.ledger_retry_attempts),
        }
    }

    pub fn mint_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.mint_window_secs as i64)
    }

    pub fn burn_escrow_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.burn_escrow_ttl_secs as i64)
    }

    pub fn fiat_confirmation_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.fiat_confirmation_window_secs as i64)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn ledger_timeout(&self) -> Duration {
        Duration::from_secs(self.ledger_timeout_secs)
    }
}

fn read_secs(var: &str, default: u64) -> u64 {
    env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn clamp_ledger_timeout(secs: u64) -> u64 {
    if secs == 0 {
        tracing::warn!("ledger timeout of 0s configured, using 1s");
        1
    } else if secs > MAX_LEDGER_TIMEOUT_SECS {
        tracing::warn!(
            secs = secs,
            max = MAX_LEDGER_TIMEOUT_SECS,
            "ledger timeout above maximum, clamping"
        );
        MAX_LEDGER_TIMEOUT_SECS
    } else {
        secs
    }
}
