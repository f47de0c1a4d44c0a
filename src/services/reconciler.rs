//! Reconciliation scheduler
//!
//! The periodic background pass that force-resolves timed-out requests. It is
//! the only actor allowed to make progress without a human action. Runs three
//! ordered passes per sweep so the side effects of one pass never feed the
//! selection of the next:
//!
//! 1. expire `Pending` mint requests (no funds involved yet), and escalate
//!    `ProofSubmitted` mint requests to disputes
//! 2. auto-refund `Escrowed` burn requests (agent never acted)
//! 3. auto-dispute `FiatSent` burn requests (agent claims to have paid)
//!
//! One broken item never stalls the batch: per-item failures are logged with
//! the request id and retried on the next sweep. Re-running a sweep over an
//! already-resolved request is a no-op because every entry point re-validates
//! its status precondition under the row lock.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::clock::Clock;
use crate::config::TimeoutConfig;
use crate::error::EngineError;
use crate::models::{BurnStatus, MintStatus};
use crate::store::MemoryStore;

use super::{BurnService, MintService};

/// Outcome of one reconciliation sweep
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Tick was skipped because the previous sweep was still running
    pub skipped: bool,
    pub mints_expired: usize,
    pub mints_disputed: usize,
    pub burns_refunded: usize,
    pub burns_disputed: usize,
    /// Items that failed transiently and will be retried next sweep
    pub failures: usize,
}

impl SweepReport {
    pub fn is_noop(&self) -> bool {
        *self == SweepReport::default()
    }
}

/// Periodic sweep over expired requests
pub struct ReconciliationScheduler {
    store: Arc<MemoryStore>,
    mints: Arc<MintService>,
    burns: Arc<BurnService>,
    clock: Arc<dyn Clock>,
    config: TimeoutConfig,
    /// Single-flight guard: a tick that fires while a sweep is still running
    /// is skipped, not queued, so partial-failure backlogs never compound.
    sweep_guard: Mutex<()>,
}

impl ReconciliationScheduler {
    pub fn new(
        store: Arc<MemoryStore>,
        mints: Arc<MintService>,
        burns: Arc<BurnService>,
        clock: Arc<dyn Clock>,
        config: TimeoutConfig,
    ) -> Self {
        Self {
            store,
            mints,
            burns,
            clock,
            config,
            sweep_guard: Mutex::new(()),
        }
    }

    /// Run the sweep loop on the configured interval until the process shuts
    /// down. Spawn this on the runtime:
    ///
    /// ```ignore
    /// tokio::spawn(scheduler.clone().start());
    /// ```
    pub async fn start(self: Arc<Self>) {
        let mut timer = interval(self.config.poll_interval());
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            poll_interval_secs = self.config.poll_interval_secs,
            "starting reconciliation sweep loop"
        );

        loop {
            timer.tick().await;
            let report = self.run_sweep().await;
            if !report.is_noop() {
                info!(report = ?report, "reconciliation sweep finished");
            }
        }
    }

    /// Run one sweep now. Public so an operator can force reconciliation
    /// outside the timer. Safe to call concurrently with the loop: the
    /// single-flight guard makes the overlapping caller return a skipped
    /// report instead of double-processing.
    pub async fn run_sweep(&self) -> SweepReport {
        let Ok(_guard) = self.sweep_guard.try_lock() else {
            debug!("sweep already in progress, skipping");
            return SweepReport {
                skipped: true,
                ..Default::default()
            };
        };

        let mut report = SweepReport::default();
        self.sweep_mints(&mut report).await;
        self.sweep_escrowed_burns(&mut report).await;
        self.sweep_fiat_sent_burns(&mut report).await;
        report
    }

    /// Pass 1: mint requests. `Pending` past deadline expires quietly;
    /// `ProofSubmitted` past deadline escalates to a dispute.
    async fn sweep_mints(&self, report: &mut SweepReport) {
        let now = self.clock.now();
        for request in self.store.mint_snapshots().await {
            if !request.is_expired(now) {
                continue;
            }
            match request.status {
                MintStatus::Pending => match self.mints.expire(request.id).await {
                    Ok(()) => report.mints_expired += 1,
                    Err(err) => self.note_failure("expire mint", request.id, err, report),
                },
                MintStatus::ProofSubmitted => match self.mints.auto_dispute(request.id).await {
                    Ok(()) => report.mints_disputed += 1,
                    Err(err) => self.note_failure("dispute mint", request.id, err, report),
                },
                _ => {}
            }
        }
    }

    /// Pass 2: escrowed burns past deadline are refunded. A refund failure
    /// for one request must not abort the sweep for the others; the request
    /// stays `Escrowed` and is retried next sweep.
    async fn sweep_escrowed_burns(&self, report: &mut SweepReport) {
        let now = self.clock.now();
        for request in self.store.burn_snapshots().await {
            if request.status != BurnStatus::Escrowed || !request.is_expired(now) {
                continue;
            }
            match self.burns.expire(request.id).await {
                Ok(()) => report.burns_refunded += 1,
                Err(err) => self.note_failure("refund burn", request.id, err, report),
            }
        }
    }

    /// Pass 3: fiat-sent burns past deadline go to arbitration.
    async fn sweep_fiat_sent_burns(&self, report: &mut SweepReport) {
        let now = self.clock.now();
        for request in self.store.burn_snapshots().await {
            if request.status != BurnStatus::FiatSent || !request.is_expired(now) {
                continue;
            }
            match self.burns.auto_dispute(request.id).await {
                Ok(()) => report.burns_disputed += 1,
                Err(err) => self.note_failure("dispute burn", request.id, err, report),
            }
        }
    }

    fn note_failure(
        &self,
        action: &'static str,
        request_id: uuid::Uuid,
        err: EngineError,
        report: &mut SweepReport,
    ) {
        match err {
            // The item was handled between selection and processing (a user
            // or agent action won the race). Nothing to do.
            EngineError::InvalidState { .. } => {
                debug!(action = action, request_id = %request_id, "already handled, skipping");
            }
            err => {
                error!(
                    action = action,
                    request_id = %request_id,
                    error = %err,
                    "sweep item failed, will retry next sweep"
                );
                report.failures += 1;
            }
        }
    }
}
