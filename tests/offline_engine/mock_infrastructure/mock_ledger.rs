//! In-memory ledger gateway with call recording and failure injection

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use ramp_engine::ledger::{LedgerError, LedgerGateway};
use ramp_engine::models::TokenType;

/// Records every acknowledged gateway call. `set_down(true)` makes all calls
/// fail until the gateway is brought back up; `fail_next(n)` fails exactly
/// the next `n` calls.
#[derive(Default)]
pub struct MockLedgerGateway {
    locks: Mutex<Vec<(Uuid, Uuid, i64, TokenType)>>,
    releases: Mutex<Vec<(Uuid, Uuid)>>,
    refunds: Mutex<Vec<Uuid>>,
    mints: Mutex<Vec<(Uuid, i64, TokenType)>>,
    down: AtomicBool,
    fail_remaining: AtomicUsize,
}

impl MockLedgerGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Fail exactly the next `n` calls, then recover
    pub fn fail_next(&self, n: usize) {
        self.fail_remaining.store(n, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), LedgerError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("injected outage".into()));
        }
        // Consume one injected failure if any remain
        let mut remaining = self.fail_remaining.load(Ordering::SeqCst);
        while remaining > 0 {
            match self.fail_remaining.compare_exchange(
                remaining,
                remaining - 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return Err(LedgerError::Unavailable("injected failure".into())),
                Err(actual) => remaining = actual,
            }
        }
        Ok(())
    }

    pub fn lock_count(&self) -> usize {
        self.locks.lock().unwrap().len()
    }

    pub fn release_count(&self) -> usize {
        self.releases.lock().unwrap().len()
    }

    pub fn refund_count(&self) -> usize {
        self.refunds.lock().unwrap().len()
    }

    pub fn mint_count(&self) -> usize {
        self.mints.lock().unwrap().len()
    }

    pub fn was_refunded(&self, hold_id: Uuid) -> bool {
        self.refunds.lock().unwrap().contains(&hold_id)
    }

    pub fn was_released_to(&self, hold_id: Uuid, to_owner: Uuid) -> bool {
        self.releases.lock().unwrap().contains(&(hold_id, to_owner))
    }

    pub fn minted_to(&self, owner: Uuid) -> i64 {
        self.mints
            .lock()
            .unwrap()
            .iter()
            .filter(|(o, _, _)| *o == owner)
            .map(|(_, amount, _)| amount)
            .sum()
    }
}

#[async_trait]
impl LedgerGateway for MockLedgerGateway {
    async fn lock(
        &self,
        hold_id: Uuid,
        owner: Uuid,
        amount: i64,
        token: TokenType,
    ) -> Result<(), LedgerError> {
        self.check_available()?;
        self.locks.lock().unwrap().push((hold_id, owner, amount, token));
        Ok(())
    }

    async fn release(&self, hold_id: Uuid, to_owner: Uuid) -> Result<(), LedgerError> {
        self.check_available()?;
        self.releases.lock().unwrap().push((hold_id, to_owner));
        Ok(())
    }

    async fn refund(&self, hold_id: Uuid) -> Result<(), LedgerError> {
        self.check_available()?;
        self.refunds.lock().unwrap().push(hold_id);
        Ok(())
    }

    async fn mint(&self, to_owner: Uuid, amount: i64, token: TokenType) -> Result<(), LedgerError> {
        self.check_available()?;
        self.mints.lock().unwrap().push((to_owner, amount, token));
        Ok(())
    }
}
