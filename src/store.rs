//! Durable-record store with per-entity row locks
//!
//! Each entity lives behind its own `Arc<Mutex<_>>` row. State-transition
//! operations fetch the row, lock it, re-validate the status precondition,
//! and only then mutate, so two concurrent callers racing on the same
//! request serialize on that one row and exactly one wins; the loser observes
//! the post-transition status and fails `InvalidState`. There is no global
//! write lock around transitions: the outer maps are only locked long enough
//! to fetch or insert a row handle.
//!
//! This in-memory store is the engine's system of record for tests and
//! single-process deployments; swapping it for a database is a schema/ORM
//! concern that lives outside the engine.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{BurnRequest, Dispute, DisputeStatus, Escrow, MintRequest};

/// Shared handle to one entity record
pub type Row<T> = Arc<Mutex<T>>;

#[derive(Default)]
pub struct MemoryStore {
    escrows: RwLock<HashMap<Uuid, Row<Escrow>>>,
    mints: RwLock<HashMap<Uuid, Row<MintRequest>>>,
    burns: RwLock<HashMap<Uuid, Row<BurnRequest>>>,
    disputes: RwLock<HashMap<Uuid, Row<Dispute>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Escrows
    // ------------------------------------------------------------------

    pub async fn insert_escrow(&self, escrow: Escrow) {
        self.escrows
            .write()
            .await
            .insert(escrow.id, Arc::new(Mutex::new(escrow)));
    }

    pub async fn escrow_row(&self, id: Uuid) -> EngineResult<Row<Escrow>> {
        self.escrows
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("escrow", id))
    }

    /// Point-in-time snapshot of one escrow
    pub async fn escrow(&self, id: Uuid) -> EngineResult<Escrow> {
        let row = self.escrow_row(id).await?;
        let guard = row.lock().await;
        Ok(guard.clone())
    }

    // ------------------------------------------------------------------
    // Mint requests
    // ------------------------------------------------------------------

    pub async fn insert_mint(&self, request: MintRequest) {
        self.mints
            .write()
            .await
            .insert(request.id, Arc::new(Mutex::new(request)));
    }

    pub async fn mint_row(&self, id: Uuid) -> EngineResult<Row<MintRequest>> {
        self.mints
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("mint request", id))
    }

    pub async fn mint(&self, id: Uuid) -> EngineResult<MintRequest> {
        let row = self.mint_row(id).await?;
        let guard = row.lock().await;
        Ok(guard.clone())
    }

    /// Snapshots of all mint requests (sweep candidate selection)
    pub async fn mint_snapshots(&self) -> Vec<MintRequest> {
        let rows: Vec<Row<MintRequest>> = self.mints.read().await.values().cloned().collect();
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(row.lock().await.clone());
        }
        out
    }

    // ------------------------------------------------------------------
    // Burn requests
    // ------------------------------------------------------------------

    pub async fn insert_burn(&self, request: BurnRequest) {
        self.burns
            .write()
            .await
            .insert(request.id, Arc::new(Mutex::new(request)));
    }

    pub async fn burn_row(&self, id: Uuid) -> EngineResult<Row<BurnRequest>> {
        self.burns
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("burn request", id))
    }

    pub async fn burn(&self, id: Uuid) -> EngineResult<BurnRequest> {
        let row = self.burn_row(id).await?;
        let guard = row.lock().await;
        Ok(guard.clone())
    }

    /// Snapshots of all burn requests (sweep candidate selection)
    pub async fn burn_snapshots(&self) -> Vec<BurnRequest> {
        let rows: Vec<Row<BurnRequest>> = self.burns.read().await.values().cloned().collect();
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(row.lock().await.clone());
        }
        out
    }

    // ------------------------------------------------------------------
    // Disputes
    // ------------------------------------------------------------------

    pub async fn insert_dispute(&self, dispute: Dispute) {
        self.disputes
            .write()
            .await
            .insert(dispute.id, Arc::new(Mutex::new(dispute)));
    }

    pub async fn dispute_row(&self, id: Uuid) -> EngineResult<Row<Dispute>> {
        self.disputes
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("dispute", id))
    }

    pub async fn dispute(&self, id: Uuid) -> EngineResult<Dispute> {
        let row = self.dispute_row(id).await?;
        let guard = row.lock().await;
        Ok(guard.clone())
    }

    /// Find an unresolved dispute attached to the given escrow, if any.
    /// Used to enforce the one-open-dispute-per-escrow rule.
    pub async fn unresolved_dispute_for_escrow(&self, escrow_id: Uuid) -> Option<Dispute> {
        let rows: Vec<Row<Dispute>> = self.disputes.read().await.values().cloned().collect();
        for row in rows {
            let guard = row.lock().await;
            if guard.link.escrow_id == Some(escrow_id)
                && guard.status != DisputeStatus::Resolved
            {
                return Some(guard.clone());
            }
        }
        None
    }

    /// Find an unresolved dispute attached to the given mint request, if any
    pub async fn unresolved_dispute_for_mint(&self, mint_request_id: Uuid) -> Option<Dispute> {
        let rows: Vec<Row<Dispute>> = self.disputes.read().await.values().cloned().collect();
        for row in rows {
            let guard = row.lock().await;
            if guard.link.mint_request_id == Some(mint_request_id)
                && guard.status != DisputeStatus::Resolved
            {
                return Some(guard.clone());
            }
        }
        None
    }

    /// All disputes attached to the given escrow (audit queries)
    pub async fn disputes_for_escrow(&self, escrow_id: Uuid) -> Vec<Dispute> {
        let rows: Vec<Row<Dispute>> = self.disputes.read().await.values().cloned().collect();
        let mut out = Vec::new();
        for row in rows {
            let guard = row.lock().await;
            if guard.link.escrow_id == Some(escrow_id) {
                out.push(guard.clone());
            }
        }
        out
    }
}
