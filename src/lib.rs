//! Escrow-backed request lifecycle engine for agent-mediated token ramps.
//!
//! Users acquire platform tokens by paying fiat to a human agent ("mint") and
//! redeem tokens for fiat paid out by an agent ("burn"). Both flows involve two
//! asynchronous off-platform fiat movements, bridged by a platform-held escrow.
//! This crate owns the part with real invariants: the mint/burn request state
//! machines, the escrow holds backing them, the dispute escalation path, and
//! the periodic reconciliation sweep that force-resolves timed-out requests.
//!
//! Token transfer itself, fiat rails, HTTP routing, authentication and
//! notification delivery are external collaborators. The engine talks to them
//! through the [`ledger::LedgerGateway`] and [`notify::Notifier`] seams and
//! trusts the caller identities it is handed.

pub mod clock;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod notify;
pub mod services;
pub mod store;
