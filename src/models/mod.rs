//! Persisted entities of the request lifecycle engine
//!
//! Every entity is a durable record; status fields are closed enums, never
//! free text. Status enums carry `valid_transitions` / `is_terminal` /
//! `as_str` so transition legality lives next to the type it protects.

pub mod bank_account;
pub mod burn_request;
pub mod dispute;
pub mod escrow;
pub mod mint_request;
pub mod token;

pub use bank_account::BankAccount;
pub use burn_request::{BurnRequest, BurnStatus};
pub use dispute::{Dispute, DisputeLink, DisputeOpener, DisputeReason, DisputeStatus, Resolution};
pub use escrow::{Escrow, EscrowStatus};
pub use mint_request::{MintRequest, MintStatus};
pub use token::TokenType;
