//! Core ledger logic for Bursary.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `ledger` - Wallet entries, balance arithmetic, requests and reversal plans
//! - `advance` - Student advance balance and fee settlement
//! - `sequence` - Human-readable reference codes
//! - `period` - Accounting period lock rules
//! - `audit` - Audit log records

pub mod advance;
pub mod audit;
pub mod ledger;
pub mod period;
pub mod sequence;
