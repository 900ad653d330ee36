//! # Kfet Data Layer
//!
//! SQLite-backed ledger for a small student-run venue: cohort categories,
//! customer accounts with prepaid balances, the product catalog, and the
//! order and adjustment history.
//!
//! ## Architecture
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │                               kfet-db                                  │
//! │                                                                        │
//! │             Ledger (facade: open, seed, reset, close)                  │
//! │                                │                                       │
//! │    ┌───────────┬───────────────┼──────────────┬────────────┐           │
//! │    ▼           ▼               ▼              ▼            ▼           │
//! │ categories  customers  product_categories  products      orders        │
//! │    │           │               │              │            │           │
//! │    └───────────┴───────┬───────┴──────────────┴────────────┘           │
//! │                        ▼                                               │
//! │       statement builder ◄─── schema registry ───► row codec            │
//! │                        │                            ▲                  │
//! │     Statement{sql, params}                          │ typed records    │
//! │                        ▼                            │                  │
//! │              ExecutionChannel (execute_one / execute_batch)            │
//! │                        │                                               │
//! │                        ▼                                               │
//! │              SQLite (WAL, pooled; batches in one transaction)          │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency Model
//! - A domain action that touches several rows is one atomic batch:
//!   order + debit, credit + audit row, detach, cascade
//! - Balance changes are in-store deltas (`"account" = "account" + ?`),
//!   never read-modify-write in the application
//! - References are declared in the schema but not enforced by SQLite;
//!   what happens on deletion is this layer's explicit policy
//! - Writes RETURN their row, so "nothing matched" surfaces as NotFound
//!   instead of a silent no-op

pub mod batch;
pub mod bootstrap;
pub mod channel;
pub mod codec;
pub mod error;
pub mod ledger;
pub mod repository;
pub mod schema;
pub mod seed;
pub mod statement;

#[cfg(test)]
pub(crate) mod test_utils;

pub use batch::Batch;
pub use channel::{ChannelConfig, ExecutionChannel, Rows, SqliteChannel};
pub use error::{DbError, DbResult};
pub use ledger::Ledger;
pub use schema::Entity;
pub use seed::SeedReport;
pub use statement::{Select, Statement, TypedStatement};
