//! # kfet-core: Pure Domain Types for Kfet POS
//!
//! This crate holds the domain model of the kfet ledger: customers with
//! prepaid balances, cohort categories, the product catalog, orders, and the
//! balance-adjustment audit trail. Everything here is plain data plus
//! validation, with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kfet POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Frontend (external UI shell)                   │   │
//! │  │    Customer list ──► Order screen ──► Balance top-up           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ typed records (ts-rs bindings)         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kfet-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────────┐  ┌────────────────┐  ┌────────────────┐  │   │
//! │  │   │     types      │  │   validation   │  │     error      │  │   │
//! │  │   │ Customer, ...  │  │  input rules   │  │ValidationError │  │   │
//! │  │   │ New*/…Patch    │  │                │  │                │  │   │
//! │  │   └────────────────┘  └────────────────┘  └────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE DATA                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kfet-db (Data Layer)                         │   │
//! │  │        statement builder, batches, SQLite channel               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Record, insert-payload, and patch types per entity
//! - [`error`] - Validation error type
//! - [`validation`] - Input rules evaluated before any statement is built
//!
//! ## Design Principles
//!
//! 1. **Serde names are column names**: every field (de)serializes under the
//!    exact persisted column name (`firstName`, `categoryId`, ...), so the
//!    data layer can move records to and from rows without a mapping table
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Explicit Errors**: all errors are typed, never strings or panics
//! 4. **Absent ≠ null**: patch types distinguish "field not part of the
//!    patch" from "set this nullable field to null"

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use kfet_core::Customer` instead of
// `use kfet_core::types::Customer`

pub use error::ValidationError;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length accepted for any name-like field (customer names, category
/// and product labels).
///
/// ## Business Reason
/// Keeps pathological input out of the store and the receipt printer; nothing
/// at the venue has a 200-character name.
pub const MAX_NAME_LEN: usize = 200;

/// Maximum quantity of a single product in one order.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 100 instead of 10).
/// The kfet sells drinks and snacks over a counter, not wholesale.
pub const MAX_ORDER_QUANTITY: i64 = 999;
