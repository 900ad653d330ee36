//! # Validation Module
//!
//! Input validation rules for Kfet POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (external UI shell)                                 │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Domain operations (Rust)                                     │
//! │  └── THIS MODULE: rules checked before any statement is built          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  └── NOT NULL constraints and declared defaults                        │
//! │                                                                         │
//! │  A failed validation never reaches the execution channel.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kfet_core::validation::{validate_name, validate_quantity};
//!
//! validate_name("firstName", "Marie").unwrap();
//! validate_quantity(3).unwrap();
//! ```

use crate::error::ValidationError;
use crate::{MAX_NAME_LEN, MAX_ORDER_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a name-like field (customer names, category and product labels).
///
/// ## Rules
/// - Must not be empty or whitespace-only
/// - Must be at most [`MAX_NAME_LEN`] characters
///
/// ## Example
/// ```rust
/// use kfet_core::validation::validate_name;
///
/// assert!(validate_name("name", "Coca-Cola").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an order quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_ORDER_QUANTITY`]
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if quantity > MAX_ORDER_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ORDER_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price field.
///
/// ## Rules
/// - Must be finite (NaN/infinity would poison balances downstream)
/// - Must not be negative; zero is allowed (free items exist)
pub fn validate_price(field: &str, price: f64) -> ValidationResult<()> {
    if !price.is_finite() {
        return Err(ValidationError::NotFinite {
            field: field.to_string(),
        });
    }

    if price < 0.0 {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a manual balance-adjustment amount.
///
/// ## Rules
/// - Must be finite
/// - Must not be zero: the amount is signed (top-up or correction), but a
///   zero adjustment would append a meaningless audit row
pub fn validate_adjustment_amount(amount: f64) -> ValidationResult<()> {
    if !amount.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "amount".to_string(),
        });
    }

    if amount == 0.0 {
        return Err(ValidationError::MustBeNonZero {
            field: "amount".to_string(),
        });
    }

    Ok(())
}

/// Validates an initial account balance.
///
/// ## Rules
/// - Must be finite
/// - May be negative: importing an existing tab as debt is legitimate
pub fn validate_balance(balance: f64) -> ValidationResult<()> {
    if !balance.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "account".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
