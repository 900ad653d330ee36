//! # Error Types
//!
//! Domain-specific error types for kfet-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kfet-core errors (this file)                                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  kfet-db errors (separate crate)                                       │
//! │  └── DbError          - Statement, channel and decode failures         │
//! │      └── wraps ValidationError for input failures                      │
//! │                                                                         │
//! │  Flow: ValidationError → DbError → presentation boundary caller        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field name, limits)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet domain rules. They are
/// raised before any statement is built, so a failed validation never reaches
/// the execution channel.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Value must not be zero (balance adjustments of zero are meaningless).
    #[error("{field} must not be zero")]
    MustBeNonZero { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Monetary value is NaN or infinite and would poison a balance.
    #[error("{field} must be a finite amount")]
    NotFinite { field: String },
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "firstName".to_string(),
        };
        assert_eq!(err.to_string(), "firstName is required");

        let err = ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        };
        assert_eq!(err.to_string(), "name must be at most 200 characters");

        let err = ValidationError::MustBeNonZero {
            field: "amount".to_string(),
        };
        assert_eq!(err.to_string(), "amount must not be zero");
    }
}
