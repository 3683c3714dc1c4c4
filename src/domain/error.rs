//! Domain validation errors.
//!
//! Returned by `try_new` constructors and `FromStr` implementations of the
//! domain value types when an input violates an invariant.
//!
//! # Examples
//!
//! ```
//! use ratearb::domain::error::DomainError;
//! use ratearb::domain::Leverage;
//! use rust_decimal_macros::dec;
//!
//! let result = Leverage::try_new(dec!(0.5));
//! assert!(matches!(result, Err(DomainError::InvalidLeverage { .. })));
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Leverage must be at least 1x.
    #[error("leverage must be >= 1, got {value}")]
    InvalidLeverage {
        /// The rejected leverage.
        value: Decimal,
    },

    /// A textual value did not name a known variant.
    #[error("unknown {kind} '{value}', expected one of: {expected}")]
    UnknownVariant {
        /// What was being parsed (e.g. "interval").
        kind: &'static str,
        /// The rejected input.
        value: String,
        /// Accepted spellings.
        expected: &'static str,
    },

    /// An opportunity needs at least one rate component.
    #[error("opportunity has no rate components")]
    NoComponents,

    /// A rebased rate is too large to be a real market figure.
    #[error("rate {value} per hour is outside the accepted range of +/-{limit}")]
    RateOutOfRange {
        /// The rebased per-hour rate.
        value: Decimal,
        /// Largest accepted magnitude.
        limit: Decimal,
    },

    /// Decimal arithmetic left the representable range.
    #[error("{operation} overflowed")]
    Overflow {
        /// What was being computed.
        operation: &'static str,
    },
}
