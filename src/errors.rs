//! Unified error type for the trip tracker.
//!
//! Validation rejections, missing references and store failures all surface
//! through [`Error`] so callers can tell a rejected mutation from a no-op.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// Every failure the crate can report.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
    },

    /// The remote row store rejected or failed a request
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Local file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required text field was empty or whitespace only
    #[error("{field} cannot be empty")]
    EmptyField {
        /// Name of the offending field
        field: &'static str,
    },

    /// A monetary field was negative or not a finite number
    #[error("Invalid {field}: {amount}")]
    InvalidAmount {
        /// Name of the offending field
        field: &'static str,
        /// The rejected value
        amount: f64,
    },

    /// No category with this id in the current snapshot
    #[error("Category not found: {id}")]
    CategoryNotFound {
        /// Requested category id
        id: Uuid,
    },

    /// No member with this id in the current snapshot
    #[error("Member not found: {id}")]
    MemberNotFound {
        /// Requested member id
        id: Uuid,
    },

    /// No expense with this id in the current snapshot
    #[error("Expense not found: {id}")]
    ExpenseNotFound {
        /// Requested expense id
        id: Uuid,
    },

    /// No timeline event with this id in the current snapshot
    #[error("Timeline event not found: {id}")]
    EventNotFound {
        /// Requested event id
        id: Uuid,
    },

    /// Trip start date falls after its end date
    #[error("Trip starts on {start} but ends on {end}")]
    InvalidDateRange {
        /// Requested start date
        start: NaiveDate,
        /// Requested end date
        end: NaiveDate,
    },
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
