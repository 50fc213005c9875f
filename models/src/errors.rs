// models/src/errors.rs

use std::fmt;
use std::io;

use rust_decimal::Decimal;
pub use thiserror::Error;

/// The record collections held by the clinic store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Patient,
    Appointment,
    Prescription,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Patient => write!(f, "patient"),
            RecordKind::Appointment => write!(f, "appointment"),
            RecordKind::Prescription => write!(f, "prescription"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ClinicError {
    #[error("{kind} {id} was not found")]
    NotFound { kind: RecordKind, id: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Seed data error: {0}")]
    SeedError(String),

    #[error("File I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ClinicError {
    pub fn not_found(kind: RecordKind, id: impl fmt::Display) -> Self {
        ClinicError::NotFound { kind, id: id.to_string() }
    }
}

/// A validation error raised by user-entered data before any state changes.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// An identifier could not be parsed.
    #[error("identifier '{0}' is invalid")]
    InvalidIdentifier(String),
    /// A required field was left blank.
    #[error("{0} is required")]
    MissingField(&'static str),
    /// A value did not match any known variant of an enumerated field.
    #[error("unknown {kind} '{value}'")]
    UnknownVariant { kind: &'static str, value: String },
    /// An amount could not be parsed as money.
    #[error("invalid amount '{0}'")]
    InvalidAmount(String),
    #[error("amount {0} has more than two decimal places")]
    SubCentAmount(Decimal),
    #[error("amount {amount} exceeds the maximum of {max}")]
    AmountTooLarge { amount: Decimal, max: Decimal },
    #[error("fee cannot be negative (got {0})")]
    NegativeFee(Decimal),
    #[error("payment amount must be greater than zero (got {0})")]
    NonPositivePayment(Decimal),
    #[error("payment of {amount} exceeds the outstanding balance of {balance}")]
    PaymentExceedsBalance { amount: Decimal, balance: Decimal },
    #[error("fee of {fee} is below the {paid} already paid")]
    FeeBelowPaid { fee: Decimal, paid: Decimal },
    #[error("prescription has no medication entries")]
    EmptyPrescription,
    #[error("appointment {appointment} belongs to patient {owner}, not {given}")]
    PatientMismatch { appointment: String, owner: String, given: String },
    /// Moving an appointment to another patient would orphan its prescriptions.
    #[error("appointment {0} has prescriptions and cannot change patient")]
    AppointmentHasPrescriptions(String),
}

/// A type alias for a `Result` that returns a `ClinicError` on failure.
pub type ClinicResult<T> = Result<T, ClinicError>;

/// A type alias for a `Result` that returns a `ValidationError` on failure.
pub type ValidationResult<T> = Result<T, ValidationError>;
