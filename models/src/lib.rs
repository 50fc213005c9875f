// models/src/lib.rs

//! Shared record types for the clinic workspace: patients, appointments with
//! their payment history, prescriptions, typed identifiers and the error enums
//! every other crate reports through.

pub mod errors;
pub mod identifiers;
pub mod medical;

pub use errors::{ClinicError, ClinicResult, RecordKind, ValidationError, ValidationResult};
pub use identifiers::{AppointmentId, IdSequence, PatientId, PrescriptionId};
pub use medical::*;
pub use rust_decimal::Decimal;
