// models/src/medical/mod.rs

pub mod appointment;
pub mod patient;
pub mod payment;
pub mod prescription;

pub use appointment::{Appointment, AppointmentDraft, AppointmentStatus};
pub use patient::{Gender, Patient, PatientDraft};
pub use payment::{check_amount, max_amount, parse_amount, Payment, PaymentMethod, PaymentStatus};
pub use prescription::{MedicationItem, Prescription, PrescriptionDraft};
