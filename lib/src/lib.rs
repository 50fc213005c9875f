// lib/src/lib.rs

//! Clinic record store: patients, appointments with payment history and
//! prescriptions held in memory, with billing reconciliation, reports and the
//! printable prescription built on top.

pub mod billing;
pub mod config;
pub mod derive;
pub mod document;
pub mod queries;
pub mod seed;
pub mod store;
pub mod util;

pub use billing::{reconcile, reconcile_appointment, BillingLedger, Reconciliation};
pub use config::{load_clinic_config, BillingConfig, ClinicConfig, DataConfig, PracticeConfig};
pub use derive::{cascade, integrity_report, CascadeReport, IntegrityIssue};
pub use document::PrescriptionDocument;
pub use queries::{DashboardSummary, OutstandingBalance};
pub use seed::{load_seed, SeedData};
pub use store::{reduce, Action, ClinicState, Outcome, Store};
