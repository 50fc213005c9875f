// lib/src/seed.rs

//! Startup datasets.
//!
//! The sample clinic ships inside the crate. A directory holding the three
//! files below can replace it; every file must then be present.

use std::fs;
use std::path::Path;

use log::{debug, warn};
use serde::de::DeserializeOwned;

use models::errors::{ClinicError, ClinicResult};
use models::{Appointment, Patient, Prescription};

use crate::derive;
use crate::store::ClinicState;

pub const PATIENTS_FILE: &str = "patients.json";
pub const APPOINTMENTS_FILE: &str = "appointments.json";
pub const PRESCRIPTIONS_FILE: &str = "prescriptions.json";

const EMBEDDED_PATIENTS: &str = include_str!("../data/patients.json");
const EMBEDDED_APPOINTMENTS: &str = include_str!("../data/appointments.json");
const EMBEDDED_PRESCRIPTIONS: &str = include_str!("../data/prescriptions.json");

#[derive(Debug, Clone, Default)]
pub struct SeedData {
    pub patients: Vec<Patient>,
    pub appointments: Vec<Appointment>,
    pub prescriptions: Vec<Prescription>,
}

impl SeedData {
    /// The sample datasets compiled into the crate.
    pub fn embedded() -> ClinicResult<Self> {
        Self::parse(EMBEDDED_PATIENTS, EMBEDDED_APPOINTMENTS, EMBEDDED_PRESCRIPTIONS)
    }

    pub fn from_dir(dir: &Path) -> ClinicResult<Self> {
        let read = |name: &str| {
            let path = dir.join(name);
            fs::read_to_string(&path)
                .map_err(|e| ClinicError::SeedError(format!("failed to read {}: {}", path.display(), e)))
        };
        Self::parse(&read(PATIENTS_FILE)?, &read(APPOINTMENTS_FILE)?, &read(PRESCRIPTIONS_FILE)?)
    }

    fn parse(patients: &str, appointments: &str, prescriptions: &str) -> ClinicResult<Self> {
        Ok(SeedData {
            patients: parse_dataset(PATIENTS_FILE, patients)?,
            appointments: parse_dataset(APPOINTMENTS_FILE, appointments)?,
            prescriptions: parse_dataset(PRESCRIPTIONS_FILE, prescriptions)?,
        })
    }

    /// Turns the datasets into a store state. Integrity problems are logged,
    /// duplicates keep their first occurrence and dangling records are dropped.
    pub fn into_state(self) -> ClinicState {
        let mut state = ClinicState::default();
        state.patients = self.patients;
        state.appointments = self.appointments;
        state.prescriptions = self.prescriptions;

        for issue in derive::integrity_report(&state) {
            warn!("seed data: {}", issue);
        }
        let duplicates = derive::drop_duplicate_ids(&mut state);
        if duplicates > 0 {
            warn!("seed data: dropped {} record(s) with duplicate ids", duplicates);
        }

        let ClinicState { patients, appointments, prescriptions, .. } = state;
        let state = ClinicState::from_records(patients, appointments, prescriptions);
        debug!(
            "seed data loaded: {} patients, {} appointments, {} prescriptions",
            state.patients().len(),
            state.appointments().len(),
            state.prescriptions().len()
        );
        state
    }
}

fn parse_dataset<T: DeserializeOwned>(name: &str, raw: &str) -> ClinicResult<Vec<T>> {
    serde_json::from_str(raw).map_err(|e| ClinicError::SeedError(format!("{}: {}", name, e)))
}

/// Loads the startup state from `dir` when given, otherwise from the embedded sample.
pub fn load_seed(dir: Option<&Path>) -> ClinicResult<ClinicState> {
    let data = match dir {
        Some(dir) => {
            debug!("loading seed data from {}", dir.display());
            SeedData::from_dir(dir)?
        }
        None => SeedData::embedded()?,
    };
    Ok(data.into_state())
}
