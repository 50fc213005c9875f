// lib/src/derive.rs

//! Derivations run after every store mutation.
//!
//! Referential integrity is restored here rather than at each call site:
//! removing a parent record and then calling [`cascade`] is all a delete
//! needs to do.

use std::collections::{HashMap, HashSet};
use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use models::{check_amount, AppointmentId, PatientId, PrescriptionId, RecordKind};

use crate::billing;
use crate::store::ClinicState;

/// Counts of dependent records removed by one cascade pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub appointments_removed: usize,
    pub prescriptions_removed: usize,
}

impl CascadeReport {
    pub fn is_empty(&self) -> bool {
        self.appointments_removed == 0 && self.prescriptions_removed == 0
    }
}

/// Drops appointments without a patient, then prescriptions whose appointment
/// is gone or belongs to a different patient.
pub fn cascade(state: &mut ClinicState) -> CascadeReport {
    let patients: HashSet<PatientId> = state.patients.iter().map(|p| p.id).collect();

    let appointments_before = state.appointments.len();
    state.appointments.retain(|a| patients.contains(&a.patient_id));

    let owners: HashMap<AppointmentId, PatientId> =
        state.appointments.iter().map(|a| (a.id, a.patient_id)).collect();

    let prescriptions_before = state.prescriptions.len();
    state
        .prescriptions
        .retain(|rx| owners.get(&rx.appointment_id) == Some(&rx.patient_id));

    CascadeReport {
        appointments_removed: appointments_before - state.appointments.len(),
        prescriptions_removed: prescriptions_before - state.prescriptions.len(),
    }
}

/// A problem found in a state that has not been through [`cascade`], typically
/// freshly loaded seed data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    DuplicateId { kind: RecordKind, id: String },
    MissingPatient { appointment: AppointmentId, patient: PatientId },
    MissingAppointment { prescription: PrescriptionId, appointment: AppointmentId },
    PatientMismatch { prescription: PrescriptionId, appointment: AppointmentId },
    Overpaid { appointment: AppointmentId, fee: Decimal, paid: Decimal },
    /// Negative, fractional-cent or above the accepted maximum.
    InvalidFee { appointment: AppointmentId, fee: Decimal },
    NoMedications { prescription: PrescriptionId },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::DuplicateId { kind, id } => write!(f, "duplicate {} id {}", kind, id),
            IntegrityIssue::MissingPatient { appointment, patient } => {
                write!(f, "appointment {} references missing patient {}", appointment, patient)
            }
            IntegrityIssue::MissingAppointment { prescription, appointment } => {
                write!(f, "prescription {} references missing appointment {}", prescription, appointment)
            }
            IntegrityIssue::PatientMismatch { prescription, appointment } => {
                write!(f, "prescription {} names a different patient than appointment {}", prescription, appointment)
            }
            IntegrityIssue::Overpaid { appointment, fee, paid } => {
                write!(f, "appointment {} has {} paid against a fee of {}", appointment, paid, fee)
            }
            IntegrityIssue::InvalidFee { appointment, fee } => {
                write!(f, "appointment {} has an invalid fee of {}", appointment, fee)
            }
            IntegrityIssue::NoMedications { prescription } => {
                write!(f, "prescription {} lists no medications", prescription)
            }
        }
    }
}

/// Lists integrity problems without changing anything.
pub fn integrity_report(state: &ClinicState) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();

    let mut seen = HashSet::new();
    for p in &state.patients {
        if !seen.insert(p.id) {
            issues.push(IntegrityIssue::DuplicateId { kind: RecordKind::Patient, id: p.id.to_string() });
        }
    }
    let mut seen = HashSet::new();
    for a in &state.appointments {
        if !seen.insert(a.id) {
            issues.push(IntegrityIssue::DuplicateId { kind: RecordKind::Appointment, id: a.id.to_string() });
        }
    }
    let mut seen = HashSet::new();
    for rx in &state.prescriptions {
        if !seen.insert(rx.id) {
            issues.push(IntegrityIssue::DuplicateId { kind: RecordKind::Prescription, id: rx.id.to_string() });
        }
    }

    let patients: HashSet<PatientId> = state.patients.iter().map(|p| p.id).collect();
    for a in &state.appointments {
        if !patients.contains(&a.patient_id) {
            issues.push(IntegrityIssue::MissingPatient { appointment: a.id, patient: a.patient_id });
        }
        if a.total_fee < Decimal::ZERO || check_amount(a.total_fee).is_err() {
            issues.push(IntegrityIssue::InvalidFee { appointment: a.id, fee: a.total_fee });
        }
        let rec = billing::reconcile_appointment(a);
        if rec.paid > rec.fee {
            issues.push(IntegrityIssue::Overpaid { appointment: a.id, fee: rec.fee, paid: rec.paid });
        }
    }

    let owners: HashMap<AppointmentId, PatientId> =
        state.appointments.iter().map(|a| (a.id, a.patient_id)).collect();
    for rx in &state.prescriptions {
        if rx.medications.iter().all(|item| item.is_blank()) {
            issues.push(IntegrityIssue::NoMedications { prescription: rx.id });
        }
        match owners.get(&rx.appointment_id) {
            None => issues.push(IntegrityIssue::MissingAppointment {
                prescription: rx.id,
                appointment: rx.appointment_id,
            }),
            Some(owner) if *owner != rx.patient_id => issues.push(IntegrityIssue::PatientMismatch {
                prescription: rx.id,
                appointment: rx.appointment_id,
            }),
            Some(_) => {}
        }
    }

    issues
}

/// Keeps the first record for each id in every collection. Returns how many
/// records were dropped.
pub fn drop_duplicate_ids(state: &mut ClinicState) -> usize {
    let before = state.patients.len() + state.appointments.len() + state.prescriptions.len();

    let mut seen = HashSet::new();
    state.patients.retain(|p| seen.insert(p.id));
    let mut seen = HashSet::new();
    state.appointments.retain(|a| seen.insert(a.id));
    let mut seen = HashSet::new();
    state.prescriptions.retain(|rx| seen.insert(rx.id));

    before - (state.patients.len() + state.appointments.len() + state.prescriptions.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{appointment, patient, prescription};

    #[test]
    fn should_remove_dependents_of_missing_patient() {
        let mut state = ClinicState::from_records(
            vec![patient(1), patient(2)],
            vec![appointment(10, 1, 500), appointment(11, 2, 500), appointment(12, 3, 500)],
            vec![prescription(20, 1, 10), prescription(21, 3, 12)],
        );
        // from_records already cascades the dangling patient 3
        assert_eq!(state.appointments().len(), 2);
        assert_eq!(state.prescriptions().len(), 1);

        state.patients.retain(|p| p.id != PatientId(1));
        let report = cascade(&mut state);
        assert_eq!(report, CascadeReport { appointments_removed: 1, prescriptions_removed: 1 });
        assert!(state.appointments().iter().all(|a| a.patient_id == PatientId(2)));
        assert!(state.prescriptions().is_empty());
    }

    #[test]
    fn should_report_without_mutating() {
        let mut state = ClinicState::default();
        state.patients = vec![patient(1), patient(1)];
        state.appointments = vec![appointment(10, 9, 500)];
        state.prescriptions = vec![prescription(20, 1, 10), prescription(21, 1, 99)];
        let mut overpaid = appointment(11, 1, 100);
        overpaid.payments.push(crate::store::tests::payment(150));
        state.appointments.push(overpaid);

        let issues = integrity_report(&state);
        assert!(issues.contains(&IntegrityIssue::DuplicateId { kind: RecordKind::Patient, id: "PAT-0001".to_string() }));
        assert!(issues.contains(&IntegrityIssue::MissingPatient { appointment: AppointmentId(10), patient: PatientId(9) }));
        assert!(issues.contains(&IntegrityIssue::PatientMismatch { prescription: PrescriptionId(20), appointment: AppointmentId(10) }));
        assert!(issues.contains(&IntegrityIssue::MissingAppointment { prescription: PrescriptionId(21), appointment: AppointmentId(99) }));
        assert!(issues.contains(&IntegrityIssue::Overpaid {
            appointment: AppointmentId(11),
            fee: Decimal::from(100),
            paid: Decimal::from(150),
        }));
        assert_eq!(state.patients().len(), 2);
    }

    #[test]
    fn should_flag_bad_fees_and_empty_prescriptions() {
        let mut state = ClinicState::default();
        state.patients = vec![patient(1)];
        let negative = appointment(10, 1, -50);
        let mut fractional = appointment(11, 1, 0);
        fractional.total_fee = Decimal::new(12345, 3);
        state.appointments = vec![negative, fractional, appointment(12, 1, 500)];
        let mut empty = prescription(20, 1, 12);
        empty.medications.clear();
        state.prescriptions = vec![empty, prescription(21, 1, 12)];

        let issues = integrity_report(&state);
        assert!(issues.contains(&IntegrityIssue::InvalidFee { appointment: AppointmentId(10), fee: Decimal::from(-50) }));
        assert!(issues.contains(&IntegrityIssue::InvalidFee {
            appointment: AppointmentId(11),
            fee: Decimal::new(12345, 3),
        }));
        assert!(issues.contains(&IntegrityIssue::NoMedications { prescription: PrescriptionId(20) }));
        assert_eq!(issues.len(), 3);
    }

    #[test]
    fn should_keep_first_of_duplicate_ids() {
        let mut state = ClinicState::default();
        let mut second = patient(1);
        second.name = "Second".to_string();
        state.patients = vec![patient(1), second, patient(2)];
        assert_eq!(drop_duplicate_ids(&mut state), 1);
        assert_eq!(state.patients()[0].name, "Patient 1");
        assert_eq!(state.patients().len(), 2);
    }
}
