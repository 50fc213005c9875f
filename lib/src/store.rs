// lib/src/store.rs

//! The in-memory record store.
//!
//! `ClinicState` is an immutable snapshot from the outside: the only way to
//! change it is [`reduce`], which takes the prior state and an [`Action`] and
//! returns the next state. [`Store`] wraps that with logging and keeps the
//! previous state whenever an action is rejected.

use std::fmt;

use chrono::{DateTime, Utc};
use log::{info, warn};
use rust_decimal::Decimal;
use serde::Serialize;

use models::errors::{ClinicError, ClinicResult, ValidationError};
use models::{
    Appointment, AppointmentDraft, AppointmentId, IdSequence, Patient, PatientDraft, PatientId, Payment,
    PaymentMethod, Prescription, PrescriptionDraft, PrescriptionId, RecordKind,
};

use crate::billing::{self, Reconciliation};
use crate::derive::{self, CascadeReport};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
struct IdSequences {
    patients: IdSequence,
    appointments: IdSequence,
    prescriptions: IdSequence,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClinicState {
    pub(crate) patients: Vec<Patient>,
    pub(crate) appointments: Vec<Appointment>,
    pub(crate) prescriptions: Vec<Prescription>,
    #[serde(skip)]
    ids: IdSequences,
}

impl ClinicState {
    /// Builds a state from loaded records. Dangling references are cascaded
    /// away and each id sequence starts above the largest id present.
    pub fn from_records(
        patients: Vec<Patient>,
        appointments: Vec<Appointment>,
        prescriptions: Vec<Prescription>,
    ) -> Self {
        let mut state = ClinicState { patients, appointments, prescriptions, ids: IdSequences::default() };
        derive::cascade(&mut state);
        state.ids = IdSequences {
            patients: IdSequence::starting_after(state.patients.iter().map(|p| p.id.value()).max().unwrap_or(0)),
            appointments: IdSequence::starting_after(
                state.appointments.iter().map(|a| a.id.value()).max().unwrap_or(0),
            ),
            prescriptions: IdSequence::starting_after(
                state.prescriptions.iter().map(|rx| rx.id.value()).max().unwrap_or(0),
            ),
        };
        state
    }

    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn prescriptions(&self) -> &[Prescription] {
        &self.prescriptions
    }

    pub fn patient(&self, id: PatientId) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == id)
    }

    pub fn appointment(&self, id: AppointmentId) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == id)
    }

    pub fn prescription(&self, id: PrescriptionId) -> Option<&Prescription> {
        self.prescriptions.iter().find(|rx| rx.id == id)
    }

    pub fn require_patient(&self, id: PatientId) -> ClinicResult<&Patient> {
        self.patient(id).ok_or_else(|| ClinicError::not_found(RecordKind::Patient, id))
    }

    pub fn require_appointment(&self, id: AppointmentId) -> ClinicResult<&Appointment> {
        self.appointment(id).ok_or_else(|| ClinicError::not_found(RecordKind::Appointment, id))
    }

    pub fn require_prescription(&self, id: PrescriptionId) -> ClinicResult<&Prescription> {
        self.prescription(id).ok_or_else(|| ClinicError::not_found(RecordKind::Prescription, id))
    }

    fn appointment_mut(&mut self, id: AppointmentId) -> ClinicResult<&mut Appointment> {
        self.appointments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| ClinicError::not_found(RecordKind::Appointment, id))
    }
}

/// Every mutation the store accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    AddPatient(PatientDraft),
    UpdatePatient { id: PatientId, draft: PatientDraft },
    DeletePatient(PatientId),
    AddAppointment(AppointmentDraft),
    UpdateAppointment { id: AppointmentId, draft: AppointmentDraft },
    DeleteAppointment(AppointmentId),
    RecordPayment {
        appointment_id: AppointmentId,
        amount: Decimal,
        method: PaymentMethod,
        received_at: DateTime<Utc>,
        note: Option<String>,
    },
    AddPrescription(PrescriptionDraft),
    UpdatePrescription { id: PrescriptionId, draft: PrescriptionDraft },
    DeletePrescription(PrescriptionId),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddPatient(_) => "add-patient",
            Action::UpdatePatient { .. } => "update-patient",
            Action::DeletePatient(_) => "delete-patient",
            Action::AddAppointment(_) => "add-appointment",
            Action::UpdateAppointment { .. } => "update-appointment",
            Action::DeleteAppointment(_) => "delete-appointment",
            Action::RecordPayment { .. } => "record-payment",
            Action::AddPrescription(_) => "add-prescription",
            Action::UpdatePrescription { .. } => "update-prescription",
            Action::DeletePrescription(_) => "delete-prescription",
        }
    }
}

/// What an applied action did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Outcome {
    PatientAdded(PatientId),
    PatientUpdated(PatientId),
    PatientDeleted { id: PatientId, cascade: CascadeReport },
    AppointmentAdded(AppointmentId),
    AppointmentUpdated { id: AppointmentId, billing: Reconciliation },
    AppointmentDeleted { id: AppointmentId, cascade: CascadeReport },
    PaymentRecorded { appointment_id: AppointmentId, billing: Reconciliation },
    PrescriptionAdded(PrescriptionId),
    PrescriptionUpdated(PrescriptionId),
    PrescriptionDeleted(PrescriptionId),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::PatientAdded(id) => write!(f, "patient {} added", id),
            Outcome::PatientUpdated(id) => write!(f, "patient {} updated", id),
            Outcome::PatientDeleted { id, cascade } => write!(
                f,
                "patient {} deleted along with {} appointment(s) and {} prescription(s)",
                id, cascade.appointments_removed, cascade.prescriptions_removed
            ),
            Outcome::AppointmentAdded(id) => write!(f, "appointment {} added", id),
            Outcome::AppointmentUpdated { id, billing } => {
                write!(f, "appointment {} updated ({}, balance {})", id, billing.status, billing.balance)
            }
            Outcome::AppointmentDeleted { id, cascade } => write!(
                f,
                "appointment {} deleted along with {} prescription(s)",
                id, cascade.prescriptions_removed
            ),
            Outcome::PaymentRecorded { appointment_id, billing } => write!(
                f,
                "payment recorded on {} ({}, balance {})",
                appointment_id, billing.status, billing.balance
            ),
            Outcome::PrescriptionAdded(id) => write!(f, "prescription {} added", id),
            Outcome::PrescriptionUpdated(id) => write!(f, "prescription {} updated", id),
            Outcome::PrescriptionDeleted(id) => write!(f, "prescription {} deleted", id),
        }
    }
}

/// Applies `action` to a copy of `state`.
///
/// On success the returned state has been through [`derive::cascade`]. On
/// error nothing observable has changed: `state` itself is never touched.
pub fn reduce(state: &ClinicState, action: Action) -> ClinicResult<(ClinicState, Outcome)> {
    let mut next = state.clone();
    let outcome = apply(&mut next, action)?;
    let cascade = derive::cascade(&mut next);
    let outcome = match outcome {
        Outcome::PatientDeleted { id, .. } => Outcome::PatientDeleted { id, cascade },
        Outcome::AppointmentDeleted { id, .. } => Outcome::AppointmentDeleted { id, cascade },
        other => other,
    };
    Ok((next, outcome))
}

fn apply(state: &mut ClinicState, action: Action) -> ClinicResult<Outcome> {
    match action {
        Action::AddPatient(draft) => {
            let draft = draft.validate()?;
            let id = PatientId::new(state.ids.patients.advance());
            state.patients.push(draft.into_patient(id));
            Ok(Outcome::PatientAdded(id))
        }
        Action::UpdatePatient { id, draft } => {
            let draft = draft.validate()?;
            let slot = state
                .patients
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| ClinicError::not_found(RecordKind::Patient, id))?;
            *slot = draft.into_patient(id);
            Ok(Outcome::PatientUpdated(id))
        }
        Action::DeletePatient(id) => {
            state.require_patient(id)?;
            state.patients.retain(|p| p.id != id);
            Ok(Outcome::PatientDeleted { id, cascade: CascadeReport::default() })
        }
        Action::AddAppointment(draft) => {
            let draft = draft.validate()?;
            let patient_id = draft.patient_id.ok_or(ValidationError::MissingField("patient"))?;
            state.require_patient(patient_id)?;
            let id = AppointmentId::new(state.ids.appointments.advance());
            state.appointments.push(draft.into_appointment(id, patient_id, Vec::new()));
            Ok(Outcome::AppointmentAdded(id))
        }
        Action::UpdateAppointment { id, draft } => {
            let draft = draft.validate()?;
            let patient_id = draft.patient_id.ok_or(ValidationError::MissingField("patient"))?;
            state.require_patient(patient_id)?;
            let has_prescriptions = state.prescriptions.iter().any(|rx| rx.appointment_id == id);
            let current = state.appointment_mut(id)?;
            if current.patient_id != patient_id && has_prescriptions {
                return Err(ValidationError::AppointmentHasPrescriptions(id.to_string()).into());
            }
            billing::validate_fee_change(draft.total_fee, &current.payments)?;
            let payments = std::mem::take(&mut current.payments);
            *current = draft.into_appointment(id, patient_id, payments);
            let billing = billing::reconcile_appointment(current);
            Ok(Outcome::AppointmentUpdated { id, billing })
        }
        Action::DeleteAppointment(id) => {
            state.require_appointment(id)?;
            state.appointments.retain(|a| a.id != id);
            Ok(Outcome::AppointmentDeleted { id, cascade: CascadeReport::default() })
        }
        Action::RecordPayment { appointment_id, amount, method, received_at, note } => {
            let appointment = state.appointment_mut(appointment_id)?;
            billing::validate_payment(appointment.total_fee, &appointment.payments, amount)?;
            let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
            appointment.payments.push(Payment { amount, method, received_at, note });
            let billing = billing::reconcile_appointment(appointment);
            Ok(Outcome::PaymentRecorded { appointment_id, billing })
        }
        Action::AddPrescription(draft) => {
            let draft = draft.validate()?;
            let appointment_id = draft.appointment_id.ok_or(ValidationError::MissingField("appointment"))?;
            let patient_id = state.require_appointment(appointment_id)?.patient_id;
            state.require_patient(patient_id)?;
            let id = PrescriptionId::new(state.ids.prescriptions.advance());
            state.prescriptions.push(draft.into_prescription(id, patient_id, appointment_id));
            Ok(Outcome::PrescriptionAdded(id))
        }
        Action::UpdatePrescription { id, draft } => {
            let draft = draft.validate()?;
            let appointment_id = draft.appointment_id.ok_or(ValidationError::MissingField("appointment"))?;
            let patient_id = state.require_appointment(appointment_id)?.patient_id;
            let slot = state
                .prescriptions
                .iter_mut()
                .find(|rx| rx.id == id)
                .ok_or_else(|| ClinicError::not_found(RecordKind::Prescription, id))?;
            *slot = draft.into_prescription(id, patient_id, appointment_id);
            Ok(Outcome::PrescriptionUpdated(id))
        }
        Action::DeletePrescription(id) => {
            state.require_prescription(id)?;
            state.prescriptions.retain(|rx| rx.id != id);
            Ok(Outcome::PrescriptionDeleted(id))
        }
    }
}

/// Owns the current state and applies actions to it one at a time.
#[derive(Debug, Clone, Default)]
pub struct Store {
    state: ClinicState,
}

impl Store {
    pub fn new(state: ClinicState) -> Self {
        Store { state }
    }

    pub fn state(&self) -> &ClinicState {
        &self.state
    }

    pub fn dispatch(&mut self, action: Action) -> ClinicResult<Outcome> {
        let name = action.name();
        match reduce(&self.state, action) {
            Ok((next, outcome)) => {
                info!("{}: {}", name, outcome);
                self.state = next;
                Ok(outcome)
            }
            Err(e) => {
                warn!("{} rejected: {}", name, e);
                Err(e)
            }
        }
    }
}
