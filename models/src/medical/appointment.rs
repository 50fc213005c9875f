// models/src/medical/appointment.rs

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{ValidationError, ValidationResult};
use crate::identifiers::{AppointmentId, PatientId};
use crate::medical::patient::non_blank;
use crate::medical::payment::{check_amount, Payment};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

impl FromStr for AppointmentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> ValidationResult<Self> {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" | "canceled" => Ok(AppointmentStatus::Cancelled),
            "noshow" => Ok(AppointmentStatus::NoShow),
            _ => Err(ValidationError::UnknownVariant { kind: "appointment status", value: s.to_string() }),
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "Scheduled"),
            AppointmentStatus::Completed => write!(f, "Completed"),
            AppointmentStatus::Cancelled => write!(f, "Cancelled"),
            AppointmentStatus::NoShow => write!(f, "No Show"),
        }
    }
}

/// A clinical visit for one patient, with its fee and payment history.
///
/// The payment status is not a field: it is derived from `total_fee` and
/// `payments` whenever it is read, so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: AppointmentId,
    pub patient_id: PatientId,
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub total_fee: Decimal,
    #[serde(default)]
    pub payments: Vec<Payment>,
}

impl Appointment {
    pub fn paid_to_date(&self) -> Decimal {
        self.payments.iter().fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.amount))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDraft {
    pub patient_id: Option<PatientId>,
    pub date: String,
    pub time: String,
    pub reason: String,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub diagnosis: Option<String>,
    pub total_fee: Decimal,
}

impl AppointmentDraft {
    pub fn validate(mut self) -> ValidationResult<Self> {
        if self.patient_id.is_none() {
            return Err(ValidationError::MissingField("patient"));
        }
        self.date = self.date.trim().to_string();
        if self.date.is_empty() {
            return Err(ValidationError::MissingField("appointment date"));
        }
        if self.total_fee < Decimal::ZERO {
            return Err(ValidationError::NegativeFee(self.total_fee));
        }
        check_amount(self.total_fee)?;
        self.time = self.time.trim().to_string();
        self.reason = self.reason.trim().to_string();
        self.notes = non_blank(self.notes.take());
        self.diagnosis = non_blank(self.diagnosis.take());
        Ok(self)
    }

    /// Builds a stored appointment. Call only on a validated draft.
    pub fn into_appointment(self, id: AppointmentId, patient_id: PatientId, payments: Vec<Payment>) -> Appointment {
        Appointment {
            id,
            patient_id,
            date: self.date,
            time: self.time,
            reason: self.reason,
            status: self.status,
            notes: self.notes,
            diagnosis: self.diagnosis,
            total_fee: self.total_fee,
            payments,
        }
    }
}

impl From<&Appointment> for AppointmentDraft {
    fn from(appointment: &Appointment) -> Self {
        AppointmentDraft {
            patient_id: Some(appointment.patient_id),
            date: appointment.date.clone(),
            time: appointment.time.clone(),
            reason: appointment.reason.clone(),
            status: appointment.status,
            notes: appointment.notes.clone(),
            diagnosis: appointment.diagnosis.clone(),
            total_fee: appointment.total_fee,
        }
    }
}
