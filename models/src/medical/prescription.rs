// models/src/medical/prescription.rs

use serde::{Deserialize, Serialize};

use crate::errors::{ValidationError, ValidationResult};
use crate::identifiers::{AppointmentId, PatientId, PrescriptionId};
use crate::medical::patient::non_blank;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationItem {
    pub name: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub frequency: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub instructions: String,
}

impl MedicationItem {
    /// A line counts only when it names a drug.
    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty()
    }

    fn trimmed(self) -> Self {
        MedicationItem {
            name: self.name.trim().to_string(),
            dosage: self.dosage.trim().to_string(),
            frequency: self.frequency.trim().to_string(),
            duration: self.duration.trim().to_string(),
            instructions: self.instructions.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: PrescriptionId,
    pub patient_id: PatientId,
    pub appointment_id: AppointmentId,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub diagnosis: Option<String>,
    pub medications: Vec<MedicationItem>,
    #[serde(default)]
    pub advice: Option<String>,
    #[serde(default)]
    pub follow_up_date: Option<String>,
}

/// A prescription as entered. The patient comes from the appointment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionDraft {
    pub appointment_id: Option<AppointmentId>,
    pub date: String,
    pub diagnosis: Option<String>,
    pub medications: Vec<MedicationItem>,
    pub advice: Option<String>,
    pub follow_up_date: Option<String>,
}

impl PrescriptionDraft {
    /// Drops blank medication lines and rejects a prescription left with none.
    pub fn validate(mut self) -> ValidationResult<Self> {
        if self.appointment_id.is_none() {
            return Err(ValidationError::MissingField("appointment"));
        }
        self.medications = self
            .medications
            .into_iter()
            .filter(|item| !item.is_blank())
            .map(MedicationItem::trimmed)
            .collect();
        if self.medications.is_empty() {
            return Err(ValidationError::EmptyPrescription);
        }
        self.date = self.date.trim().to_string();
        self.diagnosis = non_blank(self.diagnosis.take());
        self.advice = non_blank(self.advice.take());
        self.follow_up_date = non_blank(self.follow_up_date.take());
        Ok(self)
    }

    pub fn into_prescription(
        self,
        id: PrescriptionId,
        patient_id: PatientId,
        appointment_id: AppointmentId,
    ) -> Prescription {
        Prescription {
            id,
            patient_id,
            appointment_id,
            date: self.date,
            diagnosis: self.diagnosis,
            medications: self.medications,
            advice: self.advice,
            follow_up_date: self.follow_up_date,
        }
    }
}

impl From<&Prescription> for PrescriptionDraft {
    fn from(prescription: &Prescription) -> Self {
        PrescriptionDraft {
            appointment_id: Some(prescription.appointment_id),
            date: prescription.date.clone(),
            diagnosis: prescription.diagnosis.clone(),
            medications: prescription.medications.clone(),
            advice: prescription.advice.clone(),
            follow_up_date: prescription.follow_up_date.clone(),
        }
    }
}
