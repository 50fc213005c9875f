// models/src/medical/patient.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::{ValidationError, ValidationResult};
use crate::identifiers::PatientId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl FromStr for Gender {
    type Err = ValidationError;

    fn from_str(s: &str) -> ValidationResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "other" | "o" => Ok(Gender::Other),
            _ => Err(ValidationError::UnknownVariant { kind: "gender", value: s.to_string() }),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "Male"),
            Gender::Female => write!(f, "Female"),
            Gender::Other => write!(f, "Other"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: PatientId,
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<Gender>,
    /// Kept as entered; rendered through the lenient date formatter.
    #[serde(default)]
    pub date_of_birth: Option<String>,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub blood_group: Option<String>,
    #[serde(default)]
    pub allergies: Option<String>,
    #[serde(default)]
    pub medical_history: Option<String>,
    #[serde(default)]
    pub registered_on: Option<String>,
}

/// The user-editable fields of a patient, without an id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientDraft {
    pub name: String,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub blood_group: Option<String>,
    pub allergies: Option<String>,
    pub medical_history: Option<String>,
    pub registered_on: Option<String>,
}

impl PatientDraft {
    /// Checks required fields and trims the free-text ones.
    pub fn validate(mut self) -> ValidationResult<Self> {
        self.name = self.name.trim().to_string();
        self.phone = self.phone.trim().to_string();
        if self.name.is_empty() {
            return Err(ValidationError::MissingField("patient name"));
        }
        if self.phone.is_empty() {
            return Err(ValidationError::MissingField("phone"));
        }
        for field in [
            &mut self.date_of_birth,
            &mut self.email,
            &mut self.address,
            &mut self.blood_group,
            &mut self.allergies,
            &mut self.medical_history,
            &mut self.registered_on,
        ] {
            *field = non_blank(field.take());
        }
        Ok(self)
    }

    pub fn into_patient(self, id: PatientId) -> Patient {
        Patient {
            id,
            name: self.name,
            age: self.age,
            gender: self.gender,
            date_of_birth: self.date_of_birth,
            phone: self.phone,
            email: self.email,
            address: self.address,
            blood_group: self.blood_group,
            allergies: self.allergies,
            medical_history: self.medical_history,
            registered_on: self.registered_on,
        }
    }
}

impl From<&Patient> for PatientDraft {
    fn from(patient: &Patient) -> Self {
        PatientDraft {
            name: patient.name.clone(),
            age: patient.age,
            gender: patient.gender,
            date_of_birth: patient.date_of_birth.clone(),
            phone: patient.phone.clone(),
            email: patient.email.clone(),
            address: patient.address.clone(),
            blood_group: patient.blood_group.clone(),
            allergies: patient.allergies.clone(),
            medical_history: patient.medical_history.clone(),
            registered_on: patient.registered_on.clone(),
        }
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> PatientDraft {
        PatientDraft {
            name: "  Asha Rao ".to_string(),
            phone: "98450 11223".to_string(),
            email: Some("   ".to_string()),
            allergies: Some(" Penicillin ".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn should_trim_and_drop_blank_fields() {
        let draft = draft().validate().unwrap();
        assert_eq!(draft.name, "Asha Rao");
        assert_eq!(draft.email, None);
        assert_eq!(draft.allergies.as_deref(), Some("Penicillin"));
    }

    #[test]
    fn should_require_name_and_phone() {
        let mut no_name = draft();
        no_name.name = " ".to_string();
        assert_eq!(no_name.validate().unwrap_err(), ValidationError::MissingField("patient name"));

        let mut no_phone = draft();
        no_phone.phone.clear();
        assert_eq!(no_phone.validate().unwrap_err(), ValidationError::MissingField("phone"));
    }

    #[test]
    fn should_parse_gender_loosely() {
        assert_eq!("F".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!(" male ".parse::<Gender>().unwrap(), Gender::Male);
        assert!("unknown".parse::<Gender>().is_err());
    }

    #[test]
    fn should_deserialize_camel_case_seed_record() {
        let json = r#"{"id": 3, "name": "Ravi", "phone": "555", "bloodGroup": "O+"}"#;
        let patient: Patient = serde_json::from_str(json).unwrap();
        assert_eq!(patient.id, PatientId(3));
        assert_eq!(patient.blood_group.as_deref(), Some("O+"));
        assert_eq!(patient.age, None);
    }
}
