// lib/src/document.rs

//! The printable prescription.
//!
//! The layout is fixed: practice header, patient block, medication table,
//! advice and follow-up, signature. Column widths never change, long values
//! are cut with [`fit`].

use std::fmt::Write;

use serde::Serialize;

use models::errors::ClinicResult;
use models::{Appointment, MedicationItem, Patient, Prescription, PrescriptionId};

use crate::config::PracticeConfig;
use crate::store::ClinicState;
use crate::util::{fit, format_date, format_optional_date};

pub const PAGE_WIDTH: usize = 78;

const COLUMNS: [(&str, usize); 6] =
    [("#", 3), ("Medicine", 22), ("Dosage", 10), ("Frequency", 11), ("Duration", 10), ("Instructions", 16)];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrescriptionDocument {
    pub practice: PracticeConfig,
    pub prescription: Prescription,
    pub patient: Patient,
    pub appointment: Appointment,
}

impl PrescriptionDocument {
    /// Gathers everything the printout needs. Fails with `NotFound` when the
    /// prescription, its patient or its appointment is missing.
    pub fn build(state: &ClinicState, id: PrescriptionId, practice: &PracticeConfig) -> ClinicResult<Self> {
        let prescription = state.require_prescription(id)?;
        let patient = state.require_patient(prescription.patient_id)?;
        let appointment = state.require_appointment(prescription.appointment_id)?;
        Ok(PrescriptionDocument {
            practice: practice.clone(),
            prescription: prescription.clone(),
            patient: patient.clone(),
            appointment: appointment.clone(),
        })
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write_header(&mut out);
        self.write_patient(&mut out);
        self.write_medications(&mut out);
        self.write_advice(&mut out);
        self.write_signature(&mut out);
        out
    }

    fn write_header(&self, out: &mut String) {
        let p = &self.practice;
        rule(out, '=');
        centered(out, &p.clinic_name.to_uppercase());
        centered(out, &p.address);
        centered(out, &format!("Phone: {}", p.phone));
        rule(out, '-');
        let _ = writeln!(out, "{}", fit(&format!("{}, {}", p.doctor_name, p.qualifications), PAGE_WIDTH));
        let _ = writeln!(out, "Reg. No. {}", p.registration_number);
        rule(out, '=');
    }

    fn write_patient(&self, out: &mut String) {
        let patient = &self.patient;
        let age = patient.age.map(|a| format!("{} yrs", a)).unwrap_or_else(|| "-".to_string());
        let gender = patient.gender.map(|g| g.to_string()).unwrap_or_else(|| "-".to_string());

        pair(out, "Patient", &patient.name, "Date", &format_date(&self.prescription.date));
        pair(out, "Patient ID", &patient.id.to_string(), "Rx No.", &self.prescription.id.to_string());
        pair(out, "Age / Sex", &format!("{} / {}", age, gender), "Phone", &patient.phone);
        pair(
            out,
            "Visit",
            &format!("{} on {}", self.appointment.id, format_date(&self.appointment.date)),
            "Blood",
            patient.blood_group.as_deref().unwrap_or("-"),
        );
        if let Some(allergies) = patient.allergies.as_deref() {
            let _ = writeln!(out, "{}", fit(&format!("Allergies: {}", allergies), PAGE_WIDTH));
        }
        let diagnosis = self
            .prescription
            .diagnosis
            .as_deref()
            .or(self.appointment.diagnosis.as_deref())
            .unwrap_or("-");
        let _ = writeln!(out, "{}", fit(&format!("Diagnosis: {}", diagnosis), PAGE_WIDTH));
        rule(out, '-');
    }

    fn write_medications(&self, out: &mut String) {
        let _ = writeln!(out, "Rx");
        let header: Vec<String> = COLUMNS.iter().map(|(title, width)| format!("{:<w$}", title, w = *width)).collect();
        let _ = writeln!(out, "{}", header.join(" ").trim_end());
        rule(out, '-');
        for (n, item) in self.prescription.medications.iter().enumerate() {
            let _ = writeln!(out, "{}", medication_row(n + 1, item));
        }
        rule(out, '-');
    }

    fn write_advice(&self, out: &mut String) {
        let advice = self.prescription.advice.as_deref().unwrap_or("-");
        let _ = writeln!(out, "{}", fit(&format!("Advice: {}", advice), PAGE_WIDTH));
        let _ = writeln!(
            out,
            "Follow-up: {}",
            format_optional_date(self.prescription.follow_up_date.as_deref())
        );
    }

    fn write_signature(&self, out: &mut String) {
        let _ = writeln!(out);
        let _ = writeln!(out);
        right(out, "________________________");
        right(out, &self.practice.doctor_name);
        right(out, &self.practice.qualifications);
        right(out, &format!("Reg. No. {}", self.practice.registration_number));
        rule(out, '=');
    }
}

fn medication_row(n: usize, item: &MedicationItem) -> String {
    let cells = [
        n.to_string(),
        item.name.clone(),
        item.dosage.clone(),
        item.frequency.clone(),
        item.duration.clone(),
        item.instructions.clone(),
    ];
    let row: Vec<String> = cells
        .iter()
        .zip(COLUMNS.iter())
        .map(|(text, (_, width))| format!("{:<w$}", fit(text, *width), w = *width))
        .collect();
    row.join(" ").trim_end().to_string()
}

fn rule(out: &mut String, ch: char) {
    let _ = writeln!(out, "{}", ch.to_string().repeat(PAGE_WIDTH));
}

fn centered(out: &mut String, text: &str) {
    let text = fit(text, PAGE_WIDTH);
    let pad = (PAGE_WIDTH - text.chars().count()) / 2;
    let _ = writeln!(out, "{}{}", " ".repeat(pad), text);
}

fn right(out: &mut String, text: &str) {
    let text = fit(text, PAGE_WIDTH);
    let _ = writeln!(out, "{:>w$}", text, w = PAGE_WIDTH);
}

fn pair(out: &mut String, left_label: &str, left: &str, right_label: &str, right: &str) {
    let left = fit(&format!("{:<11}: {}", left_label, left), 48);
    let right = fit(&format!("{:<6}: {}", right_label, right), PAGE_WIDTH - 50);
    let _ = writeln!(out, "{:<48}  {}", left, right);
}
