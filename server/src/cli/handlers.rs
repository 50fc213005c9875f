// server/src/cli/handlers.rs

// Executes parsed commands against the clinic store and renders the results.
// Output goes to any `Write` so the same code serves stdout and the tests.

use std::fs;
use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, Utc};
use colored::Colorize;
use log::debug;
use rust_decimal::Decimal;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use clinic_lib::billing::{self, BillingLedger, Reconciliation};
use clinic_lib::config::ClinicConfig;
use clinic_lib::document::PrescriptionDocument;
use clinic_lib::queries::{self, DashboardSummary, OutstandingBalance};
use clinic_lib::store::{Action, ClinicState, Outcome, Store};
use clinic_lib::util::{fit, format_date, format_money, format_optional_date};
use models::{
    Appointment, AppointmentDraft, AppointmentId, Patient, PatientDraft, PatientId, PaymentStatus, Prescription,
    PrescriptionDraft, PrescriptionId,
};

use crate::cli::commands::{
    AppointmentAction, AppointmentFields, BillingAction, ClinicCommand, PatientAction, PatientFields,
    PrescriptionAction, PrescriptionFields,
};

/// Asks the user to confirm a destructive action.
pub trait Prompter {
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

/// Reads the answer from standard input. Used for one-shot commands.
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        print!("{} [y/N] ", question);
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(is_yes(&answer))
    }
}

/// Reads the answer through the shell's line editor.
pub struct EditorPrompter<'a>(pub &'a mut DefaultEditor);

impl Prompter for EditorPrompter<'_> {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        match self.0.readline(&format!("{} [y/N] ", question)) {
            Ok(answer) => Ok(is_yes(&answer)),
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// The store and configuration for one CLI process.
pub struct Session {
    store: Store,
    config: ClinicConfig,
}

impl Session {
    pub fn new(store: Store, config: ClinicConfig) -> Self {
        Session { store, config }
    }

    pub fn state(&self) -> &ClinicState {
        self.store.state()
    }

    pub fn execute(&mut self, command: ClinicCommand, prompter: &mut dyn Prompter, out: &mut dyn Write) -> Result<()> {
        debug!("executing {:?}", command);
        match command {
            ClinicCommand::Patient(wrapper) => self.patient(wrapper.command, prompter, out),
            ClinicCommand::Appointment(wrapper) => self.appointment(wrapper.command, prompter, out),
            ClinicCommand::Prescription(wrapper) => self.prescription(wrapper.command, prompter, out),
            ClinicCommand::Billing(wrapper) => self.billing(wrapper.command, out),
            ClinicCommand::Dashboard { today, json } => {
                let today = today.unwrap_or_else(|| Local::now().date_naive());
                self.dashboard(today, json, out)
            }
            ClinicCommand::Interactive => {
                writeln!(out, "{}", "Already in the interactive shell.".yellow())?;
                Ok(())
            }
        }
    }

    fn money(&self, amount: Decimal) -> String {
        format_money(amount, &self.config.billing.currency_symbol)
    }

    fn dispatch(&mut self, action: Action, out: &mut dyn Write) -> Result<Outcome> {
        let outcome = self.store.dispatch(action)?;
        writeln!(out, "{}", outcome.to_string().green())?;
        Ok(outcome)
    }

    fn patient(&mut self, action: PatientAction, prompter: &mut dyn Prompter, out: &mut dyn Write) -> Result<()> {
        match action {
            PatientAction::List => {
                let patients: Vec<&Patient> = self.state().patients().iter().collect();
                write_patient_table(&patients, out)
            }
            PatientAction::Search { term } => {
                let found = queries::search_patients(self.state(), &term);
                if found.is_empty() {
                    writeln!(out, "No patients match '{}'.", term)?;
                    return Ok(());
                }
                write_patient_table(&found, out)
            }
            PatientAction::Show { id } => self.show_patient(id, out),
            PatientAction::Add(fields) => {
                let mut draft = PatientDraft::default();
                merge_patient(&mut draft, fields);
                self.dispatch(Action::AddPatient(draft), out)?;
                Ok(())
            }
            PatientAction::Update { id, fields } => {
                let mut draft = PatientDraft::from(self.state().require_patient(id)?);
                merge_patient(&mut draft, fields);
                self.dispatch(Action::UpdatePatient { id, draft }, out)?;
                Ok(())
            }
            PatientAction::Delete { id, yes } => {
                let patient = self.state().require_patient(id)?;
                let question = format!(
                    "Delete {} ({}) with {} appointment(s) and {} prescription(s)?",
                    patient.name,
                    id,
                    queries::appointments_for_patient(self.state(), id).len(),
                    queries::prescriptions_for_patient(self.state(), id).len()
                );
                if !yes && !prompter.confirm(&question)? {
                    writeln!(out, "Deletion cancelled.")?;
                    return Ok(());
                }
                self.dispatch(Action::DeletePatient(id), out)?;
                Ok(())
            }
        }
    }

    fn show_patient(&self, id: PatientId, out: &mut dyn Write) -> Result<()> {
        let state = self.state();
        let patient = state.require_patient(id)?;
        writeln!(out, "{}", format!("{}  {}", patient.id, patient.name).bold())?;
        field(out, "Age", &patient.age.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string()))?;
        field(out, "Gender", &patient.gender.map(|g| g.to_string()).unwrap_or_else(|| "-".to_string()))?;
        field(out, "Date of birth", &format_optional_date(patient.date_of_birth.as_deref()))?;
        field(out, "Phone", &patient.phone)?;
        field(out, "Email", patient.email.as_deref().unwrap_or("-"))?;
        field(out, "Address", patient.address.as_deref().unwrap_or("-"))?;
        field(out, "Blood group", patient.blood_group.as_deref().unwrap_or("-"))?;
        field(out, "Allergies", patient.allergies.as_deref().unwrap_or("-"))?;
        field(out, "History", patient.medical_history.as_deref().unwrap_or("-"))?;
        field(out, "Registered", &format_optional_date(patient.registered_on.as_deref()))?;

        writeln!(out)?;
        writeln!(out, "{}", "Appointments".bold())?;
        let appointments = queries::appointments_for_patient(state, id);
        if appointments.is_empty() {
            writeln!(out, "  none")?;
        } else {
            self.write_appointment_table(&appointments, out)?;
        }

        writeln!(out)?;
        writeln!(out, "{}", "Prescriptions".bold())?;
        let prescriptions = queries::prescriptions_for_patient(state, id);
        if prescriptions.is_empty() {
            writeln!(out, "  none")?;
        } else {
            write_prescription_table(state, &prescriptions, out)?;
        }

        writeln!(out)?;
        let ledger = queries::patient_ledger(state, id);
        writeln!(
            out,
            "Billed {}, collected {}, outstanding {}",
            self.money(ledger.billed),
            self.money(ledger.collected),
            self.money(ledger.outstanding)
        )?;
        Ok(())
    }

    fn appointment(&mut self, action: AppointmentAction, prompter: &mut dyn Prompter, out: &mut dyn Write) -> Result<()> {
        match action {
            AppointmentAction::List { patient, date } => {
                let state = self.state();
                let mut appointments: Vec<&Appointment> = match date {
                    Some(date) => queries::appointments_on(state, date),
                    None => state.appointments().iter().collect(),
                };
                if let Some(patient) = patient {
                    appointments.retain(|a| a.patient_id == patient);
                }
                if appointments.is_empty() {
                    writeln!(out, "No appointments.")?;
                    return Ok(());
                }
                self.write_appointment_table(&appointments, out)
            }
            AppointmentAction::Show { id } => self.show_appointment(id, out),
            AppointmentAction::Add(fields) => {
                let mut draft = AppointmentDraft::default();
                merge_appointment(&mut draft, fields);
                self.dispatch(Action::AddAppointment(draft), out)?;
                Ok(())
            }
            AppointmentAction::Update { id, fields } => {
                let mut draft = AppointmentDraft::from(self.state().require_appointment(id)?);
                merge_appointment(&mut draft, fields);
                self.dispatch(Action::UpdateAppointment { id, draft }, out)?;
                Ok(())
            }
            AppointmentAction::Delete { id, yes } => {
                let appointment = self.state().require_appointment(id)?;
                let question = format!(
                    "Delete appointment {} on {} with {} prescription(s)?",
                    id,
                    format_date(&appointment.date),
                    queries::prescriptions_for_appointment(self.state(), id).len()
                );
                if !yes && !prompter.confirm(&question)? {
                    writeln!(out, "Deletion cancelled.")?;
                    return Ok(());
                }
                self.dispatch(Action::DeleteAppointment(id), out)?;
                Ok(())
            }
            AppointmentAction::Pay { id, amount, method, note } => {
                let action = Action::RecordPayment {
                    appointment_id: id,
                    amount,
                    method,
                    received_at: Utc::now(),
                    note,
                };
                if let Outcome::PaymentRecorded { billing, .. } = self.dispatch(action, out)? {
                    self.write_reconciliation(&billing, out)?;
                }
                Ok(())
            }
        }
    }

    fn show_appointment(&self, id: AppointmentId, out: &mut dyn Write) -> Result<()> {
        let state = self.state();
        let appointment = state.require_appointment(id)?;
        let patient = state.require_patient(appointment.patient_id)?;
        writeln!(out, "{}", format!("{}  {}", appointment.id, format_date(&appointment.date)).bold())?;
        field(out, "Patient", &format!("{} ({})", patient.name, patient.id))?;
        field(out, "Time", &appointment.time)?;
        field(out, "Reason", &appointment.reason)?;
        field(out, "Status", &appointment.status.to_string())?;
        field(out, "Diagnosis", appointment.diagnosis.as_deref().unwrap_or("-"))?;
        field(out, "Notes", appointment.notes.as_deref().unwrap_or("-"))?;
        writeln!(out)?;
        self.write_billing(appointment, out)?;

        let prescriptions = queries::prescriptions_for_appointment(state, id);
        if !prescriptions.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", "Prescriptions".bold())?;
            write_prescription_table(state, &prescriptions, out)?;
        }
        Ok(())
    }

    fn prescription(&mut self, action: PrescriptionAction, prompter: &mut dyn Prompter, out: &mut dyn Write) -> Result<()> {
        match action {
            PrescriptionAction::List { patient, appointment } => {
                let state = self.state();
                let prescriptions: Vec<&Prescription> = state
                    .prescriptions()
                    .iter()
                    .filter(|rx| patient.is_none_or(|p| rx.patient_id == p))
                    .filter(|rx| appointment.is_none_or(|a| rx.appointment_id == a))
                    .collect();
                if prescriptions.is_empty() {
                    writeln!(out, "No prescriptions.")?;
                    return Ok(());
                }
                write_prescription_table(state, &prescriptions, out)
            }
            PrescriptionAction::Show { id } => self.show_prescription(id, out),
            PrescriptionAction::Add(fields) => {
                let mut draft = PrescriptionDraft {
                    date: Local::now().date_naive().format("%Y-%m-%d").to_string(),
                    ..Default::default()
                };
                merge_prescription(&mut draft, fields);
                self.dispatch(Action::AddPrescription(draft), out)?;
                Ok(())
            }
            PrescriptionAction::Update { id, fields } => {
                let mut draft = PrescriptionDraft::from(self.state().require_prescription(id)?);
                merge_prescription(&mut draft, fields);
                self.dispatch(Action::UpdatePrescription { id, draft }, out)?;
                Ok(())
            }
            PrescriptionAction::Delete { id, yes } => {
                let rx = self.state().require_prescription(id)?;
                let question = format!("Delete prescription {} dated {}?", id, format_date(&rx.date));
                if !yes && !prompter.confirm(&question)? {
                    writeln!(out, "Deletion cancelled.")?;
                    return Ok(());
                }
                self.dispatch(Action::DeletePrescription(id), out)?;
                Ok(())
            }
            PrescriptionAction::Print { id, out: path } => {
                let text = PrescriptionDocument::build(self.state(), id, &self.config.practice)?.render();
                match path {
                    Some(path) => {
                        fs::write(&path, text)
                            .with_context(|| format!("failed to write prescription to {}", path.display()))?;
                        writeln!(out, "{}", format!("prescription {} written to {}", id, path.display()).green())?;
                    }
                    None => write!(out, "{}", text)?,
                }
                Ok(())
            }
        }
    }

    fn show_prescription(&self, id: PrescriptionId, out: &mut dyn Write) -> Result<()> {
        let state = self.state();
        let rx = state.require_prescription(id)?;
        let patient = state.require_patient(rx.patient_id)?;
        writeln!(out, "{}", format!("{}  {}", rx.id, format_date(&rx.date)).bold())?;
        field(out, "Patient", &format!("{} ({})", patient.name, patient.id))?;
        field(out, "Appointment", &rx.appointment_id.to_string())?;
        field(out, "Diagnosis", rx.diagnosis.as_deref().unwrap_or("-"))?;
        for (n, item) in rx.medications.iter().enumerate() {
            writeln!(
                out,
                "  {}. {} {} | {} | {} | {}",
                n + 1,
                item.name,
                item.dosage,
                item.frequency,
                item.duration,
                item.instructions
            )?;
        }
        field(out, "Advice", rx.advice.as_deref().unwrap_or("-"))?;
        field(out, "Follow-up", &format_optional_date(rx.follow_up_date.as_deref()))?;
        Ok(())
    }

    fn billing(&self, action: BillingAction, out: &mut dyn Write) -> Result<()> {
        match action {
            BillingAction::Show { id } => {
                let appointment = self.state().require_appointment(id)?;
                writeln!(out, "{}", format!("{}  {}", appointment.id, format_date(&appointment.date)).bold())?;
                self.write_billing(appointment, out)
            }
            BillingAction::Summary { patient, json } => {
                let state = self.state();
                let (ledger, outstanding) = match patient {
                    Some(id) => {
                        state.require_patient(id)?;
                        let rows: Vec<OutstandingBalance> = queries::outstanding_balances(state)
                            .into_iter()
                            .filter(|row| row.patient_id == id)
                            .collect();
                        (queries::patient_ledger(state, id), rows)
                    }
                    None => (
                        BillingLedger::from_appointments(state.appointments()),
                        queries::outstanding_balances(state),
                    ),
                };
                if json {
                    writeln!(out, "{}", serde_json::to_string_pretty(&ledger)?)?;
                    return Ok(());
                }
                self.write_ledger(&ledger, out)?;
                self.write_outstanding(&outstanding, out)
            }
        }
    }

    fn dashboard(&self, today: NaiveDate, json: bool, out: &mut dyn Write) -> Result<()> {
        let state = self.state();
        let summary = DashboardSummary::compute(state, today);
        if json {
            writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
            return Ok(());
        }

        writeln!(out, "{}", format!("{} | {}", self.config.practice.clinic_name, today.format("%d %b %Y")).bold())?;
        writeln!(
            out,
            "Patients {}   Appointments {}   Prescriptions {}   Today {}",
            summary.patients, summary.appointments, summary.prescriptions, summary.todays_appointments
        )?;

        writeln!(out)?;
        writeln!(out, "{}", "Upcoming".bold())?;
        if summary.upcoming.is_empty() {
            writeln!(out, "  nothing scheduled")?;
        }
        for id in summary.upcoming.iter().take(10) {
            if let Some(a) = state.appointment(*id) {
                let name = state.patient(a.patient_id).map(|p| p.name.as_str()).unwrap_or("-");
                writeln!(
                    out,
                    "  {:<9} {:<11} {:<5} {:<22} {}",
                    a.id,
                    format_date(&a.date),
                    a.time,
                    fit(name, 22),
                    fit(&a.reason, 24)
                )?;
            }
        }

        writeln!(out)?;
        self.write_ledger(&summary.billing, out)?;
        self.write_outstanding(&summary.outstanding, out)
    }

    fn write_appointment_table(&self, appointments: &[&Appointment], out: &mut dyn Write) -> Result<()> {
        writeln!(
            out,
            "{:<9} {:<11} {:<5} {:<18} {:<20} {:<9} {:>12} {:>12} {}",
            "ID", "Date", "Time", "Patient", "Reason", "Status", "Fee", "Balance", "Payment"
        )?;
        for a in appointments {
            let name = self.state().patient(a.patient_id).map(|p| p.name.as_str()).unwrap_or("-");
            let rec = billing::reconcile_appointment(a);
            writeln!(
                out,
                "{:<9} {:<11} {:<5} {:<18} {:<20} {:<9} {:>12} {:>12} {}",
                a.id,
                format_date(&a.date),
                fit(&a.time, 5),
                fit(name, 18),
                fit(&a.reason, 20),
                a.status.to_string(),
                self.money(rec.fee),
                self.money(rec.balance),
                status_label(rec.status)
            )?;
        }
        Ok(())
    }

    fn write_billing(&self, appointment: &Appointment, out: &mut dyn Write) -> Result<()> {
        if appointment.payments.is_empty() {
            writeln!(out, "No payments recorded.")?;
        } else {
            writeln!(out, "{:<18} {:<8} {:>12}  {}", "Received", "Method", "Amount", "Note")?;
            for p in &appointment.payments {
                writeln!(
                    out,
                    "{:<18} {:<8} {:>12}  {}",
                    p.received_at.format("%d %b %Y %H:%M").to_string(),
                    p.method.to_string(),
                    self.money(p.amount),
                    p.note.as_deref().unwrap_or("")
                )?;
            }
        }
        self.write_reconciliation(&billing::reconcile_appointment(appointment), out)
    }

    fn write_reconciliation(&self, rec: &Reconciliation, out: &mut dyn Write) -> Result<()> {
        writeln!(
            out,
            "Fee {}   Paid {}   Balance {}   {}",
            self.money(rec.fee),
            self.money(rec.paid),
            self.money(rec.balance),
            status_label(rec.status)
        )?;
        Ok(())
    }

    fn write_ledger(&self, ledger: &BillingLedger, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "{}", "Billing".bold())?;
        writeln!(out, "  Appointments billed {}", ledger.appointments)?;
        writeln!(out, "  Billed       {:>14}", self.money(ledger.billed))?;
        writeln!(out, "  Collected    {:>14}", self.money(ledger.collected))?;
        writeln!(out, "  Outstanding  {:>14}", self.money(ledger.outstanding))?;
        writeln!(
            out,
            "  Paid {}   Partially Paid {}   Unpaid {}",
            ledger.count(PaymentStatus::Paid),
            ledger.count(PaymentStatus::PartiallyPaid),
            ledger.count(PaymentStatus::Unpaid)
        )?;
        Ok(())
    }

    fn write_outstanding(&self, rows: &[OutstandingBalance], out: &mut dyn Write) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        writeln!(out)?;
        writeln!(out, "{}", "Outstanding balances".bold())?;
        for row in rows {
            writeln!(
                out,
                "  {:<9} {:<11} {:<22} {:>12}  {}",
                row.appointment_id,
                format_date(&row.date),
                fit(&row.patient_name, 22),
                self.money(row.billing.balance),
                status_label(row.billing.status)
            )?;
        }
        Ok(())
    }
}

fn status_label(status: PaymentStatus) -> String {
    match status {
        PaymentStatus::Paid => status.to_string().green().to_string(),
        PaymentStatus::PartiallyPaid => status.to_string().yellow().to_string(),
        PaymentStatus::Unpaid => status.to_string().red().to_string(),
    }
}

fn field(out: &mut dyn Write, label: &str, value: &str) -> Result<()> {
    writeln!(out, "  {:<14} {}", format!("{}:", label), value)?;
    Ok(())
}

fn write_patient_table(patients: &[&Patient], out: &mut dyn Write) -> Result<()> {
    if patients.is_empty() {
        writeln!(out, "No patients.")?;
        return Ok(());
    }
    writeln!(out, "{:<9} {:<24} {:>4} {:<7} {:<18} {}", "ID", "Name", "Age", "Gender", "Phone", "Registered")?;
    for p in patients {
        writeln!(
            out,
            "{:<9} {:<24} {:>4} {:<7} {:<18} {}",
            p.id,
            fit(&p.name, 24),
            p.age.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string()),
            p.gender.map(|g| g.to_string()).unwrap_or_else(|| "-".to_string()),
            fit(&p.phone, 18),
            format_optional_date(p.registered_on.as_deref())
        )?;
    }
    Ok(())
}

fn write_prescription_table(state: &ClinicState, prescriptions: &[&Prescription], out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{:<8} {:<11} {:<18} {:<9} {:<24} {}", "ID", "Date", "Patient", "Visit", "Diagnosis", "Items")?;
    for rx in prescriptions {
        let name = state.patient(rx.patient_id).map(|p| p.name.as_str()).unwrap_or("-");
        writeln!(
            out,
            "{:<8} {:<11} {:<18} {:<9} {:<24} {}",
            rx.id,
            format_date(&rx.date),
            fit(name, 18),
            rx.appointment_id,
            fit(rx.diagnosis.as_deref().unwrap_or("-"), 24),
            rx.medications.len()
        )?;
    }
    Ok(())
}

fn merge_patient(draft: &mut PatientDraft, fields: PatientFields) {
    if let Some(name) = fields.name {
        draft.name = name;
    }
    if let Some(phone) = fields.phone {
        draft.phone = phone;
    }
    if fields.age.is_some() {
        draft.age = fields.age;
    }
    if fields.gender.is_some() {
        draft.gender = fields.gender;
    }
    if fields.date_of_birth.is_some() {
        draft.date_of_birth = fields.date_of_birth;
    }
    if fields.email.is_some() {
        draft.email = fields.email;
    }
    if fields.address.is_some() {
        draft.address = fields.address;
    }
    if fields.blood_group.is_some() {
        draft.blood_group = fields.blood_group;
    }
    if fields.allergies.is_some() {
        draft.allergies = fields.allergies;
    }
    if fields.medical_history.is_some() {
        draft.medical_history = fields.medical_history;
    }
}

fn merge_appointment(draft: &mut AppointmentDraft, fields: AppointmentFields) {
    if fields.patient.is_some() {
        draft.patient_id = fields.patient;
    }
    if let Some(date) = fields.date {
        draft.date = date;
    }
    if let Some(time) = fields.time {
        draft.time = time;
    }
    if let Some(reason) = fields.reason {
        draft.reason = reason;
    }
    if let Some(status) = fields.status {
        draft.status = status;
    }
    if fields.notes.is_some() {
        draft.notes = fields.notes;
    }
    if fields.diagnosis.is_some() {
        draft.diagnosis = fields.diagnosis;
    }
    if let Some(fee) = fields.fee {
        draft.total_fee = fee;
    }
}

fn merge_prescription(draft: &mut PrescriptionDraft, fields: PrescriptionFields) {
    if fields.appointment.is_some() {
        draft.appointment_id = fields.appointment;
    }
    if let Some(date) = fields.date {
        draft.date = date;
    }
    if fields.diagnosis.is_some() {
        draft.diagnosis = fields.diagnosis;
    }
    if !fields.medications.is_empty() {
        draft.medications = fields.medications;
    }
    if fields.advice.is_some() {
        draft.advice = fields.advice;
    }
    if fields.follow_up.is_some() {
        draft.follow_up_date = fields.follow_up;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::{
        AppointmentCommandWrapper, BillingCommandWrapper, PatientCommandWrapper, PrescriptionCommandWrapper,
    };
    use clinic_lib::seed::load_seed;
    use models::errors::{ClinicError, ValidationError};
    use models::{MedicationItem, PaymentMethod};

    /// Answers confirmations from a script and records the questions.
    struct ScriptedPrompter {
        answer: bool,
        asked: Vec<String>,
    }

    impl ScriptedPrompter {
        fn answering(answer: bool) -> Self {
            ScriptedPrompter { answer, asked: Vec::new() }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn confirm(&mut self, question: &str) -> Result<bool> {
            self.asked.push(question.to_string());
            Ok(self.answer)
        }
    }

    fn session() -> Session {
        Session::new(Store::new(load_seed(None).unwrap()), ClinicConfig::default())
    }

    fn run(session: &mut Session, command: ClinicCommand, prompter: &mut ScriptedPrompter) -> Result<String> {
        let mut out = Vec::new();
        session.execute(command, prompter, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn patient(action: PatientAction) -> ClinicCommand {
        ClinicCommand::Patient(PatientCommandWrapper { command: action })
    }

    fn appointment(action: AppointmentAction) -> ClinicCommand {
        ClinicCommand::Appointment(AppointmentCommandWrapper { command: action })
    }

    fn prescription(action: PrescriptionAction) -> ClinicCommand {
        ClinicCommand::Prescription(PrescriptionCommandWrapper { command: action })
    }

    fn pay(id: u64, amount: i64) -> ClinicCommand {
        appointment(AppointmentAction::Pay {
            id: AppointmentId(id),
            amount: Decimal::from(amount),
            method: PaymentMethod::Cash,
            note: None,
        })
    }

    #[test]
    fn should_add_patient_with_next_id() {
        let mut session = session();
        let mut prompter = ScriptedPrompter::answering(false);
        let fields = PatientFields {
            name: Some("Nikhil Das".to_string()),
            phone: Some("+91 98860 12345".to_string()),
            ..Default::default()
        };
        let text = run(&mut session, patient(PatientAction::Add(fields)), &mut prompter).unwrap();
        assert!(text.contains("patient PAT-0006 added"));

        let listed = run(&mut session, patient(PatientAction::List), &mut prompter).unwrap();
        assert!(listed.contains("Nikhil Das"));
    }

    #[test]
    fn should_align_patient_table_columns() {
        let mut session = session();
        let listed = run(&mut session, patient(PatientAction::List), &mut ScriptedPrompter::answering(false)).unwrap();
        let mut lines = listed.lines();
        let header = lines.next().unwrap();
        let name_column = header.find("Name").unwrap();
        assert_eq!(name_column, 10);
        for line in lines {
            assert!(line.starts_with("PAT-"));
            assert_eq!(&line[8..name_column], "  ");
        }
        assert!(listed.contains("PAT-0001  Asha Rao"));
    }

    #[test]
    fn should_reject_patient_without_phone() {
        let mut session = session();
        let fields = PatientFields { name: Some("No Phone".to_string()), ..Default::default() };
        let err = run(&mut session, patient(PatientAction::Add(fields)), &mut ScriptedPrompter::answering(false))
            .unwrap_err();
        assert!(err.to_string().contains("phone is required"));
        assert_eq!(session.state().patients().len(), 5);
    }

    #[test]
    fn should_keep_other_fields_on_update() {
        let mut session = session();
        let fields = PatientFields { email: Some("asha.rao@example.in".to_string()), ..Default::default() };
        run(
            &mut session,
            patient(PatientAction::Update { id: PatientId(1), fields }),
            &mut ScriptedPrompter::answering(false),
        )
        .unwrap();
        let updated = session.state().patient(PatientId(1)).unwrap();
        assert_eq!(updated.name, "Asha Rao");
        assert_eq!(updated.email.as_deref(), Some("asha.rao@example.in"));
    }

    #[test]
    fn should_keep_patient_when_deletion_declined() {
        let mut session = session();
        let mut prompter = ScriptedPrompter::answering(false);
        let text = run(&mut session, patient(PatientAction::Delete { id: PatientId(1), yes: false }), &mut prompter)
            .unwrap();
        assert!(text.contains("Deletion cancelled."));
        assert_eq!(prompter.asked.len(), 1);
        assert!(prompter.asked[0].contains("Asha Rao"));
        assert!(session.state().patient(PatientId(1)).is_some());
    }

    #[test]
    fn should_cascade_confirmed_patient_deletion() {
        let mut session = session();
        let mut prompter = ScriptedPrompter::answering(true);
        run(&mut session, patient(PatientAction::Delete { id: PatientId(1), yes: false }), &mut prompter).unwrap();
        let state = session.state();
        assert!(state.patient(PatientId(1)).is_none());
        assert!(state.appointments().iter().all(|a| a.patient_id != PatientId(1)));
        assert!(state.prescriptions().iter().all(|rx| rx.patient_id != PatientId(1)));
        assert!(state.patient(PatientId(2)).is_some());
    }

    #[test]
    fn should_skip_prompt_with_yes() {
        let mut session = session();
        let mut prompter = ScriptedPrompter::answering(false);
        run(
            &mut session,
            appointment(AppointmentAction::Delete { id: AppointmentId(2), yes: true }),
            &mut prompter,
        )
        .unwrap();
        assert!(prompter.asked.is_empty());
        assert!(session.state().appointment(AppointmentId(2)).is_none());
        assert!(queries::prescriptions_for_appointment(session.state(), AppointmentId(2)).is_empty());
    }

    #[test]
    fn should_settle_partial_payment() {
        let mut session = session();
        let text = run(&mut session, pay(2, 300), &mut ScriptedPrompter::answering(false)).unwrap();
        assert!(text.contains("payment recorded on APT-0002"));
        assert!(text.contains("Balance ₹0.00"));
        let rec = billing::reconcile_appointment(session.state().appointment(AppointmentId(2)).unwrap());
        assert_eq!(rec.status, PaymentStatus::Paid);
    }

    #[test]
    fn should_reject_overpayment_without_changing_state() {
        let mut session = session();
        let before = session.state().clone();
        let err = run(&mut session, pay(2, 301), &mut ScriptedPrompter::answering(false)).unwrap_err();
        let err = err.downcast::<ClinicError>().unwrap();
        assert!(matches!(
            err,
            ClinicError::Validation(ValidationError::PaymentExceedsBalance { .. })
        ));
        assert_eq!(session.state(), &before);
    }

    #[test]
    fn should_create_no_record_for_blank_prescription() {
        let mut session = session();
        let fields = PrescriptionFields {
            appointment: Some(AppointmentId(3)),
            medications: vec![MedicationItem { name: "  ".to_string(), ..Default::default() }],
            ..Default::default()
        };
        let err = run(&mut session, prescription(PrescriptionAction::Add(fields)), &mut ScriptedPrompter::answering(false))
            .unwrap_err();
        assert!(err.to_string().contains("no medication entries"));
        assert_eq!(session.state().prescriptions().len(), 3);
    }

    #[test]
    fn should_take_prescription_patient_from_appointment() {
        let mut session = session();
        let fields = PrescriptionFields {
            appointment: Some(AppointmentId(3)),
            date: Some("2024-03-18".to_string()),
            medications: vec![MedicationItem { name: "Naproxen".to_string(), ..Default::default() }],
            ..Default::default()
        };
        let text = run(&mut session, prescription(PrescriptionAction::Add(fields)), &mut ScriptedPrompter::answering(false))
            .unwrap();
        assert!(text.contains("prescription RX-0004 added"));
        let rx = session.state().prescription(PrescriptionId(4)).unwrap();
        assert_eq!(rx.patient_id, PatientId(3));
    }

    #[test]
    fn should_write_printout_to_file() {
        let mut session = session();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rx1.txt");
        run(
            &mut session,
            prescription(PrescriptionAction::Print { id: PrescriptionId(1), out: Some(path.clone()) }),
            &mut ScriptedPrompter::answering(false),
        )
        .unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("SUNRISE FAMILY CLINIC"));
        assert!(text.contains("Asha Rao"));
    }

    #[test]
    fn should_report_missing_prescription() {
        let mut session = session();
        let err = run(
            &mut session,
            prescription(PrescriptionAction::Print { id: PrescriptionId(42), out: None }),
            &mut ScriptedPrompter::answering(false),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "prescription RX-0042 was not found");
    }

    #[test]
    fn should_emit_ledger_as_json() {
        let mut session = session();
        let text = run(
            &mut session,
            ClinicCommand::Billing(BillingCommandWrapper {
                command: BillingAction::Summary { patient: Some(PatientId(2)), json: true },
            }),
            &mut ScriptedPrompter::answering(false),
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["appointments"], 2);
        assert_eq!(value["outstanding"], "300");
    }

    #[test]
    fn should_render_dashboard_for_day() {
        let mut session = session();
        let text = run(
            &mut session,
            ClinicCommand::Dashboard { today: NaiveDate::from_ymd_opt(2024, 3, 18), json: false },
            &mut ScriptedPrompter::answering(false),
        )
        .unwrap();
        assert!(text.contains("Sunrise Family Clinic"));
        assert!(text.contains("Today 1"));
        assert!(text.contains("APT-0003"));
    }
}
