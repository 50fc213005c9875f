// server/src/cli/commands.rs

// Command-line arguments and subcommands for the clinic CLI. The same tree
// is parsed for one-shot invocations and for each interactive shell line.
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use clinic_lib::util::parse_date;
use models::{
    parse_amount, AppointmentId, AppointmentStatus, Gender, MedicationItem, PatientId, PaymentMethod,
    PrescriptionId,
};

#[derive(Debug, Parser)]
#[command(name = "clinic-cli")]
#[command(version = "0.1.0")]
#[command(about = "Patient, appointment, prescription and billing records for a single practice")]
pub struct CliArgs {
    /// TOML configuration file. Defaults to ./clinic.toml when present.
    #[arg(long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// Directory holding patients.json, appointments.json and prescriptions.json.
    #[arg(long, global = true, env = "CLINIC_SEED_DIR", value_hint = clap::ValueHint::DirPath)]
    pub seed_dir: Option<PathBuf>,
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Option<ClinicCommand>,
}

#[derive(Debug, Subcommand, PartialEq)]
pub enum ClinicCommand {
    /// Register, look up and edit patients
    Patient(PatientCommandWrapper),
    /// Schedule visits and record payments
    Appointment(AppointmentCommandWrapper),
    /// Write and print prescriptions
    Prescription(PrescriptionCommandWrapper),
    /// Payment reconciliation and totals
    Billing(BillingCommandWrapper),
    /// Practice overview for a day
    Dashboard {
        /// Day to report on. Defaults to the local date.
        #[arg(long, value_parser = parse_day)]
        today: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Start the interactive shell (the default)
    Interactive,
}

#[derive(Debug, Args, PartialEq)]
pub struct PatientCommandWrapper {
    #[command(subcommand)]
    pub command: PatientAction,
}

#[derive(Debug, Args, PartialEq)]
pub struct AppointmentCommandWrapper {
    #[command(subcommand)]
    pub command: AppointmentAction,
}

#[derive(Debug, Args, PartialEq)]
pub struct PrescriptionCommandWrapper {
    #[command(subcommand)]
    pub command: PrescriptionAction,
}

#[derive(Debug, Args, PartialEq)]
pub struct BillingCommandWrapper {
    #[command(subcommand)]
    pub command: BillingAction,
}

#[derive(Debug, Subcommand, PartialEq)]
pub enum PatientAction {
    List,
    Show {
        id: PatientId,
    },
    /// Match on name, phone or email
    Search {
        term: String,
    },
    Add(PatientFields),
    /// Change the given fields and keep the rest
    Update {
        id: PatientId,
        #[command(flatten)]
        fields: PatientFields,
    },
    /// Delete a patient together with their appointments and prescriptions
    Delete {
        id: PatientId,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Debug, Args, PartialEq, Default)]
pub struct PatientFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub age: Option<u32>,
    #[arg(long)]
    pub gender: Option<Gender>,
    #[arg(long = "dob")]
    pub date_of_birth: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub blood_group: Option<String>,
    #[arg(long)]
    pub allergies: Option<String>,
    #[arg(long = "history")]
    pub medical_history: Option<String>,
}

#[derive(Debug, Subcommand, PartialEq)]
pub enum AppointmentAction {
    List {
        #[arg(long)]
        patient: Option<PatientId>,
        /// Only this day, ordered by time
        #[arg(long, value_parser = parse_day)]
        date: Option<NaiveDate>,
    },
    Show {
        id: AppointmentId,
    },
    Add(AppointmentFields),
    Update {
        id: AppointmentId,
        #[command(flatten)]
        fields: AppointmentFields,
    },
    /// Delete an appointment and the prescriptions written for it
    Delete {
        id: AppointmentId,
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Record a payment against the outstanding balance
    Pay {
        id: AppointmentId,
        #[arg(value_parser = parse_amount)]
        amount: Decimal,
        #[arg(long, default_value = "cash")]
        method: PaymentMethod,
        #[arg(long)]
        note: Option<String>,
    },
}

#[derive(Debug, Args, PartialEq, Default)]
pub struct AppointmentFields {
    #[arg(long)]
    pub patient: Option<PatientId>,
    #[arg(long)]
    pub date: Option<String>,
    #[arg(long)]
    pub time: Option<String>,
    #[arg(long)]
    pub reason: Option<String>,
    #[arg(long)]
    pub status: Option<AppointmentStatus>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub diagnosis: Option<String>,
    #[arg(long, value_parser = parse_amount)]
    pub fee: Option<Decimal>,
}

#[derive(Debug, Subcommand, PartialEq)]
pub enum PrescriptionAction {
    List {
        #[arg(long)]
        patient: Option<PatientId>,
        #[arg(long)]
        appointment: Option<AppointmentId>,
    },
    Show {
        id: PrescriptionId,
    },
    Add(PrescriptionFields),
    /// Replace the given fields. Passing any --med replaces the whole list.
    Update {
        id: PrescriptionId,
        #[command(flatten)]
        fields: PrescriptionFields,
    },
    Delete {
        id: PrescriptionId,
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Render the printable prescription
    Print {
        id: PrescriptionId,
        /// Write to a file instead of stdout
        #[arg(long, value_hint = clap::ValueHint::FilePath)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Args, PartialEq, Default)]
pub struct PrescriptionFields {
    #[arg(long)]
    pub appointment: Option<AppointmentId>,
    #[arg(long)]
    pub date: Option<String>,
    #[arg(long)]
    pub diagnosis: Option<String>,
    /// "name|dosage|frequency|duration|instructions", repeatable
    #[arg(long = "med", value_parser = parse_medication)]
    pub medications: Vec<MedicationItem>,
    #[arg(long)]
    pub advice: Option<String>,
    #[arg(long)]
    pub follow_up: Option<String>,
}

#[derive(Debug, Subcommand, PartialEq)]
pub enum BillingAction {
    /// Fee, payments and balance of one appointment
    Show {
        id: AppointmentId,
    },
    /// Totals across all appointments or one patient's
    Summary {
        #[arg(long)]
        patient: Option<PatientId>,
        #[arg(long)]
        json: bool,
    },
}

/// One line typed into the interactive shell.
#[derive(Debug, Parser)]
#[command(name = "clinic", no_binary_name = true, disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

#[derive(Debug, Subcommand, PartialEq)]
pub enum ShellCommand {
    #[command(flatten)]
    Clinic(ClinicCommand),
    /// Clear the screen
    #[command(alias = "clean")]
    Clear,
    /// Leave the shell
    #[command(aliases = ["quit", "q"])]
    Exit,
}

pub fn parse_day(raw: &str) -> Result<NaiveDate, String> {
    parse_date(raw).ok_or_else(|| format!("'{}' is not a recognised date", raw))
}

/// Parses `name|dosage|frequency|duration|instructions`. Trailing parts may be
/// left off.
pub fn parse_medication(raw: &str) -> Result<MedicationItem, String> {
    let mut parts = raw.split('|').map(|p| p.trim().to_string());
    let item = MedicationItem {
        name: parts.next().unwrap_or_default(),
        dosage: parts.next().unwrap_or_default(),
        frequency: parts.next().unwrap_or_default(),
        duration: parts.next().unwrap_or_default(),
        instructions: parts.next().unwrap_or_default(),
    };
    if parts.next().is_some() {
        return Err(format!("'{}' has more than five '|' separated parts", raw));
    }
    Ok(item)
}
