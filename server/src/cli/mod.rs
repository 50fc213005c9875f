// server/src/cli/mod.rs

// Declares the modules within the 'cli' directory and re-exports the
// entry points.

pub mod cli;
pub mod commands;
pub mod handlers;
pub mod interactive;

pub use cli::start_cli;
pub use commands::{
    AppointmentAction, BillingAction, CliArgs, ClinicCommand, PatientAction, PrescriptionAction, ShellCommand,
    ShellLine,
};
pub use handlers::{EditorPrompter, Prompter, Session, StdinPrompter};
pub use interactive::{handle_line, parse_line, print_welcome_screen, run_cli_interactive, LineOutcome};
