// server/src/cli/interactive.rs

// The interactive shell: reads lines with rustyline, splits them with shlex
// and parses them through the same clap tree as one-shot commands.

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use log::debug;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::cli::commands::{ShellCommand, ShellLine};
use crate::cli::handlers::{EditorPrompter, Session};

pub const PROMPT: &str = "clinic> ";
pub const HISTORY_FILE: &str = "clinic_cli_history.txt";

/// What the shell should do after a line.
#[derive(Debug)]
pub enum LineOutcome {
    Continue,
    Exit,
}

/// Parses one shell line. `Ok(None)` means the line was blank.
pub fn parse_line(line: &str) -> Result<Option<ShellCommand>, String> {
    let args = shlex::split(line).ok_or_else(|| "Malformed input. Please check quoting.".to_string())?;
    if args.is_empty() {
        return Ok(None);
    }
    match ShellLine::try_parse_from(args) {
        Ok(parsed) => Ok(Some(parsed.command)),
        Err(e) => Err(e.render().to_string()),
    }
}

pub fn print_welcome_screen(session: &Session, out: &mut dyn Write) -> Result<()> {
    let width = 64;
    let border = "=".repeat(width);
    let state = session.state();
    writeln!(out, "{}", border.cyan())?;
    writeln!(out, "{:^width$}", "Clinic Records Shell".bold(), width = width)?;
    writeln!(
        out,
        "{:^width$}",
        format!(
            "{} patients, {} appointments, {} prescriptions loaded",
            state.patients().len(),
            state.appointments().len(),
            state.prescriptions().len()
        ),
        width = width
    )?;
    writeln!(out, "{:^width$}", "Type 'help' for commands, 'exit' or 'quit' to leave.".yellow(), width = width)?;
    writeln!(out, "{}", border.cyan())?;
    Ok(())
}

/// Handles one line. Errors from the command are printed as notices so the
/// shell keeps running.
pub fn handle_line(session: &mut Session, line: &str, editor: &mut DefaultEditor, out: &mut dyn Write) -> Result<LineOutcome> {
    let command = match parse_line(line) {
        Ok(Some(command)) => command,
        Ok(None) => return Ok(LineOutcome::Continue),
        Err(message) => {
            writeln!(out, "{}", message.trim_end())?;
            return Ok(LineOutcome::Continue);
        }
    };
    debug!("parsed shell command: {:?}", command);

    match command {
        ShellCommand::Exit => return Ok(LineOutcome::Exit),
        ShellCommand::Clear => {
            write!(out, "\x1B[2J\x1B[1;1H")?;
            out.flush()?;
        }
        ShellCommand::Clinic(command) => {
            let mut prompter = EditorPrompter(editor);
            if let Err(e) = session.execute(command, &mut prompter, out) {
                writeln!(out, "{}", format!("Error: {}", e).red())?;
                debug!("full error: {:#}", e);
            }
        }
    }
    Ok(LineOutcome::Continue)
}

/// Main loop for the interactive mode.
pub fn run_cli_interactive(session: &mut Session) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let _ = rl.load_history(HISTORY_FILE);
    let stdout = io::stdout();
    print_welcome_screen(session, &mut stdout.lock())?;

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line).ok();
                let outcome = handle_line(session, line, &mut rl, &mut stdout.lock())?;
                if let LineOutcome::Exit = outcome {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Ctrl-C received. Type 'exit' to quit.");
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                eprintln!("Readline error: {:?}", err);
                break;
            }
        }
    }

    rl.save_history(HISTORY_FILE).context("Failed to save history")?;
    println!("Goodbye!");
    Ok(())
}
