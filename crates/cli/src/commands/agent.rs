//! Admin agent commands: run, scan and reset.

use std::io::{self, BufRead, Write};

use prodigital_admin::services::{CommandOutcome, ResetError, SubmitError};
use prodigital_core::LogEntry;
use thiserror::Error;

use super::{SetupError, open_state};

#[derive(Debug, Error)]
pub enum AgentCommandError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error(transparent)]
    Reset(#[from] ResetError),

    #[error("{0}")]
    Failed(String),

    #[error("Failed to read confirmation: {0}")]
    Io(#[from] io::Error),
}

/// Send one command through the agent and print the audit trail it left.
pub async fn run(command: &str) -> Result<(), AgentCommandError> {
    let state = open_state().await?;
    let report = state.agent().process_command(command).await?;
    print_logs(&report.logs);

    match report.outcome {
        CommandOutcome::Applied { summary, .. } => println!("{summary}"),
        CommandOutcome::NoChange { message } => println!("No change: {message}"),
        CommandOutcome::UnknownAction { action } => println!("Ignored unknown action '{action}'"),
        CommandOutcome::ReferenceNotFound { id, action } => {
            println!("Cannot {action} product {id}: not found");
        }
        CommandOutcome::Failed(err) => return Err(AgentCommandError::Failed(err.to_string())),
    }
    Ok(())
}

pub async fn scan() -> Result<(), AgentCommandError> {
    let state = open_state().await?;
    let mark = state.agent().log().len();
    let status = state.agent().scan_site().await?;
    print_logs(&state.agent().log().since(mark));
    println!("{status}");
    Ok(())
}

/// Restore seed content. Credentials are kept.
pub async fn reset(skip_confirm: bool) -> Result<(), AgentCommandError> {
    if !skip_confirm && !confirm("Reset catalog and site config to defaults? [y/N] ")? {
        println!("Aborted");
        return Ok(());
    }
    let state = open_state().await?;
    state.agent().reset_content().await?;
    println!("Site content reset to defaults");
    Ok(())
}

fn print_logs(entries: &[LogEntry]) {
    for entry in entries {
        println!("{}", entry.terminal_line());
    }
}

fn confirm(prompt: &str) -> io::Result<bool> {
    let mut stdout = io::stdout();
    stdout.write_all(prompt.as_bytes())?;
    stdout.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
