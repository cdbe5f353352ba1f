//! Admin command orchestration.
//!
//! [`AdminAgent`] owns the site state for the lifetime of the admin process.
//! One command runs at a time: snapshot state, build the prompt, resolve a
//! completion through the credential pool, parse the reply, apply it to a
//! copy of the state and persist the copy before committing it.
//!
//! Every failure is caught here and turned into audit log entries. Callers
//! only see [`SubmitError`] for requests that never started.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use prodigital_core::{
    AgentInstruction, InstructionError, KeyValueStore, LogEntry, Product, ProductId, SiteConfig,
    SiteState, StoreError,
};
use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::config::AgentSettings;
use crate::credentials::{CredentialError, CredentialPool, SlotSummary};

use super::audit::AuditLog;
use super::executor::{CompletionBackend, ExecutorError, RequestExecutor};
use super::interpreter::{self, PREVIEW_CHARS};
use super::mutator::{self, MutationError, MutationOutcome, ProtectedFields};

/// Monitor status shown before the first scan.
pub const MONITOR_IDLE: &str = "Run a scan to get an AI summary of the catalog.";
/// Monitor status while a scan is running.
pub const MONITOR_SCANNING: &str = "Analyzing... please wait.";
/// Monitor status after a failed scan.
pub const MONITOR_FAILED: &str = "Scan failed. Check the terminal log.";

/// Where the current command is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStage {
    #[default]
    Idle,
    BuildingPrompt,
    AwaitingModel,
    Validating,
    Applying,
    Persisting,
}

/// Reasons a submission is refused before anything runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("another command is still running")]
    Busy,
    #[error("command is empty")]
    EmptyCommand,
}

/// Errors from credential edits and resets.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("failed to persist site state: {0}")]
    Persistence(#[from] StoreError),
}

/// Terminal failures of a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("No API keys configured.")]
    NoCredentialsConfigured,

    #[error("All API keys failed. Last error: {last_error}")]
    AllCredentialsExhausted { attempts: usize, last_error: String },

    /// The reply was not JSON, did not match a known shape, or would break
    /// catalog invariants.
    #[error("malformed AI response ({reason}): {preview}")]
    MalformedAgentResponse { reason: String, preview: String },

    #[error("failed to build prompt: {0}")]
    Prompt(#[from] serde_json::Error),

    #[error("failed to persist site state: {0}")]
    Persistence(#[from] StoreError),
}

impl CommandError {
    /// Stable machine-readable name.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NoCredentialsConfigured => "no_credentials_configured",
            Self::AllCredentialsExhausted { .. } => "all_credentials_exhausted",
            Self::MalformedAgentResponse { .. } => "malformed_agent_response",
            Self::Prompt(_) => "prompt",
            Self::Persistence(_) => "persistence",
        }
    }

    fn malformed(reason: impl ToString, raw: &str) -> Self {
        Self::MalformedAgentResponse {
            reason: reason.to_string(),
            preview: interpreter::preview(raw, PREVIEW_CHARS),
        }
    }
}

impl From<ExecutorError> for CommandError {
    fn from(err: ExecutorError) -> Self {
        match err {
            ExecutorError::NoCredentialsConfigured => Self::NoCredentialsConfigured,
            ExecutorError::AllCredentialsExhausted {
                attempts,
                last_error,
            } => Self::AllCredentialsExhausted {
                attempts,
                last_error,
            },
            // Single-attempt failures never leave the executor.
            ExecutorError::CredentialAttemptFailed { reason, .. } => {
                Self::AllCredentialsExhausted {
                    attempts: 1,
                    last_error: reason,
                }
            }
        }
    }
}

impl Serialize for CommandError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("CommandError", 2)?;
        s.serialize_field("kind", self.kind())?;
        s.serialize_field("message", &self.to_string())?;
        s.end()
    }
}

/// How a command ended.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// State changed and was persisted.
    Applied { action: &'static str, summary: String },
    /// The agent chose not to change anything.
    NoChange { message: String },
    /// The reply named an action this panel does not know.
    UnknownAction { action: String },
    /// The update or delete target does not exist.
    ReferenceNotFound { id: ProductId, action: &'static str },
    Failed(CommandError),
}

impl CommandOutcome {
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Result of one command with the log entries it produced.
#[derive(Debug, Serialize)]
pub struct CommandReport {
    #[serde(flatten)]
    pub outcome: CommandOutcome,
    pub logs: Vec<LogEntry>,
}

/// Owner of site state and the audit log.
pub struct AdminAgent {
    executor: RequestExecutor,
    store: Arc<dyn KeyValueStore>,
    state: tokio::sync::Mutex<SiteState>,
    log: AuditLog,
    stage: watch::Sender<CommandStage>,
    busy: AtomicBool,
    monitor_status: Mutex<String>,
    model: String,
    protected: ProtectedFields,
}

/// Clears the in-flight flag and stage however the command ends.
struct BusyGuard<'a> {
    agent: &'a AdminAgent,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.agent.stage.send_replace(CommandStage::Idle);
        self.agent.busy.store(false, Ordering::Release);
    }
}

impl AdminAgent {
    /// Load state from `store` and wire up the executor.
    #[must_use]
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        backend: Arc<dyn CompletionBackend>,
        settings: &AgentSettings,
    ) -> Self {
        let state = SiteState::load(store.as_ref());
        info!(
            products = state.products.len(),
            credentials = CredentialPool::from_raw(&state.credentials).active().len(),
            policy = %settings.fallback_policy,
            "Site state loaded"
        );

        Self {
            executor: RequestExecutor::new(
                backend,
                settings.fallback_policy,
                settings.attempt_timeout,
            ),
            store,
            state: tokio::sync::Mutex::new(state),
            log: AuditLog::new(),
            stage: watch::Sender::new(CommandStage::Idle),
            busy: AtomicBool::new(false),
            monitor_status: Mutex::new(MONITOR_IDLE.to_string()),
            model: settings.model.clone(),
            protected: ProtectedFields::new(settings.contact_email.clone()),
        }
    }

    /// Audit log shared with the HTTP layer.
    #[must_use]
    pub const fn log(&self) -> &AuditLog {
        &self.log
    }

    #[must_use]
    pub fn stage(&self) -> CommandStage {
        *self.stage.borrow()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn monitor_status(&self) -> String {
        self.monitor_status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn catalog(&self) -> Vec<Product> {
        self.state.lock().await.products.clone()
    }

    pub async fn site_config(&self) -> SiteConfig {
        self.state.lock().await.site_config.clone()
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Run one free-text admin command.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCommand` for blank input and `Busy` while another command
    /// or scan is running. Nothing is logged in either case.
    #[instrument(skip(self, command), fields(len = command.len()))]
    pub async fn process_command(&self, command: &str) -> Result<CommandReport, SubmitError> {
        let command = command.trim();
        if command.is_empty() {
            return Err(SubmitError::EmptyCommand);
        }
        let _guard = self.begin()?;

        let mark = self.log.len();
        self.log.info(format!("Admin Command: \"{command}\""));

        let outcome = match self.run_command(command).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.log.error(format!("Admin Action Failed: {err}"));
                CommandOutcome::Failed(err)
            }
        };

        Ok(CommandReport {
            outcome,
            logs: self.log.since(mark),
        })
    }

    async fn run_command(&self, command: &str) -> Result<CommandOutcome, CommandError> {
        self.set_stage(CommandStage::BuildingPrompt);
        let (prompt, pool) = {
            let state = self.state.lock().await;
            (
                interpreter::command_prompt(&state.products, &state.site_config, command)?,
                CredentialPool::from_raw(&state.credentials),
            )
        };

        self.set_stage(CommandStage::AwaitingModel);
        let request = interpreter::command_request(&self.model, prompt);
        let completion = self.executor.execute(&pool, &request, &self.log).await?;

        self.set_stage(CommandStage::Validating);
        let instruction = match AgentInstruction::parse(&completion.text) {
            Ok(instruction) => instruction,
            Err(InstructionError::UnknownAction(action)) => {
                self.log
                    .warning(format!("AI returned unknown action \"{action}\"; nothing changed"));
                return Ok(CommandOutcome::UnknownAction { action });
            }
            Err(err) => return Err(CommandError::malformed(err, &completion.text)),
        };

        self.set_stage(CommandStage::Applying);
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let outcome = mutator::apply(&instruction, &mut next, &self.protected, Utc::now())
            .map_err(|err: MutationError| CommandError::malformed(err, &completion.text))?;

        match &outcome {
            MutationOutcome::NoChange { .. } => {
                let message = instruction
                    .message()
                    .unwrap_or("No changes made.")
                    .to_string();
                self.log.info(format!("AI: {message}"));
                Ok(CommandOutcome::NoChange { message })
            }
            MutationOutcome::NotFound { id, action } => {
                self.log.warning(outcome.summary());
                Ok(CommandOutcome::ReferenceNotFound {
                    id: id.clone(),
                    action: *action,
                })
            }
            MutationOutcome::Updated { id, .. } if !outcome.changed() => {
                let message = format!("Update of product {id} changed nothing");
                self.log.warning(message.clone());
                Ok(CommandOutcome::NoChange { message })
            }
            _ => {
                self.set_stage(CommandStage::Persisting);
                next.save_content(self.store.as_ref())?;
                *state = next;
                drop(state);

                if matches!(
                    outcome,
                    MutationOutcome::Replaced {
                        contact_reset: true,
                        ..
                    }
                ) {
                    self.log.warning(format!(
                        "Contact email is protected; kept {}",
                        self.protected.contact_email
                    ));
                }

                let summary = instruction
                    .message()
                    .map_or_else(|| outcome.summary(), ToString::to_string);
                self.log.success(summary.clone());
                Ok(CommandOutcome::Applied {
                    action: instruction.action(),
                    summary,
                })
            }
        }
    }

    // =========================================================================
    // Site monitor
    // =========================================================================

    /// Ask the model for a short analysis of the catalog.
    ///
    /// The result becomes the monitor status. A failed scan sets
    /// [`MONITOR_FAILED`] and never touches site state.
    ///
    /// # Errors
    ///
    /// Returns `Busy` while a command or another scan is running.
    #[instrument(skip(self))]
    pub async fn scan_site(&self) -> Result<String, SubmitError> {
        let _guard = self.begin()?;
        self.set_monitor_status(MONITOR_SCANNING);

        self.set_stage(CommandStage::BuildingPrompt);
        let (prompt, pool) = {
            let state = self.state.lock().await;
            (
                interpreter::scan_prompt(&state.products),
                CredentialPool::from_raw(&state.credentials),
            )
        };

        let status = match prompt {
            Ok(prompt) => {
                self.set_stage(CommandStage::AwaitingModel);
                let request = interpreter::scan_request(&self.model, prompt);
                match self.executor.execute(&pool, &request, &self.log).await {
                    Ok(completion) => completion.text.trim().to_string(),
                    Err(err) => {
                        self.log.error(format!("Site scan failed: {err}"));
                        MONITOR_FAILED.to_string()
                    }
                }
            }
            Err(err) => {
                self.log.error(format!("Site scan failed: {err}"));
                MONITOR_FAILED.to_string()
            }
        };

        self.set_monitor_status(&status);
        Ok(status)
    }

    // =========================================================================
    // Credentials
    // =========================================================================

    /// Masked view of every slot.
    pub async fn credentials(&self) -> Vec<SlotSummary> {
        CredentialPool::from_raw(&self.state.lock().await.credentials).masked()
    }

    /// Append a credential and return its slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be persisted.
    pub async fn add_credential(&self, key: &str) -> Result<usize, AgentError> {
        self.edit_credentials(|pool| Ok(pool.push(key.trim())))
            .await
    }

    /// Replace the credential in `slot`.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot does not exist or the list cannot be
    /// persisted.
    pub async fn set_credential(&self, slot: usize, key: &str) -> Result<(), AgentError> {
        self.edit_credentials(|pool| pool.set(slot, key.trim()))
            .await
    }

    /// Remove the credential in `slot`.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot does not exist or the list cannot be
    /// persisted.
    pub async fn remove_credential(&self, slot: usize) -> Result<(), AgentError> {
        self.edit_credentials(|pool| pool.remove(slot)).await
    }

    /// Put `key` in the first blank slot when every slot is blank.
    ///
    /// Returns the slot used, or `None` when a credential was already set.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be persisted.
    pub async fn seed_credential(&self, key: &str) -> Result<Option<usize>, AgentError> {
        let mut state = self.state.lock().await;
        let mut pool = CredentialPool::from_raw(&state.credentials);
        if !pool.all_blank() || key.trim().is_empty() {
            return Ok(None);
        }

        let slot = pool.fill_first_blank(key.trim());
        let mut next = state.clone();
        next.credentials = pool.to_raw();
        next.save_credentials(self.store.as_ref())?;
        *state = next;
        info!(slot, "Seeded credential from environment");
        Ok(Some(slot))
    }

    async fn edit_credentials<T>(
        &self,
        edit: impl FnOnce(&mut CredentialPool) -> Result<T, CredentialError>,
    ) -> Result<T, AgentError> {
        let mut state = self.state.lock().await;
        let mut pool = CredentialPool::from_raw(&state.credentials);
        let result = edit(&mut pool)?;

        let mut next = state.clone();
        next.credentials = pool.to_raw();
        next.save_credentials(self.store.as_ref())?;
        *state = next;
        Ok(result)
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Restore the seed catalog and default site configuration.
    ///
    /// Credentials are kept.
    ///
    /// # Errors
    ///
    /// Returns `Busy` while a command is running, or a persistence error.
    pub async fn reset_content(&self) -> Result<(), ResetError> {
        let _guard = self.begin()?;
        let mut state = self.state.lock().await;
        let defaults = SiteState::default();
        let next = SiteState {
            credentials: state.credentials.clone(),
            ..defaults
        };
        next.save_content(self.store.as_ref())?;
        *state = next;
        self.log.warning("Catalog and site configuration reset to defaults");
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn begin(&self) -> Result<BusyGuard<'_>, SubmitError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Submission refused: agent busy");
            return Err(SubmitError::Busy);
        }
        Ok(BusyGuard { agent: self })
    }

    fn set_stage(&self, stage: CommandStage) {
        self.stage.send_replace(stage);
    }

    fn set_monitor_status(&self, status: &str) {
        status.clone_into(
            &mut self
                .monitor_status
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
    }
}

/// Errors from [`AdminAgent::reset_content`].
#[derive(Debug, Error)]
pub enum ResetError {
    #[error(transparent)]
    Busy(#[from] SubmitError),
    #[error("failed to persist site state: {0}")]
    Persistence(#[from] StoreError),
}
