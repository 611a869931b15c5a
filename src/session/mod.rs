//! Per-browser chat session: settings state machine plus conversation.
//!
//! ```text
//!                  initialize(module, experience)
//!  AwaitingSettings ──────────────────────────────▶ Ready { module, experience }
//!         ▲                                           │  submit(message)
//!         └──────────────── reset ────────────────────┘  (appends user, then assistant)
//! ```
//!
//! A [`Session`] is an explicit context object; handlers receive it through
//! the [`registry`] and mutate it under a per-session lock. Every
//! transition is also appended to an event log that survives `reset`.

pub mod catalog;
pub mod history;
pub mod registry;

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::llm::{ChatRequest, LlmProvider, LlmResponse, ProviderError};
use crate::prompt::{self, DEFAULT_SYSTEM_TEMPLATE};

pub use catalog::{Experience, Field, Module, PLACEHOLDER};
pub use history::{History, Role, Turn};
pub use registry::{SessionId, SessionRegistry, spawn_idle_sweeper};

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SessionError {
    /// One or both selectors were left unset.
    #[error("Please select all fields.")]
    IncompleteSelection { missing: Vec<Field> },
    #[error("unknown {field} choice: '{value}'")]
    UnknownChoice { field: Field, value: String },
    #[error("session already started; reset it to change settings")]
    AlreadyStarted,
    #[error("session not started; choose a module and experience first")]
    NotStarted,
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("a reply is already pending for this session")]
    TurnInFlight,
    #[error("no pending turn to record a reply for")]
    NoPendingTurn,
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl From<catalog::UnknownChoice> for SessionError {
    fn from(e: catalog::UnknownChoice) -> Self {
        SessionError::UnknownChoice { field: e.field, value: e.value }
    }
}

// ── State ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingSettings,
    Ready { module: Module, experience: Experience },
}

/// Audit record of one state transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    Initialized { module: Module, experience: Experience },
    TurnSubmitted { turn_index: usize },
    ReplyRecorded { turn_index: usize },
    ReplyFailed { error: String },
    Reset { discarded_turns: usize },
}

// ── Session ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    history: History,
    events: Vec<SessionEvent>,
    pending_reply: bool,
    system_template: Arc<str>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Arc::from(DEFAULT_SYSTEM_TEMPLATE))
    }
}

impl Session {
    /// Empty session that will build its persona from `system_template`.
    pub fn new(system_template: Arc<str>) -> Self {
        Self {
            state: SessionState::AwaitingSettings,
            history: History::new(),
            events: Vec::new(),
            pending_reply: false,
            system_template,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_started(&self) -> bool {
        matches!(self.state, SessionState::Ready { .. })
    }

    pub fn module(&self) -> Option<Module> {
        match self.state {
            SessionState::Ready { module, .. } => Some(module),
            SessionState::AwaitingSettings => None,
        }
    }

    pub fn experience(&self) -> Option<Experience> {
        match self.state {
            SessionState::Ready { experience, .. } => Some(experience),
            SessionState::AwaitingSettings => None,
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    /// Apply the two selector values.
    ///
    /// Unset values (missing, empty, or the placeholder) produce
    /// [`SessionError::IncompleteSelection`] naming every missing field.
    /// Nothing changes unless both values are valid.
    pub fn initialize(
        &mut self,
        module: Option<&str>,
        experience: Option<&str>,
    ) -> Result<(), SessionError> {
        if self.is_started() {
            return Err(SessionError::AlreadyStarted);
        }

        let module = Module::parse_choice(module)?;
        let experience = Experience::parse_choice(experience)?;

        let (module, experience) = match (module, experience) {
            (Some(m), Some(e)) => (m, e),
            (m, e) => {
                let mut missing = Vec::new();
                if m.is_none() {
                    missing.push(Field::Module);
                }
                if e.is_none() {
                    missing.push(Field::Experience);
                }
                debug!(?missing, "initialize rejected: incomplete selection");
                return Err(SessionError::IncompleteSelection { missing });
            }
        };

        self.state = SessionState::Ready { module, experience };
        self.events.push(SessionEvent::Initialized { module, experience });
        info!(%module, %experience, "mentor session initialized");
        Ok(())
    }

    /// Clear settings and history unconditionally.
    pub fn reset(&mut self) {
        let discarded_turns = self.history.len();
        self.state = SessionState::AwaitingSettings;
        self.history = History::new();
        self.pending_reply = false;
        self.events.push(SessionEvent::Reset { discarded_turns });
        info!(discarded_turns, "mentor session reset");
    }

    /// Append the learner's message and return the request to send.
    ///
    /// The user turn is in history before the model is contacted; if the
    /// call later fails the turn stays.
    pub fn begin_turn(&mut self, message: &str) -> Result<ChatRequest, SessionError> {
        let SessionState::Ready { module, experience } = self.state else {
            return Err(SessionError::NotStarted);
        };
        if message.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        if self.pending_reply {
            return Err(SessionError::TurnInFlight);
        }

        self.history.push(Role::User, message);
        self.pending_reply = true;
        self.events.push(SessionEvent::TurnSubmitted { turn_index: self.history.len() - 1 });

        Ok(prompt::mentor_request(&self.system_template, module, experience, message))
    }

    /// Append the model's reply for the pending turn.
    pub fn record_reply(&mut self, text: impl Into<String>) -> Result<&Turn, SessionError> {
        if !self.pending_reply {
            return Err(SessionError::NoPendingTurn);
        }
        self.pending_reply = false;
        self.history.push(Role::Assistant, text);
        let turn_index = self.history.len() - 1;
        self.events.push(SessionEvent::ReplyRecorded { turn_index });
        Ok(&self.history.as_slice()[turn_index])
    }

    /// Close the pending turn without a reply.
    pub fn record_failure(&mut self, error: &ProviderError) {
        self.pending_reply = false;
        self.events.push(SessionEvent::ReplyFailed { error: error.to_string() });
    }

    /// Close a pending turn whose model call never finished.
    fn abandon_turn(&mut self) {
        if !self.pending_reply {
            return;
        }
        self.pending_reply = false;
        self.events.push(SessionEvent::ReplyFailed { error: ABANDONED_REPLY.to_string() });
        warn!(turns = self.history.len(), "mentor reply dropped before completion");
    }

    /// One full chat turn: append the user message, call the model once,
    /// append its reply. Provider errors propagate after being logged.
    ///
    /// If the returned future is dropped during the model call (client
    /// disconnect, timeout) the pending turn is closed as failed, so the
    /// session accepts the next message.
    pub async fn submit(
        &mut self,
        provider: &LlmProvider,
        message: &str,
    ) -> Result<&Turn, SessionError> {
        let request = self.begin_turn(message)?;
        let turn = PendingTurn { session: Some(self) };
        let result = provider.complete(&request).await;
        turn.finish(provider.name(), result)
    }
}

const ABANDONED_REPLY: &str = "reply cancelled before completion";

/// Holds the session while its model call is in flight.
struct PendingTurn<'a> {
    session: Option<&'a mut Session>,
}

impl<'a> PendingTurn<'a> {
    fn finish(
        mut self,
        provider: &str,
        result: Result<LlmResponse, ProviderError>,
    ) -> Result<&'a Turn, SessionError> {
        let Some(session) = self.session.take() else {
            return Err(SessionError::NoPendingTurn);
        };
        match result {
            Ok(response) => {
                if let Some(usage) = response.usage {
                    debug!(
                        input_tokens = usage.input_tokens,
                        output_tokens = usage.output_tokens,
                        "turn usage"
                    );
                }
                session.record_reply(response.text)
            }
            Err(e) => {
                error!(provider, error = %e, "mentor reply failed");
                session.record_failure(&e);
                Err(e.into())
            }
        }
    }
}

impl Drop for PendingTurn<'_> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.abandon_turn();
        }
    }
}
