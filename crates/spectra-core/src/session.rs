//! Session controller: the submit → pending → reply/error cycle.

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::{ChatBackend, ChatResponse, TransportError};
use crate::state::{Connectivity, Message, MessageStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Pending,
}

type SendTask = JoinHandle<Result<ChatResponse, TransportError>>;

/// Owns the message store and at most one in-flight send.
pub struct Session<B> {
    backend: B,
    store: MessageStore,
    pending: Option<SendTask>,
}

impl<B> Session<B>
where
    B: ChatBackend + Clone + 'static,
{
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            store: MessageStore::new(),
            pending: None,
        }
    }

    /// Start a session whose thread opens with an assistant greeting.
    /// A blank greeting seeds nothing.
    pub fn with_greeting(backend: B, greeting: &str) -> Self {
        let mut session = Self::new(backend);
        if !greeting.trim().is_empty() {
            session.store.push_assistant(greeting.trim());
        }
        session
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    pub fn phase(&self) -> Phase {
        if self.pending.is_some() {
            Phase::Pending
        } else {
            Phase::Idle
        }
    }

    pub fn is_pending(&self) -> bool {
        self.phase() == Phase::Pending
    }

    /// Append the user's message and send it in the background.
    ///
    /// Returns `false`, changing nothing, when the trimmed input is empty or
    /// a previous send has not resolved yet. Must be called within a tokio
    /// runtime.
    pub fn submit(&mut self, input: &str) -> bool {
        let text = input.trim();
        if text.is_empty() || self.is_pending() {
            return false;
        }

        // History is captured before the new message joins the thread
        let history = self.store.history_window();
        self.store.push_user(text);
        debug!(history = history.len(), "submitting message");

        let backend = self.backend.clone();
        let text = text.to_string();
        self.pending = Some(tokio::spawn(async move {
            backend.send_message(&text, &history).await
        }));
        true
    }

    /// Record the outcome of the in-flight send if it has finished.
    /// Never waits on the network.
    pub async fn poll(&mut self) -> Option<&Message> {
        match &self.pending {
            Some(task) if task.is_finished() => {}
            _ => return None,
        }
        self.settle().await
    }

    /// Wait for the in-flight send and record its outcome.
    pub async fn settle(&mut self) -> Option<&Message> {
        let task = self.pending.take()?;
        let outcome = match task.await {
            Ok(result) => result,
            Err(err) => Err(TransportError::Other(err.to_string())),
        };
        Some(self.record(outcome))
    }

    fn record(&mut self, outcome: Result<ChatResponse, TransportError>) -> &Message {
        match outcome {
            Ok(reply) => {
                if let Some(error) = &reply.error {
                    warn!(%error, "backend reported an error alongside its reply");
                }
                debug!(model = ?reply.model_used, "reply received");
                self.store.push_assistant(reply.response)
            }
            Err(err) => {
                warn!(error = %err, "chat request failed");
                self.store.push_error(err.user_message())
            }
        }
    }

    /// Probe the status endpoint once, in the background.
    pub fn spawn_status_probe(&self) -> JoinHandle<Connectivity> {
        let backend = self.backend.clone();
        tokio::spawn(async move { probe(&backend).await })
    }
}

/// Map one status call onto the connectivity badge. Failures are only logged.
pub async fn probe<B: ChatBackend>(backend: &B) -> Connectivity {
    match backend.check_status().await {
        Ok(status) => {
            debug!(status = %status.status, provider = ?status.ai_provider, "backend is up");
            Connectivity::Connected
        }
        Err(err) => {
            debug!(error = %err, "status check failed");
            Connectivity::Offline
        }
    }
}
