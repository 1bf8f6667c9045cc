use crate::id::SessionId;
use crate::transcript::Transcript;
use chatwire_core::{ChatwireError, ChatwireResult, Message, MessageId, Role};
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info};

const UPDATE_CAPACITY: usize = 256;

/// Change notifications for presentation layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    /// A new conversation started; the transcript is empty.
    Reset { session_id: SessionId },
    /// A message was appended to the transcript, with its initial content.
    MessageAdded {
        id: MessageId,
        role: Role,
        content: String,
    },
    /// A message was removed from the transcript.
    MessageRemoved { id: MessageId },
    /// A delta was appended to an assistant message.
    ContentAppended { id: MessageId, delta: String },
    /// The loading flag flipped.
    LoadingChanged { loading: bool },
}

/// Identity and lifecycle of one conversation.
///
/// `loading` is raised by [`Session::begin_turn`] and lowered exactly once by
/// [`Session::finish_turn`]; a second `finish_turn` for the same turn is a
/// no-op.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    transcript: Transcript,
    loading: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    updates: broadcast::Sender<SessionUpdate>,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
        Self {
            id: SessionId::generate(),
            transcript: Transcript::new(),
            loading: false,
            created_at: now,
            updated_at: now,
            updates,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Subscribe to transcript and loading changes.
    ///
    /// Subscriptions survive [`Session::restart`].
    pub fn subscribe(&self) -> broadcast::Receiver<SessionUpdate> {
        self.updates.subscribe()
    }

    /// Starts a new conversation: fresh id, empty transcript, not loading.
    ///
    /// Callers must release any open transport before calling this.
    pub fn restart(&mut self) -> &SessionId {
        self.id = SessionId::generate_distinct_from(&self.id);
        self.transcript.clear();
        let now = Utc::now();
        self.created_at = now;
        self.updated_at = now;
        if self.loading {
            self.loading = false;
            self.notify(SessionUpdate::LoadingChanged { loading: false });
        }
        info!(session_id = %self.id, "Session started");
        self.notify(SessionUpdate::Reset {
            session_id: self.id.clone(),
        });
        &self.id
    }

    /// Records a submitted question and opens a reply slot for it.
    ///
    /// Appends the user message and an empty assistant placeholder, raises
    /// `loading`, and returns the placeholder id. Fails with
    /// [`ChatwireError::InvalidInput`] for blank questions or while a reply
    /// is still streaming.
    pub fn begin_turn(&mut self, question: &str) -> ChatwireResult<MessageId> {
        if question.trim().is_empty() {
            return Err(ChatwireError::InvalidInput("question is empty".into()));
        }
        if self.loading {
            return Err(ChatwireError::InvalidInput(
                "a reply is still streaming".into(),
            ));
        }

        self.push(Message::user(question));
        let placeholder = self.push(Message::assistant(""));
        self.loading = true;
        self.notify(SessionUpdate::LoadingChanged { loading: true });
        Ok(placeholder)
    }

    /// Appends `delta` to assistant message `id`; `false` if it no longer exists.
    pub fn append_to(&mut self, id: MessageId, delta: &str) -> bool {
        if !self.transcript.append_content(id, delta) {
            return false;
        }
        self.updated_at = Utc::now();
        self.notify(SessionUpdate::ContentAppended {
            id,
            delta: delta.to_string(),
        });
        true
    }

    /// Appends a system notice to the transcript.
    pub fn push_system(&mut self, text: impl Into<String>) -> MessageId {
        self.push(Message::system(text))
    }

    /// Removes a message, e.g. when the user deletes it from the view.
    pub fn remove_message(&mut self, id: MessageId) -> Option<Message> {
        let removed = self.transcript.remove(id);
        if removed.is_some() {
            self.updated_at = Utc::now();
            self.notify(SessionUpdate::MessageRemoved { id });
        }
        removed
    }

    /// Lowers `loading`. Returns `false` if it was already lowered.
    pub fn finish_turn(&mut self) -> bool {
        if !self.loading {
            debug!(session_id = %self.id, "Turn already finished");
            return false;
        }
        self.loading = false;
        self.updated_at = Utc::now();
        self.notify(SessionUpdate::LoadingChanged { loading: false });
        true
    }

    fn push(&mut self, message: Message) -> MessageId {
        let update = SessionUpdate::MessageAdded {
            id: message.id,
            role: message.role,
            content: message.content.clone(),
        };
        let id = self.transcript.push(message);
        self.updated_at = Utc::now();
        self.notify(update);
        id
    }

    fn notify(&self, update: SessionUpdate) {
        // No subscribers is fine.
        let _ = self.updates.send(update);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
