use crate::classifier::ErrorClassifier;
use crate::token::TokenProvider;
use chatwire_core::{ChatwireError, ChatwireResult, FailureCategory, MessageId, StreamEvent};
use chatwire_session::{Session, SessionId, SessionUpdate, TranscriptAssembler};
use chatwire_transport::{Channel, FrameDecoder, OpenRequest, Transport, TransportKind};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The stream signalled its end; the reply is complete.
    Completed,
    /// A system notice of this category was appended.
    Failed(FailureCategory),
    /// The caller abandoned the turn; no notice was appended.
    Cancelled,
}

/// The transport instance and decoding state of the one in-flight reply.
struct ActiveTurn {
    channel: Channel,
    decoder: Box<dyn FrameDecoder>,
    assembler: TranscriptAssembler,
}

/// Drives one conversation over a [`Transport`].
///
/// Owns the [`Session`] and at most one open channel. All transcript
/// mutation happens through `&mut self`, so chunk handling and user actions
/// are serialized.
pub struct ChatClient {
    turn: Option<ActiveTurn>,
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenProvider>,
    classifier: ErrorClassifier,
    session: Session,
}

impl ChatClient {
    /// Creates a client with a freshly initialised session.
    pub fn new(transport: Arc<dyn Transport>, tokens: Arc<dyn TokenProvider>) -> Self {
        let session = Session::new();
        info!(session_id = %session.id(), transport = %transport.kind(), "Chat client ready");
        Self {
            turn: None,
            transport,
            tokens,
            classifier: ErrorClassifier::default(),
            session,
        }
    }

    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn transport_kind(&self) -> TransportKind {
        self.transport.kind()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionUpdate> {
        self.session.subscribe()
    }

    /// `true` while a channel is open for the current turn.
    pub fn is_streaming(&self) -> bool {
        self.turn.is_some()
    }

    /// Closes any open channel and starts a new conversation.
    pub fn start_session(&mut self) -> SessionId {
        self.release_turn();
        self.session.restart().clone()
    }

    /// Removes a message from the transcript. Deltas for a removed reply
    /// are dropped.
    pub fn remove_message(&mut self, id: MessageId) -> bool {
        self.session.remove_message(id).is_some()
    }

    /// Records `question` and opens a transport for its reply.
    ///
    /// Only [`ChatwireError::InvalidInput`] is returned to the caller (blank
    /// question, or a reply still streaming). A transport that fails to open
    /// ends the turn with a system notice; that outcome is returned as
    /// `Ok(Some(_))`. `Ok(None)` means the reply is streaming.
    pub async fn submit_question(
        &mut self,
        question: &str,
    ) -> ChatwireResult<Option<TurnOutcome>> {
        let placeholder = self.session.begin_turn(question)?;
        // A stale channel would otherwise keep delivering into the new turn.
        self.release_turn();

        let request = OpenRequest::new(self.session.id().clone(), question)
            .with_bearer_token(self.tokens.bearer_token());
        info!(
            session_id = %request.session_id,
            transport = %self.transport.kind(),
            "Submitting question"
        );

        match self.transport.open(&request).await {
            Ok(channel) => {
                self.turn = Some(ActiveTurn {
                    channel,
                    decoder: self.transport.decoder(),
                    assembler: TranscriptAssembler::new(placeholder),
                });
                Ok(None)
            }
            Err(e) => Ok(Some(self.fail(e))),
        }
    }

    /// Submits `question` and drives the reply to its end.
    pub async fn ask(&mut self, question: &str) -> ChatwireResult<TurnOutcome> {
        if let Some(outcome) = self.submit_question(question).await? {
            return Ok(outcome);
        }
        Ok(self.drive().await.unwrap_or(TurnOutcome::Completed))
    }

    /// Processes chunks until the current turn ends. `None` if no turn was
    /// active.
    pub async fn drive(&mut self) -> Option<TurnOutcome> {
        while self.turn.is_some() {
            if let Some(outcome) = self.step().await {
                return Some(outcome);
            }
        }
        None
    }

    /// Waits for one chunk and applies everything decoded from it.
    ///
    /// Returns the outcome once the turn ends; `None` while it continues or
    /// when there is no active turn. Cancel-safe: dropping the future loses
    /// no applied state.
    pub async fn step(&mut self) -> Option<TurnOutcome> {
        let turn = self.turn.as_mut()?;

        let (decoded, ended) = match turn.channel.next_chunk().await {
            Some(Ok(chunk)) => (turn.decoder.decode(chunk), false),
            Some(Err(e)) => (vec![Err(e)], true),
            None => {
                let rest = match turn.decoder.finish() {
                    Ok(events) => events.into_iter().map(Ok).collect(),
                    Err(e) => vec![Err(e)],
                };
                (rest, true)
            }
        };

        for item in decoded {
            let outcome = match item {
                Ok(event) => self.apply(event),
                Err(e) => Some(self.fail(e)),
            };
            if outcome.is_some() {
                return outcome;
            }
        }

        if ended {
            debug!("Channel ended without a terminal event");
            return Some(self.complete());
        }
        None
    }

    /// Abandons the current turn, keeping whatever was already appended.
    pub fn cancel(&mut self) -> Option<TurnOutcome> {
        let had_turn = self.turn.is_some();
        self.release_turn();
        let lowered = self.session.finish_turn();
        if had_turn || lowered {
            info!(session_id = %self.session.id(), "Turn cancelled");
            Some(TurnOutcome::Cancelled)
        } else {
            None
        }
    }

    /// Closes any open channel. The session stays readable.
    pub fn shutdown(&mut self) {
        self.cancel();
    }

    fn apply(&mut self, event: StreamEvent) -> Option<TurnOutcome> {
        let assembler = self.turn.as_ref()?.assembler;
        match event {
            StreamEvent::Content { text } => {
                assembler.apply_content(&mut self.session, &text);
                None
            }
            StreamEvent::Control { kind } => assembler
                .apply_control(&mut self.session, kind)
                .then(|| self.complete()),
            StreamEvent::Error { message } => {
                Some(self.fail(ChatwireError::Application(message)))
            }
        }
    }

    fn complete(&mut self) -> TurnOutcome {
        self.release_turn();
        self.session.finish_turn();
        info!(session_id = %self.session.id(), "Reply complete");
        TurnOutcome::Completed
    }

    fn fail(&mut self, error: ChatwireError) -> TurnOutcome {
        self.release_turn();
        let notice = self.classifier.classify(&error);
        warn!(
            session_id = %self.session.id(),
            category = ?notice.category,
            error = %error,
            "Turn failed"
        );
        self.session.push_system(notice.text);
        self.session.finish_turn();
        TurnOutcome::Failed(notice.category)
    }

    fn release_turn(&mut self) {
        if let Some(mut turn) = self.turn.take() {
            turn.channel.close();
            debug!(state = ?turn.channel.state(), "Released transport channel");
        }
    }
}

impl Drop for ChatClient {
    fn drop(&mut self) {
        self.release_turn();
    }
}
