use crate::session::Session;
use chatwire_core::{ControlKind, MessageId};
use tracing::debug;

/// Applies decoded reply events to the single in-flight assistant message.
///
/// The target is captured as a [`MessageId`] when the placeholder is
/// inserted, so later transcript edits cannot redirect deltas.
#[derive(Debug, Clone, Copy)]
pub struct TranscriptAssembler {
    target: MessageId,
}

impl TranscriptAssembler {
    pub fn new(target: MessageId) -> Self {
        Self { target }
    }

    pub fn target(&self) -> MessageId {
        self.target
    }

    /// Appends `delta` to the target message.
    ///
    /// A missing target is a no-op that returns `false`.
    pub fn apply_content(&self, session: &mut Session, delta: &str) -> bool {
        if delta.is_empty() {
            return true;
        }
        let applied = session.append_to(self.target, delta);
        if !applied {
            debug!(message_id = %self.target, "Reply target gone; dropping delta");
        }
        applied
    }

    /// Applies a framing marker. Returns `true` when the turn is over and the
    /// transport should be released.
    pub fn apply_control(&self, session: &mut Session, kind: ControlKind) -> bool {
        match kind {
            ControlKind::Begin => false,
            ControlKind::End => {
                session.finish_turn();
                true
            }
        }
    }
}
