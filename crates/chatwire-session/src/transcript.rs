use chatwire_core::{Message, MessageId, Role};
use serde::{Deserialize, Serialize};

/// Ordered, append-only list of conversation messages.
///
/// Only the content of assistant messages may grow after insertion; every
/// other mutation is an append, a removal, or a full clear.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message and returns its id.
    pub fn push(&mut self, message: Message) -> MessageId {
        let id = message.id;
        self.messages.push(message);
        id
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Appends `delta` to the assistant message `id`.
    ///
    /// Returns `false` when the message is gone or is not an assistant reply.
    pub fn append_content(&mut self, id: MessageId, delta: &str) -> bool {
        match self
            .messages
            .iter_mut()
            .find(|m| m.id == id && m.role == Role::Assistant)
        {
            Some(message) => {
                message.content.push_str(delta);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: MessageId) -> Option<Message> {
        let index = self.messages.iter().position(|m| m.id == id)?;
        Some(self.messages.remove(index))
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn append_targets_message_by_id() {
        let mut transcript = Transcript::new();
        transcript.push(Message::user("hi"));
        let first = transcript.push(Message::assistant("a"));
        let second = transcript.push(Message::assistant("b"));

        assert!(transcript.append_content(first, "1"));
        assert_eq!(transcript.get(first).unwrap().content, "a1");
        assert_eq!(transcript.get(second).unwrap().content, "b");
    }

    #[test]
    fn append_survives_earlier_removal() {
        let mut transcript = Transcript::new();
        let user = transcript.push(Message::user("hi"));
        let reply = transcript.push(Message::assistant(""));

        transcript.remove(user);
        assert!(transcript.append_content(reply, "still here"));
        assert_eq!(transcript.messages()[0].content, "still here");
    }

    #[test]
    fn append_to_missing_or_non_assistant_is_noop() {
        let mut transcript = Transcript::new();
        let user = transcript.push(Message::user("hi"));
        let reply = transcript.push(Message::assistant(""));
        transcript.remove(reply);

        assert!(!transcript.append_content(reply, "lost"));
        assert!(!transcript.append_content(user, "nope"));
        assert_eq!(transcript.get(user).unwrap().content, "hi");
    }

    #[test]
    fn clear_empties_transcript() {
        let mut transcript = Transcript::new();
        transcript.push(Message::user("hi"));
        transcript.clear();
        assert!(transcript.is_empty());
        assert!(transcript.last().is_none());
    }
}
