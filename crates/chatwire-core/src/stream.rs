use serde::{Deserialize, Serialize};

/// Framing markers that carry no displayable text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ControlKind {
    /// The server started producing a reply.
    Begin,
    /// The reply is complete.
    End,
}

/// A decoded, transport-agnostic event from a reply stream.
///
/// Both transports decode into this type, so the transcript and session
/// logic never see raw frames or lines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A delta to append to the active assistant message.
    Content {
        text: String,
    },

    /// A framing marker.
    Control {
        kind: ControlKind,
    },

    /// The server reported a terminal failure.
    Error {
        message: String,
    },
}

impl StreamEvent {
    /// Shorthand for [`StreamEvent::Content`].
    pub fn content(text: impl Into<String>) -> Self {
        StreamEvent::Content { text: text.into() }
    }

    /// Shorthand for [`StreamEvent::Error`].
    pub fn error(message: impl Into<String>) -> Self {
        StreamEvent::Error {
            message: message.into(),
        }
    }

    /// Whether receiving this event ends the turn.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamEvent::Control {
                kind: ControlKind::End
            } | StreamEvent::Error { .. }
        )
    }
}

/// The `status` field of a socket reply frame.
///
/// Unrecognised values are preserved in [`SocketStatus::Unknown`] so callers
/// can skip them instead of misreading them as one of the known codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketStatus {
    /// `1`: more content follows.
    Continue,
    /// `2`: last content of the reply.
    End,
    /// `-1`: `content` holds an error description.
    Error,
    /// Any other code.
    Unknown(i64),
}

impl From<i64> for SocketStatus {
    fn from(code: i64) -> Self {
        match code {
            1 => SocketStatus::Continue,
            2 => SocketStatus::End,
            -1 => SocketStatus::Error,
            other => SocketStatus::Unknown(other),
        }
    }
}

impl From<SocketStatus> for i64 {
    fn from(status: SocketStatus) -> Self {
        match status {
            SocketStatus::Continue => 1,
            SocketStatus::End => 2,
            SocketStatus::Error => -1,
            SocketStatus::Unknown(code) => code,
        }
    }
}
