use super::FrameDecoder;
use crate::channel::Chunk;
use chatwire_core::{ChatwireError, ChatwireResult, ControlKind, SocketStatus, StreamEvent};
use serde_json::Value;
use tracing::debug;

/// Decoder for socket replies. Every text frame is one complete JSON object,
/// so no buffering is needed.
#[derive(Debug, Default)]
pub struct SocketDecoder;

impl SocketDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decodes one `{ "status": 1 | 2 | -1, "content": "..." }` frame.
    ///
    /// Only text that is not JSON is an error. A frame without an integer
    /// `status` is skipped, and non-string `content` reads as empty.
    fn decode_frame(text: &str) -> ChatwireResult<Vec<StreamEvent>> {
        let frame: Value = serde_json::from_str(text)
            .map_err(|e| ChatwireError::Decode(format!("malformed socket frame: {e}")))?;
        let Some(status) = frame.get("status").and_then(Value::as_i64) else {
            debug!(frame = %frame, "Ignoring socket frame without an integer status");
            return Ok(Vec::new());
        };
        let content = frame
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let events = match SocketStatus::from(status) {
            SocketStatus::Continue => vec![StreamEvent::content(content)],
            SocketStatus::End => vec![
                StreamEvent::content(content),
                StreamEvent::Control {
                    kind: ControlKind::End,
                },
            ],
            SocketStatus::Error => vec![StreamEvent::error(content)],
            SocketStatus::Unknown(code) => {
                debug!(status = code, "Ignoring socket frame with unknown status");
                Vec::new()
            }
        };
        Ok(events)
    }
}

impl FrameDecoder for SocketDecoder {
    fn decode(&mut self, chunk: Chunk) -> Vec<ChatwireResult<StreamEvent>> {
        let text = match chunk {
            Chunk::Text(text) => text,
            Chunk::Bytes(bytes) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(e) => {
                    return vec![Err(ChatwireError::Decode(format!(
                        "socket frame is not UTF-8: {e}"
                    )))]
                }
            },
        };

        match Self::decode_frame(&text) {
            Ok(events) => events.into_iter().map(Ok).collect(),
            Err(e) => vec![Err(e)],
        }
    }

    fn finish(&mut self) -> ChatwireResult<Vec<StreamEvent>> {
        // Replies end with status 2; a close before that lost the reply.
        Err(ChatwireError::Disconnected)
    }
}
