use super::utf8::Utf8Decoder;
use super::FrameDecoder;
use crate::channel::Chunk;
use chatwire_core::{ChatwireError, ChatwireResult, ControlKind, StreamEvent};
use serde_json::Value;
use tracing::debug;

/// Decoder for newline-delimited reply bodies (plain JSON or SSE `data:`).
///
/// Complete lines are classified as soon as their newline arrives; the
/// trailing fragment waits in the buffer for the next chunk.
#[derive(Debug, Default)]
pub struct LineDecoder {
    utf8: Utf8Decoder,
    buffer: String,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text held back while waiting for a newline.
    pub fn pending(&self) -> &str {
        &self.buffer
    }
}

impl FrameDecoder for LineDecoder {
    fn decode(&mut self, chunk: Chunk) -> Vec<ChatwireResult<StreamEvent>> {
        match chunk {
            Chunk::Bytes(bytes) => {
                let text = self.utf8.decode(&bytes);
                self.buffer.push_str(&text);
            }
            Chunk::Text(text) => self.buffer.push_str(&text),
        }

        let Some(last_newline) = self.buffer.rfind('\n') else {
            return Vec::new();
        };
        let tail = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, tail);
        complete
            .split_terminator('\n')
            .filter_map(classify_line)
            .collect()
    }

    fn finish(&mut self) -> ChatwireResult<Vec<StreamEvent>> {
        let tail = self.utf8.flush();
        self.buffer.push_str(&tail);
        let rest = std::mem::take(&mut self.buffer);

        let mut events = Vec::new();
        if let Some(event) = classify_line(&rest) {
            events.push(event?);
        }
        // A body that simply ends is a finished reply.
        events.push(StreamEvent::Control {
            kind: ControlKind::End,
        });
        Ok(events)
    }
}

/// Classifies one line of a reply body.
///
/// Blank lines and SSE comments yield `None`, as do JSON records that carry
/// neither a control `type` nor a string `content`. Text that is not JSON is
/// a decode error.
pub fn classify_line(raw: &str) -> Option<ChatwireResult<StreamEvent>> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with(':') {
        return None;
    }

    let payload = line.strip_prefix("data:").map_or(line, str::trim_start);
    if payload.is_empty() {
        return None;
    }

    let record: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(e) => {
            return Some(Err(ChatwireError::Decode(format!(
                "malformed stream line: {e}"
            ))))
        }
    };

    match record.get("type").and_then(Value::as_str) {
        Some("begin") => {
            return Some(Ok(StreamEvent::Control {
                kind: ControlKind::Begin,
            }))
        }
        Some("end") => {
            return Some(Ok(StreamEvent::Control {
                kind: ControlKind::End,
            }))
        }
        _ => {}
    }

    match record.get("content") {
        Some(Value::String(text)) => Some(Ok(StreamEvent::content(text.as_str()))),
        _ => {
            debug!(record = %payload, "Ignoring stream record without text content");
            None
        }
    }
}
