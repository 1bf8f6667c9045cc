pub mod line;
pub mod socket;
pub mod utf8;

pub use line::{classify_line, LineDecoder};
pub use socket::SocketDecoder;
pub use utf8::Utf8Decoder;

use crate::channel::Chunk;
use chatwire_core::{ChatwireResult, StreamEvent};

/// Turns raw transport chunks into [`StreamEvent`]s.
///
/// Each transport supplies its own decoder; everything downstream only sees
/// the decoded events.
///
/// To add a transport:
/// 1. Implement `FrameDecoder` for its framing
/// 2. Return it from the transport's `Transport::decoder`
pub trait FrameDecoder: Send {
    /// Decodes one chunk into zero or more events, in arrival order.
    ///
    /// An `Err` entry is terminal; callers stop at the first one.
    fn decode(&mut self, chunk: Chunk) -> Vec<ChatwireResult<StreamEvent>>;

    /// Called once when the channel ends gracefully. Returns the final events
    /// (for example a flushed remainder), or the error that an early close
    /// amounts to for this framing.
    fn finish(&mut self) -> ChatwireResult<Vec<StreamEvent>>;
}
