//! Conversation state for the chatwire client.
//!
//! A [`Session`] owns the id, the [`Transcript`], and the `loading` flag of
//! one conversation. The [`TranscriptAssembler`] writes streamed deltas into
//! the active assistant message.

pub mod assembler;
pub mod id;
pub mod session;
pub mod transcript;

pub use assembler::TranscriptAssembler;
pub use id::SessionId;
pub use session::{Session, SessionUpdate};
pub use transcript::Transcript;
