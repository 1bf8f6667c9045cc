//! Core types and error definitions for the chatwire client.
//!
//! This crate provides the foundational types shared across all chatwire
//! crates: the error taxonomy, transcript messages, and the decoded stream
//! events both transports produce.
//!
//! # Main types
//!
//! - [`ChatwireError`]: Unified error enum for every stage of a turn.
//! - [`ChatwireResult`]: Convenience alias for `Result<T, ChatwireError>`.
//! - [`FailureCategory`]: Which user-visible bucket a terminal error falls in.
//! - [`Role`] / [`Message`] / [`MessageId`]: Transcript entries.
//! - [`StreamEvent`]: Content, control, or error decoded from a transport.
//! - [`SocketStatus`]: Typed form of the socket frame `status` code.

/// Error taxonomy.
pub mod error;
/// Transcript message types.
pub mod message;
/// Decoded stream events.
pub mod stream;

pub use error::{ChatwireError, ChatwireResult, FailureCategory};
pub use message::{Message, MessageId, Role};
pub use stream::{ControlKind, SocketStatus, StreamEvent};
