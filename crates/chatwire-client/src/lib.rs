//! Streaming chat client.
//!
//! [`ChatClient`] ties a [`chatwire_session::Session`] to a
//! [`chatwire_transport::Transport`]: it submits questions, feeds decoded
//! events into the in-flight assistant message, and turns every failure into
//! exactly one system notice via the [`ErrorClassifier`].

pub mod classifier;
pub mod client;
pub mod token;

pub use classifier::{ErrorClassifier, Notice, NoticeTexts};
pub use client::{ChatClient, TurnOutcome};
pub use token::{EnvToken, StaticToken, TokenProvider, DEFAULT_TOKEN_ENV};
