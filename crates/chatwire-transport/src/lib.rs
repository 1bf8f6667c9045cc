//! Transports and frame decoding for the chatwire client.
//!
//! Two interchangeable [`Transport`]s open a [`Channel`] of raw chunks:
//!
//! - [`SocketTransport`]: persistent WebSocket, one JSON object per frame.
//! - [`HttpTransport`]: single GET with a chunked, newline-delimited body.
//!
//! Each transport hands out a matching [`FrameDecoder`] that turns chunks
//! into [`chatwire_core::StreamEvent`]s.

pub mod channel;
pub mod config;
pub mod decoder;
pub mod http;
pub mod socket;
pub mod transport;

pub use channel::{Channel, ChannelState, Chunk, ChunkSender, CloseSignal};
pub use config::{derive_socket_url, EndpointConfig, TransportKind, DEFAULT_SOCKET_URL};
pub use decoder::{FrameDecoder, LineDecoder, SocketDecoder, Utf8Decoder};
pub use http::HttpTransport;
pub use socket::SocketTransport;
pub use transport::{build_transport, OpenRequest, Transport};
