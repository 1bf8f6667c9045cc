use crate::channel::Channel;
use crate::config::{EndpointConfig, TransportKind};
use crate::decoder::FrameDecoder;
use crate::http::HttpTransport;
use crate::socket::SocketTransport;
use async_trait::async_trait;
use chatwire_core::ChatwireResult;
use chatwire_session::SessionId;
use std::sync::Arc;

/// Everything a transport needs to start one reply.
#[derive(Debug, Clone)]
pub struct OpenRequest {
    pub session_id: SessionId,
    pub question: String,
    /// Bearer token, sent by transports that authenticate requests.
    pub bearer_token: Option<String>,
}

impl OpenRequest {
    pub fn new(session_id: SessionId, question: impl Into<String>) -> Self {
        Self {
            session_id,
            question: question.into(),
            bearer_token: None,
        }
    }

    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token;
        self
    }
}

/// Uniform contract over the socket and chunked-HTTP backends.
///
/// `open` connects, sends the question, and returns a [`Channel`] of raw
/// chunks; `decoder` returns a fresh decoder for that channel's framing.
#[async_trait]
pub trait Transport: Send + Sync {
    fn kind(&self) -> TransportKind;

    async fn open(&self, request: &OpenRequest) -> ChatwireResult<Channel>;

    fn decoder(&self) -> Box<dyn FrameDecoder>;
}

/// Builds the transport selected by `config.transport`.
pub fn build_transport(config: &EndpointConfig) -> ChatwireResult<Arc<dyn Transport>> {
    let transport: Arc<dyn Transport> = match config.transport {
        TransportKind::Socket => Arc::new(SocketTransport::from_config(config)?),
        TransportKind::Http => Arc::new(HttpTransport::from_config(config)?),
    };
    Ok(transport)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn builds_selected_transport() {
        let socket = build_transport(&EndpointConfig::default()).unwrap();
        assert_eq!(socket.kind(), TransportKind::Socket);

        let config = EndpointConfig {
            transport: TransportKind::Http,
            webhook_url: Some("http://localhost:15678/webhook/abc".into()),
            ..EndpointConfig::default()
        };
        let http = build_transport(&config).unwrap();
        assert_eq!(http.kind(), TransportKind::Http);
    }

    #[test]
    fn http_without_webhook_fails_to_build() {
        let config = EndpointConfig {
            transport: TransportKind::Http,
            ..EndpointConfig::default()
        };
        assert!(build_transport(&config).is_err());
    }
}
