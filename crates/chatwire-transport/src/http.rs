use crate::channel::{Channel, Chunk};
use crate::config::{EndpointConfig, TransportKind};
use crate::decoder::{FrameDecoder, LineDecoder};
use crate::transport::{OpenRequest, Transport};
use async_trait::async_trait;
use chatwire_core::{ChatwireError, ChatwireResult};
use futures_util::StreamExt;
use reqwest::Url;
use tracing::{debug, info, warn};

/// Chunked HTTP transport: one `GET <webhook>?chatInput=<question>` whose
/// response body is streamed as raw bytes.
pub struct HttpTransport {
    webhook: Url,
    http: reqwest::Client,
    buffer: usize,
}

impl HttpTransport {
    pub fn new(webhook: Url) -> Self {
        Self {
            webhook,
            http: reqwest::Client::new(),
            buffer: 256,
        }
    }

    pub fn from_config(config: &EndpointConfig) -> ChatwireResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| ChatwireError::Config(format!("HTTP client setup failed: {e}")))?;
        Ok(Self {
            webhook: config.webhook_url()?,
            http,
            buffer: config.channel_buffer,
        })
    }

    fn build_request(&self, request: &OpenRequest) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .get(self.webhook.clone())
            .query(&[("chatInput", request.question.trim())])
            .header("Content-Type", "application/json");

        match &request.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => {
                debug!("HTTP: no bearer token available");
                builder
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Http
    }

    async fn open(&self, request: &OpenRequest) -> ChatwireResult<Channel> {
        info!(url = %self.webhook, session_id = %request.session_id, "HTTP: requesting reply stream");

        let resp = self
            .build_request(request)
            .send()
            .await
            .map_err(|e| ChatwireError::Transport(format!("HTTP request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ChatwireError::Transport(format!("HTTP {status}")));
        }

        let body = resp.bytes_stream();
        Ok(Channel::spawn(self.buffer, move |tx, mut close| async move {
            let mut body = Box::pin(body);
            loop {
                tokio::select! {
                    _ = &mut close => {
                        debug!("HTTP: body stream cancelled");
                        break;
                    }
                    next = body.next() => match next {
                        Some(Ok(bytes)) => {
                            if tx.send(Ok(Chunk::Bytes(bytes.to_vec()))).await.is_err() {
                                break;
                            }
                        }
                        Some(Err(e)) => {
                            warn!(error = %e, "HTTP: body read error");
                            let _ = tx
                                .send(Err(ChatwireError::Transport(format!(
                                    "stream read error: {e}"
                                ))))
                                .await;
                            break;
                        }
                        None => break,
                    }
                }
            }
        }))
    }

    fn decoder(&self) -> Box<dyn FrameDecoder> {
        Box::new(LineDecoder::new())
    }
}
