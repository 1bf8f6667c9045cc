use crate::channel::{Channel, Chunk, ChunkSender, CloseSignal};
use crate::config::{EndpointConfig, TransportKind};
use crate::decoder::{FrameDecoder, SocketDecoder};
use crate::transport::{OpenRequest, Transport};
use async_trait::async_trait;
use chatwire_core::{ChatwireError, ChatwireResult};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use reqwest::Url;
use serde::Serialize;
use std::time::Duration;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};

/// First outbound frame: `{ "question": "...", "type": 0 }`.
#[derive(Debug, Serialize)]
struct QuestionFrame<'a> {
    question: &'a str,
    #[serde(rename = "type")]
    kind: u8,
}

/// Persistent WebSocket transport for `/ws/ai-question`.
///
/// Opening connects with `?session_id=<id>`, sends the question frame, and
/// forwards every inbound text frame as one [`Chunk::Text`].
pub struct SocketTransport {
    endpoint: Url,
    connect_timeout: Duration,
    buffer: usize,
}

impl SocketTransport {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            connect_timeout: Duration::from_secs(10),
            buffer: 256,
        }
    }

    pub fn from_config(config: &EndpointConfig) -> ChatwireResult<Self> {
        Ok(Self {
            endpoint: config.socket_url()?,
            connect_timeout: config.connect_timeout(),
            buffer: config.channel_buffer,
        })
    }

    /// Endpoint URL scoped to one session.
    pub fn session_url(&self, request: &OpenRequest) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("session_id", request.session_id.as_str());
        url
    }
}

#[async_trait]
impl Transport for SocketTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Socket
    }

    async fn open(&self, request: &OpenRequest) -> ChatwireResult<Channel> {
        let url = self.session_url(request);
        info!(url = %url, "Socket: connecting");

        let (ws_stream, _) =
            tokio::time::timeout(self.connect_timeout, tokio_tungstenite::connect_async(url.as_str()))
                .await
                .map_err(|_| {
                    ChatwireError::Transport(format!(
                        "socket connect timed out after {}s",
                        self.connect_timeout.as_secs()
                    ))
                })?
                .map_err(|e| ChatwireError::Transport(format!("socket connect error: {e}")))?;

        let (mut write, read) = ws_stream.split();
        info!(session_id = %request.session_id, "Socket: connected");

        let hello = serde_json::to_string(&QuestionFrame {
            question: request.question.trim(),
            kind: 0,
        })?;
        write
            .send(Message::Text(hello))
            .await
            .map_err(|e| ChatwireError::Transport(format!("socket send error: {e}")))?;

        Ok(Channel::spawn(self.buffer, move |tx, close| {
            forward_frames(write, read, tx, close)
        }))
    }

    fn decoder(&self) -> Box<dyn FrameDecoder> {
        Box::new(SocketDecoder::new())
    }
}

/// Pumps inbound frames into the channel until either side stops.
///
/// When the client side goes away (close requested or receiver dropped) a
/// close frame is sent so the server sees a proper handshake.
async fn forward_frames<W, R>(mut write: W, mut read: R, tx: ChunkSender, mut close: CloseSignal)
where
    W: Sink<Message, Error = tungstenite::Error> + Unpin + Send,
    R: Stream<Item = Result<Message, tungstenite::Error>> + Unpin + Send,
{
    let send_close = loop {
        tokio::select! {
            _ = &mut close => {
                debug!("Socket: closing on request");
                break true;
            }
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if tx.send(Ok(Chunk::Text(text))).await.is_err() {
                        break true;
                    }
                }
                Some(Ok(Message::Binary(bytes))) => {
                    if tx.send(Ok(Chunk::Bytes(bytes))).await.is_err() {
                        break true;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    info!(?frame, "Socket: server closed connection");
                    break false;
                }
                Some(Ok(_)) => {} // Ignore ping/pong/raw frames
                Some(Err(e)) => {
                    warn!(error = %e, "Socket: read error");
                    let _ = tx
                        .send(Err(ChatwireError::Transport(format!("socket read error: {e}"))))
                        .await;
                    break false;
                }
                None => break false,
            }
        }
    };

    if send_close {
        if let Err(e) = write.send(Message::Close(None)).await {
            debug!(error = %e, "Socket: close frame not sent");
        }
    }
}
