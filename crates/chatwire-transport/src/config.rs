use chatwire_core::{ChatwireError, ChatwireResult};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Socket endpoint used when nothing else is configured.
pub const DEFAULT_SOCKET_URL: &str = "ws://localhost:19069/ws/ai-question";

/// Path of the question socket on a service host.
pub const SOCKET_PATH: &str = "/ws/ai-question";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Persistent bidirectional WebSocket.
    #[default]
    Socket,
    /// Single GET with a chunked, newline-delimited response body.
    Http,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Socket => f.write_str("socket"),
            TransportKind::Http => f.write_str("http"),
        }
    }
}

impl FromStr for TransportKind {
    type Err = ChatwireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "socket" | "ws" | "websocket" => Ok(TransportKind::Socket),
            "http" | "sse" | "chunked" => Ok(TransportKind::Http),
            other => Err(ChatwireError::Config(format!(
                "unknown transport '{other}' (expected socket or http)"
            ))),
        }
    }
}

/// Where and how to reach the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default)]
    pub transport: TransportKind,
    /// Full `ws://` or `wss://` URL of the question socket.
    #[serde(default)]
    pub socket_url: Option<String>,
    /// `http(s)://host` of the service; the socket URL is derived from it
    /// when `socket_url` is unset.
    #[serde(default)]
    pub service_base_url: Option<String>,
    /// Webhook URL for the chunked HTTP transport.
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer: usize,
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_channel_buffer() -> usize {
    256
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            socket_url: None,
            service_base_url: None,
            webhook_url: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            channel_buffer: default_channel_buffer(),
        }
    }
}

impl EndpointConfig {
    /// Resolves the socket URL: explicit, derived from the service base, or
    /// the default, in that order.
    pub fn socket_url(&self) -> ChatwireResult<Url> {
        let url = if let Some(explicit) = &self.socket_url {
            parse_url(explicit)?
        } else if let Some(base) = &self.service_base_url {
            derive_socket_url(base)?
        } else {
            parse_url(DEFAULT_SOCKET_URL)?
        };

        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(ChatwireError::Config(format!(
                "socket URL must use ws or wss, got '{other}'"
            ))),
        }
    }

    pub fn webhook_url(&self) -> ChatwireResult<Url> {
        let raw = self.webhook_url.as_deref().ok_or_else(|| {
            ChatwireError::Config("webhook_url is required for the http transport".into())
        })?;
        let url = parse_url(raw)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ChatwireError::Config(format!(
                "webhook URL must use http or https, got '{other}'"
            ))),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }
}

/// Maps `http(s)://host[:port]` onto `ws(s)://host[:port]/ws/ai-question`.
pub fn derive_socket_url(base: &str) -> ChatwireResult<Url> {
    let mut url = parse_url(base)?;
    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => {
            return Err(ChatwireError::Config(format!(
                "cannot derive a socket URL from scheme '{other}'"
            )))
        }
    };
    url.set_scheme(scheme)
        .map_err(|()| ChatwireError::Config(format!("cannot switch '{base}' to {scheme}")))?;
    url.set_path(SOCKET_PATH);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn parse_url(raw: &str) -> ChatwireResult<Url> {
    Url::parse(raw).map_err(|e| ChatwireError::Config(format!("invalid URL '{raw}': {e}")))
}
