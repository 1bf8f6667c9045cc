use chatwire_client::{EnvToken, NoticeTexts, StaticToken, TokenProvider, DEFAULT_TOKEN_ENV};
use chatwire_transport::{EndpointConfig, TransportKind};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Contents of `chatwire.toml`. Every section is optional.
#[derive(Debug, Default, Deserialize)]
pub struct ChatwireConfig {
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub notices: NoticeTexts,
}

#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// Environment variable holding the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Literal token; takes precedence over `token_env`.
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
            token: None,
        }
    }
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

/// Command-line values that override the file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub transport: Option<TransportKind>,
    pub socket_url: Option<String>,
    pub webhook_url: Option<String>,
    pub token_env: Option<String>,
}

impl ChatwireConfig {
    /// Reads `path`; a missing file yields the defaults.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(kind) = overrides.transport {
            self.endpoint.transport = kind;
        }
        if let Some(url) = overrides.socket_url {
            self.endpoint.socket_url = Some(url);
        }
        if let Some(url) = overrides.webhook_url {
            self.endpoint.webhook_url = Some(url);
        }
        if let Some(var) = overrides.token_env {
            self.auth.token_env = var;
        }
    }

    pub fn token_provider(&self) -> Arc<dyn TokenProvider> {
        match &self.auth.token {
            Some(token) => Arc::new(StaticToken::new(token.clone())),
            None => Arc::new(EnvToken::new(self.auth.token_env.clone())),
        }
    }
}
