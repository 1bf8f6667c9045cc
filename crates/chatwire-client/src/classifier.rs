use chatwire_core::{ChatwireError, FailureCategory};
use serde::{Deserialize, Serialize};

/// Wording of the system notices appended when a turn fails.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoticeTexts {
    /// Prepended to every notice so it stands out in the transcript.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_connectivity")]
    pub connectivity: String,
    #[serde(default = "default_disconnected")]
    pub disconnected: String,
    #[serde(default = "default_parse_failure")]
    pub parse_failure: String,
}

fn default_prefix() -> String {
    "⚠️ ".to_string()
}

fn default_connectivity() -> String {
    "Connection failed, check the token or network".to_string()
}

fn default_disconnected() -> String {
    "Connection lost before the reply finished".to_string()
}

fn default_parse_failure() -> String {
    "Failed to parse the server reply".to_string()
}

impl Default for NoticeTexts {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            connectivity: default_connectivity(),
            disconnected: default_disconnected(),
            parse_failure: default_parse_failure(),
        }
    }
}

/// A classified failure, ready to append as a system message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub category: FailureCategory,
    pub text: String,
}

/// Maps terminal errors onto user-visible system notices.
#[derive(Debug, Clone, Default)]
pub struct ErrorClassifier {
    texts: NoticeTexts,
}

impl ErrorClassifier {
    pub fn new(texts: NoticeTexts) -> Self {
        Self { texts }
    }

    /// Classifies `error`.
    ///
    /// Server-signalled errors keep their text verbatim behind the prefix;
    /// transport and decode failures get the configured generic wording.
    pub fn classify(&self, error: &ChatwireError) -> Notice {
        let prefix = &self.texts.prefix;
        match (error.category(), error) {
            (_, ChatwireError::Disconnected) => Notice {
                category: FailureCategory::Transport,
                text: format!("{prefix}{}", self.texts.disconnected),
            },
            (Some(FailureCategory::Transport), _) => Notice {
                category: FailureCategory::Transport,
                text: format!("{prefix}{}", self.texts.connectivity),
            },
            (Some(FailureCategory::Decode), _) => Notice {
                category: FailureCategory::Decode,
                text: format!("{prefix}{}", self.texts.parse_failure),
            },
            (_, ChatwireError::Application(message) | ChatwireError::InvalidInput(message)) => {
                Notice {
                    category: FailureCategory::Application,
                    text: format!("{prefix}{message}"),
                }
            }
            (_, other) => Notice {
                category: FailureCategory::Application,
                text: format!("{prefix}{other}"),
            },
        }
    }
}
