use thiserror::Error;

/// A convenience `Result` alias using [`ChatwireError`].
pub type ChatwireResult<T> = Result<T, ChatwireError>;

/// Top-level error type for the chatwire client.
#[derive(Error, Debug)]
pub enum ChatwireError {
    /// The caller submitted something that cannot start a turn
    /// (blank question, or a reply is still streaming).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Connecting, sending, or reading from the transport failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The transport closed before the reply was finished.
    #[error("Connection closed before the reply finished")]
    Disconnected,

    /// A frame or line from the server could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The server explicitly signalled a failure.
    #[error("Application error: {0}")]
    Application(String),

    /// Endpoint or client configuration is unusable.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The user-visible failure buckets a terminal error falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    /// Connection refused, network drop, non-2xx status, unusable endpoint.
    Transport,
    /// Malformed control or content payload.
    Decode,
    /// Explicit server-side failure signal.
    Application,
}

impl ChatwireError {
    /// Returns the failure bucket for this error.
    ///
    /// `InvalidInput` yields `None`: it is reported to the caller and never
    /// becomes a transcript entry.
    pub fn category(&self) -> Option<FailureCategory> {
        match self {
            ChatwireError::InvalidInput(_) => None,
            ChatwireError::Transport(_)
            | ChatwireError::Disconnected
            | ChatwireError::Config(_)
            | ChatwireError::Io(_) => Some(FailureCategory::Transport),
            ChatwireError::Decode(_) | ChatwireError::Json(_) => Some(FailureCategory::Decode),
            ChatwireError::Application(_) => Some(FailureCategory::Application),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_has_no_category() {
        let err = ChatwireError::InvalidInput("empty".into());
        assert_eq!(err.category(), None);
    }

    #[test]
    fn json_errors_count_as_decode_failures() {
        let err: ChatwireError = serde_json::from_str::<serde_json::Value>("{nope")
            .unwrap_err()
            .into();
        assert_eq!(err.category(), Some(FailureCategory::Decode));
    }

    #[test]
    fn disconnect_is_a_transport_failure() {
        assert_eq!(
            ChatwireError::Disconnected.category(),
            Some(FailureCategory::Transport)
        );
        assert_eq!(
            ChatwireError::Config("bad url".into()).category(),
            Some(FailureCategory::Transport)
        );
    }
}
