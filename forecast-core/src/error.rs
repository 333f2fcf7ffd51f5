use thiserror::Error;

/// Why a single fetch attempt failed. Every variant is terminal for that
/// attempt; retrying is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("transport error ({kind}): {details}")]
    Transport { kind: TransportKind, details: String },

    #[error("provider responded with HTTP status {0}")]
    HttpStatus(u16),

    #[error("provider responded with an empty body")]
    NoData,

    #[error("failed to decode forecast: {0}")]
    Decode(String),
}

/// Coarse classification of transport failures, enough for a consumer to
/// pick between "no connection" and "took too long" messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Connect,
    Timeout,
    Other,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TransportKind::Connect => "connect",
            TransportKind::Timeout => "timeout",
            TransportKind::Other => "other",
        })
    }
}

impl FetchError {
    pub fn transport(kind: TransportKind, details: impl Into<String>) -> Self {
        FetchError::Transport { kind, details: details.into() }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Transport { kind: TransportKind::Timeout, .. })
    }

    pub fn is_connect(&self) -> bool {
        matches!(self, FetchError::Transport { kind: TransportKind::Connect, .. })
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportKind::Timeout
        } else if err.is_connect() {
            TransportKind::Connect
        } else {
            TransportKind::Other
        };
        FetchError::transport(kind, err.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_message_mentions_code() {
        assert!(FetchError::HttpStatus(404).to_string().contains("404"));
    }

    #[test]
    fn timeout_classification() {
        let err = FetchError::transport(TransportKind::Timeout, "deadline elapsed");
        assert!(err.is_timeout());
        assert!(!err.is_connect());
        assert!(!FetchError::NoData.is_timeout());
    }

    #[test]
    fn json_errors_become_decode() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(FetchError::from(err), FetchError::Decode(_)));
    }
}
