use std::time::Duration;

/// Failure modes of a single block-explorer request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Connection error, non-2xx status, a body that is not JSON, or an
    /// explorer-level rejection (rate limit, invalid key).
    #[error("network failure: {0}")]
    NetworkFailure(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// Body parsed as JSON but did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// Explorer answered with an explicit empty result.
    #[error("no records found")]
    NotFound,
}

impl FetchError {
    /// Whether the next transport or source should be tried.
    ///
    /// `MalformedResponse` and `NotFound` are answers, not outages: the caller
    /// resolves them to an empty value instead of retrying elsewhere.
    pub fn advances_fallback(&self) -> bool {
        matches!(self, Self::NetworkFailure(_) | Self::Timeout(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::NetworkFailure(_) => "network",
            Self::Timeout(_) => "timeout",
            Self::MalformedResponse(_) => "malformed",
            Self::NotFound => "not_found",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::MalformedResponse(e.to_string())
        } else {
            Self::NetworkFailure(e.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        Self::MalformedResponse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_errors_advance() {
        assert!(FetchError::NetworkFailure("refused".to_string()).advances_fallback());
        assert!(FetchError::Timeout(Duration::from_secs(5)).advances_fallback());
        assert!(!FetchError::MalformedResponse("bad".to_string()).advances_fallback());
        assert!(!FetchError::NotFound.advances_fallback());
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(FetchError::Timeout(Duration::from_millis(1)).kind(), "timeout");
        assert_eq!(FetchError::NotFound.kind(), "not_found");
    }

    #[test]
    fn test_json_error_is_malformed() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(FetchError::from(err), FetchError::MalformedResponse(_)));
    }
}
