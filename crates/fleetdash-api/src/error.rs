use thiserror::Error;

/// Errors returned by the fleet API and maps clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP 404. For tracking sessions this means the link never existed.
    #[error("not found: {url}")]
    NotFound { url: String },

    /// HTTP 410. For tracking sessions this means the link has expired.
    #[error("expired: {url}")]
    Expired { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The backend answered 2xx but with `"success": false`.
    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A Google Maps web service returned a non-`OK` status.
    #[error("maps service returned {status}: {message}")]
    Maps { status: String, message: String },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ApiError {
    /// Maps a non-2xx status to the matching variant.
    pub(crate) fn from_status(status: reqwest::StatusCode, url: &reqwest::Url) -> Self {
        let url = url.to_string();
        match status {
            reqwest::StatusCode::NOT_FOUND => ApiError::NotFound { url },
            reqwest::StatusCode::GONE => ApiError::Expired { url },
            other => ApiError::UnexpectedStatus {
                status: other.as_u16(),
                url,
            },
        }
    }
}
