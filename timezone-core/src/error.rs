use thiserror::Error;

/// Everything a lookup can fail with. Each variant is delivered to both the
/// returned future and the completion callback.
#[derive(Debug, Error)]
pub enum TimezoneError {
    /// A required request option was not supplied. No request was sent.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The endpoint and query parameters did not form a valid URL.
    #[error("failed to build request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Connecting, sending or reading the response failed.
    #[error("request to timezone service failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not a JSON document.
    #[error("failed to parse timezone response (HTTP {status}): {source}; body: {body}")]
    Parse {
        status: u16,
        body: String,
        #[source]
        source: serde_json::Error,
    },
}

impl TimezoneError {
    /// Name of the missing option, if this is a `MissingField` error.
    pub fn missing_field(&self) -> Option<&'static str> {
        match self {
            TimezoneError::MissingField(name) => Some(name),
            _ => None,
        }
    }
}
