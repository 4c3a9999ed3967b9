use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitLab returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Invalid GitLab URL {url:?}: {reason}")]
    Url { url: String, reason: String },

    #[error("Could not decode GitLab response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RemoteError {
    pub fn url(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        RemoteError::Url {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Build an error from a failed GitLab response. GitLab wraps errors as
    /// `{"message": ...}` or `{"error": ...}`; anything else is kept as text.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.get("message")
                    .or_else(|| v.get("error"))
                    .map(|m| match m {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
            })
            .unwrap_or_else(|| body.trim().to_string());

        if status == 404 {
            RemoteError::NotFound { message }
        } else {
            RemoteError::Status { status, message }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound { .. })
    }
}
