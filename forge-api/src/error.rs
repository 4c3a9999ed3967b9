//! Error handling for the relay API
//!
//! Every failed or empty GitLab call becomes an [`ApiError::Common`] carrying
//! the named code of the operation (`error.branch.create`, ...). The code is
//! what clients match on; the message is the GitLab client's own text.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use forge_remote::RemoteError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Named error codes, one per operation.
pub mod code {
    pub const BRANCH_CREATE: &str = "error.branch.create";
    pub const BRANCH_DELETE: &str = "error.branch.delete";
    pub const BRANCH_QUERY: &str = "error.branch.query";
    pub const BRANCH_LIST: &str = "error.branch.list";
    pub const TAG_GET: &str = "error.tag.get";
    pub const TAG_GET_PAGE: &str = "error.tag.getPage";
    pub const TAG_CREATE: &str = "error.tag.create";
    pub const README_CREATE: &str = "error.readme.create";
    pub const README_GET: &str = "error.readme.get";

    pub const PROJECT_CREATE: &str = "error.project.create";
    pub const PROJECT_DELETE: &str = "error.project.delete";
    pub const PROJECT_UPDATE: &str = "error.project.update";
    pub const VARIABLE_CREATE: &str = "error.variable.create";
    pub const BRANCH_PROTECT: &str = "error.branch.protect";
    pub const PROTECTED_BRANCH_QUERY: &str = "error.protected.branch.query";
    pub const PROTECTED_BRANCH_LIST: &str = "error.protected.branch.list";
    pub const PROTECTED_BRANCH_DELETE: &str = "error.protected.branch.delete";

    pub const MEMBER_ADD: &str = "error.member.add";
    pub const MEMBER_UPDATE: &str = "error.member.update";
    pub const MEMBER_QUERY: &str = "error.member.query";
    pub const MEMBER_REMOVE: &str = "error.member.remove";

    pub const REQUEST_INVALID: &str = "error.request.invalid";
    pub const INTERNAL: &str = "error.internal";
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// A GitLab call failed or produced nothing
    #[error("{code}: {message}")]
    Common { code: &'static str, message: String },

    /// The request itself is malformed
    #[error("Invalid request: {message}")]
    Invalid { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

/// Error response format for JSON API responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub failed: bool,
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            failed: true,
            code: code.into(),
            message: message.into(),
        }
    }
}

impl ApiError {
    /// Map a GitLab client failure to the named error of an operation, for
    /// use with `map_err`.
    pub fn common(code: &'static str) -> impl FnOnce(RemoteError) -> ApiError {
        move |err| ApiError::Common {
            code,
            message: err.to_string(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal {
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Common { code, .. } => *code,
            ApiError::Invalid { .. } => code::REQUEST_INVALID,
            ApiError::Internal { .. } => code::INTERNAL,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Invalid { .. } => StatusCode::BAD_REQUEST,
            ApiError::Common { .. } | ApiError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::invalid(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal { message } => {
                error!("{}", self);
                message.clone()
            }
            ApiError::Common { message, .. } | ApiError::Invalid { message } => {
                warn!("{}", self);
                message.clone()
            }
        };

        (status, Json(ErrorResponse::new(self.code(), message))).into_response()
    }
}
