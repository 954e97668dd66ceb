use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use wishlist_core::{ErrorKind, WorkflowError};
use wishlist_types::api::ErrorResponse;

/// Why a bearer token was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Bearer token is malformed")]
    MissingBearer,
    #[error("Token malformed")]
    Malformed,
    #[error("Token expired")]
    Expired,
    #[error("Token is invalid")]
    Invalid,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Username or password is incorrect")]
    BadCredentials,

    #[error("Could not send mail")]
    Mail(#[source] anyhow::Error),

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        ApiError::Workflow(WorkflowError::ValidationFailed(reason.into()))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Workflow(err) => match err.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::NotAuthorized => StatusCode::UNAUTHORIZED,
                ErrorKind::AlreadyExists | ErrorKind::AlreadyVerified => StatusCode::CONFLICT,
                ErrorKind::ValidationFailed | ErrorKind::CodeMismatch => StatusCode::BAD_REQUEST,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Token(_) | ApiError::BadCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Mail(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn source_chain(&self) -> Option<&anyhow::Error> {
        match self {
            ApiError::Workflow(WorkflowError::Internal(e)) | ApiError::Mail(e) | ApiError::Internal(e) => {
                Some(e)
            }
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Some(source) = self.source_chain() {
            error!("{}: {:#}", self, source);
        }
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
