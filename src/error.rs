//! Error types for the repository layer and the HTTP boundary.
//!
//! Repositories report [`RepoError`]; handlers translate into [`AppError`],
//! which renders the `{"error": "..."}` envelope.

use std::future::{ready, Ready};

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("record not found")]
    NotFound,

    #[error("email already registered")]
    DuplicateEmail,

    #[error("owner does not exist")]
    UnknownOwner,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    /// Carries the methods the path does accept, for the `Allow` header.
    #[error("Method not allowed")]
    MethodNotAllowed(&'static str),

    #[error(transparent)]
    Storage(RepoError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound => Self::NotFound("Not found"),
            RepoError::DuplicateEmail => Self::Conflict("Email already registered"),
            other => Self::Storage(other),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Storage(e) => {
                error!(error = %e, "storage failure");
                server_error_body(e.to_string())
            }
            Self::Internal(e) => {
                error!(error = ?e, "internal failure");
                server_error_body(format!("{e:#}"))
            }
            other => ErrorBody::new(other.to_string()),
        };
        let mut resp = (status, Json(body)).into_response();
        if let Self::MethodNotAllowed(allow) = self {
            resp.headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static(allow));
        }
        resp
    }
}

/// Method fallback for known paths; `allow` lists the routed methods.
pub fn method_not_allowed(
    allow: &'static str,
) -> impl FnOnce() -> Ready<AppError> + Clone + Send + Sync + 'static {
    move || ready(AppError::MethodNotAllowed(allow))
}

/// Router fallback for unknown paths.
pub async fn route_not_found() -> AppError {
    AppError::NotFound("Not found")
}

fn server_error_body(_detail: String) -> ErrorBody {
    let body = ErrorBody::new("Internal server error");
    #[cfg(feature = "dev-errors")]
    let body = ErrorBody {
        details: Some(_detail),
        ..body
    };
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_error_is_400_with_message() {
        let resp = AppError::Validation("password too short".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "password too short");
    }

    #[tokio::test]
    async fn duplicate_email_maps_to_conflict() {
        let resp = AppError::from(RepoError::DuplicateEmail).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(resp).await["error"], "Email already registered");
    }

    #[tokio::test]
    async fn storage_error_does_not_leak() {
        let err = AppError::from(RepoError::Database(sqlx::Error::PoolTimedOut));
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "Internal server error");
        #[cfg(not(feature = "dev-errors"))]
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn method_not_allowed_is_405_with_allow() {
        let resp = AppError::MethodNotAllowed("GET, HEAD").into_response();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()[header::ALLOW], "GET, HEAD");
        assert_eq!(body_json(resp).await["error"], "Method not allowed");
    }
}
