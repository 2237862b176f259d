//! Error handling for the bookshelf HTTP layer

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bookshelf_db::DbError;
use serde_json::json;
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {message}")]
    Validation {
        details: Vec<serde_json::Value>,
        code: String,
        message: String,
    },

    #[error("bad request: {message}")]
    BadRequest { message: String, code: String },

    #[error("not found: {message}")]
    NotFound { message: String, code: String },

    #[error("store error: {message}")]
    Store {
        status: StatusCode,
        code: String,
        message: String,
        #[source]
        source: DbError,
    },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a validation error
    pub fn validation(details: Vec<serde_json::Value>, message: impl Into<String>) -> Self {
        Self::Validation {
            details,
            code: "validation_error".to_string(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            code: "not_found".to_string(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            code: "bad_request".to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Store { status, .. } => *status,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        let (status, code, message) = match err.fault() {
            Some(fault) if fault.is_client_error() => (
                StatusCode::BAD_REQUEST,
                fault.code().to_string(),
                format!("{}: {}", fault.message(), err.detail()),
            ),
            Some(fault) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                fault.code().to_string(),
                fault.message().to_string(),
            ),
            None => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error".to_string(),
                err.detail(),
            ),
        };

        Self::Store {
            status,
            code,
            message,
            source: err,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest {
            message: rejection.body_text(),
            code: "invalid_json".to_string(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

/// Cause chain of a server fault, attached to the error response as an
/// extension. It only reaches the body when the router exposes it (see
/// [`crate::router::RouterBuilder::with_error_detail`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorChain(pub Vec<String>);

/// Render an error and its sources, outermost first.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> Vec<String> {
    let mut chain = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    chain
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::now_v7();
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        let status = self.status();

        let debug_chain = match &self {
            AppError::Store { source, .. } => Some(error_chain(source)),
            AppError::Internal(e) => Some(e.chain().map(|cause| cause.to_string()).collect()),
            _ => None,
        };

        let (error_code, message, details) = match self {
            AppError::Validation {
                details,
                code,
                message,
            } => (code, message, details),
            AppError::BadRequest { message, code } | AppError::NotFound { message, code } => {
                (code, message, Vec::new())
            }
            AppError::Store { code, message, .. } => (code, message, Vec::new()),
            AppError::Internal(e) => ("internal_error".to_string(), e.to_string(), Vec::new()),
        };

        if status.is_server_error() {
            tracing::error!(
                error_id = %error_id,
                error_code = %error_code,
                status_code = %status.as_u16(),
                chain = ?debug_chain,
                "Request error"
            );
        } else {
            tracing::warn!(
                error_id = %error_id,
                error_code = %error_code,
                status_code = %status.as_u16(),
                "Request error"
            );
        }

        let error = json!({
            "code": error_code,
            "details": details,
            "trace_id": error_id.to_string(),
            "timestamp": timestamp
        });

        let body = json!({
            "success": false,
            "message": message,
            "error": error
        });

        let mut response = (status, Json(body)).into_response();
        if let Some(chain) = debug_chain {
            response.extensions_mut().insert(ErrorChain(chain));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use std::io;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_validation_error() {
        let details = vec![serde_json::json!({"field": "title", "error": "required"})];
        let error = AppError::validation(details.clone(), "Validation failed");

        match error {
            AppError::Validation {
                details: d,
                code,
                message,
            } => {
                assert_eq!(d, details);
                assert_eq!(code, "validation_error");
                assert_eq!(message, "Validation failed");
            }
            _ => panic!("Expected Validation error"),
        }
    }

    #[tokio::test]
    async fn test_validation_maps_to_400() {
        let error = AppError::validation(vec![], "Title and author are required");
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Title and author are required");
        assert_eq!(body["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn test_error_response_format() {
        let response = AppError::not_found("Book not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Book not found");
        assert_eq!(body["error"]["code"], "not_found");
        assert!(Uuid::parse_str(body["error"]["trace_id"].as_str().unwrap()).is_ok());
        assert!(OffsetDateTime::parse(body["error"]["timestamp"].as_str().unwrap(), &Rfc3339).is_ok());
    }

    #[tokio::test]
    async fn test_internal_error_mapping() {
        let internal_error = anyhow::anyhow!("Database connection failed");
        let response = AppError::Internal(internal_error).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Database connection failed");
    }

    #[tokio::test]
    async fn test_refused_connection_maps_to_500() {
        let error = AppError::from(io_failure(io::ErrorKind::ConnectionRefused, "refused"));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(error.into_response()).await;
        assert_eq!(body["message"], "Database connection refused");
        assert_eq!(body["error"]["code"], "database_unreachable");
    }

    #[tokio::test]
    async fn test_unclassified_store_error_surfaces_driver_message() {
        let error = AppError::from(io_failure(io::ErrorKind::BrokenPipe, "pipe closed"));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(error.into_response()).await;
        assert_eq!(body["error"]["code"], "store_error");
        assert!(body["message"].as_str().unwrap().contains("pipe closed"));
    }

    #[tokio::test]
    async fn test_store_error_carries_chain_outside_the_body() {
        let response =
            AppError::from(io_failure(io::ErrorKind::BrokenPipe, "pipe closed")).into_response();

        let chain = response.extensions().get::<ErrorChain>().cloned().unwrap();
        assert!(chain.0.iter().any(|cause| cause.contains("pipe closed")));

        let body = body_json(response).await;
        assert!(body["error"].get("debug").is_none());
    }

    #[tokio::test]
    async fn test_client_errors_have_no_chain() {
        let response = AppError::bad_request("bad query").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.extensions().get::<ErrorChain>().is_none());

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "bad_request");
    }

    fn io_failure(kind: io::ErrorKind, message: &str) -> DbError {
        DbError::from(sqlx::Error::Io(io::Error::new(kind, message.to_string())))
    }
}
