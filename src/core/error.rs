//! Typed error handling for services built on [`CrudService`](crate::core::CrudService)
//!
//! [`ServiceError`] distinguishes the one domain failure this layer produces
//! (an id-based lookup that found nothing) from store failures, which are
//! carried through without being rewritten.
//!
//! # Example
//!
//! ```rust,ignore
//! match users.find_by_id_or_fail(id).await {
//!     Ok(user) => println!("Found: {:?}", user),
//!     Err(ServiceError::NotFound { id, .. }) => println!("User {} not found", id),
//!     Err(e) => eprintln!("Store error: {}", e),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use uuid::Uuid;

/// Errors returned by [`CrudService`](crate::core::CrudService) operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// No entity with this id exists
    #[error("{entity_type} with id '{id}' not found")]
    NotFound { entity_type: &'static str, id: Uuid },

    /// The store failed (connection, validation, timeout, ...)
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn not_found(entity_type: &'static str, id: Uuid) -> Self {
        ServiceError::NotFound { entity_type, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound { .. })
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::NotFound { .. } => "ENTITY_NOT_FOUND",
            ServiceError::Store(_) => "STORAGE_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ServiceError::NotFound { entity_type, id } => Some(serde_json::json!({
                "entity_type": entity_type,
                "id": id.to_string()
            })),
            ServiceError::Store(_) => None,
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let failure = RequestFailure::new(self.to_string());
        let body = Json(self.to_response());
        failure.attach((status, body).into_response())
    }
}

/// Marks a response as the outcome of a failed handler
///
/// Axum handlers report errors as responses, so the request logging
/// middleware cannot see the error value itself. Error types attach this
/// extension to their response to have the request logged as failed with
/// `message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFailure {
    pub message: String,
}

impl RequestFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Insert this marker into `response` and return it
    pub fn attach(self, mut response: Response) -> Response {
        response.extensions_mut().insert(self);
        response
    }

    /// The failure attached to `response`, if any
    pub fn from_response(response: &Response) -> Option<&RequestFailure> {
        response.extensions().get::<RequestFailure>()
    }
}
