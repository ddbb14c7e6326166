//! Request logging middleware
//!
//! Every request/response cycle goes through three steps:
//!
//! 1. **Start**: a [`RequestContext`] records method, path and the start
//!    instant, and is inserted into the request extensions.
//! 2. **In flight**: the request is handed to the rest of the stack.
//! 3. **Completed** (info line with status and duration) or **Failed**
//!    (error line with duration and message). A response is failed when it
//!    carries a [`RequestFailure`] extension; it is returned unchanged either way.
//!
//! With `verbose_logging`, sanitized request and response bodies are logged
//! at debug level. Only JSON bodies of known length up to
//! `max_logged_body_bytes` are buffered; every other body streams through
//! untouched and is logged as a size placeholder. Excluded paths and
//! protocol upgrades are never logged.
//!
//! # Example
//!
//! ```rust,ignore
//! let app = with_request_logging(router, RequestLoggingConfig::from_env());
//! ```

use axum::Router;
use axum::body::{Body, Bytes, HttpBody};
use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::RequestLoggingConfig;
use crate::core::error::RequestFailure;
use crate::core::sanitize::{SensitiveFields, sanitize_object_default};

/// Field names masked in every logged body
pub const DEFAULT_SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "passwordConfirmation",
    "password_confirmation",
    "currentPassword",
    "current_password",
    "newPassword",
    "new_password",
    "token",
    "accessToken",
    "access_token",
    "refreshToken",
    "refresh_token",
    "secret",
    "apiKey",
    "api_key",
    "authorization",
];

/// Per-request logging context
///
/// Created when the request enters the middleware and available to handlers
/// as an extractor. Outside the middleware, extraction falls back to a
/// context started at extraction time.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub started_at: Instant,
}

impl RequestContext {
    pub fn start(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            started_at: Instant::now(),
        }
    }

    fn from_request(req: &Request) -> Self {
        Self::start(req.method().clone(), req.uri().path())
    }

    /// Time since the request entered the middleware
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(|| RequestContext::start(parts.method.clone(), parts.uri.path())))
    }
}

/// Shared state of the request logging middleware
#[derive(Debug, Clone)]
pub struct RequestLogging {
    config: Arc<RequestLoggingConfig>,
    sensitive: Arc<SensitiveFields>,
}

impl RequestLogging {
    pub fn new(config: RequestLoggingConfig) -> Self {
        let mut sensitive = SensitiveFields::new(DEFAULT_SENSITIVE_FIELDS);
        sensitive.extend(&config.sensitive_fields);

        Self {
            config: Arc::new(config),
            sensitive: Arc::new(sensitive),
        }
    }

    pub fn config(&self) -> &RequestLoggingConfig {
        &self.config
    }

    /// Decide whether a body can be buffered for the log
    fn capture_for(&self, headers: &HeaderMap, body: &Body) -> BodyCapture {
        match body_size(headers, body) {
            Some(0) => BodyCapture::Empty,
            Some(n) if !is_json(headers) => BodyCapture::Skip(format!("<{} bytes, non-JSON>", n)),
            Some(n) if n > self.config.max_logged_body_bytes as u64 => {
                BodyCapture::Skip(format!("<{} bytes, not logged>", n))
            }
            Some(_) => BodyCapture::Buffer,
            None => BodyCapture::Skip("<unknown size, not logged>".to_string()),
        }
    }

    /// Render a buffered body for the log: sanitized JSON, or a size placeholder
    fn describe_body(&self, bytes: &Bytes) -> Option<String> {
        if bytes.is_empty() {
            return None;
        }

        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => Some(sanitize_object_default(&value, &self.sensitive).to_string()),
            Err(_) => Some(format!("<{} bytes, non-JSON>", bytes.len())),
        }
    }

    fn should_log(&self, req: &Request) -> bool {
        !req.headers().contains_key(header::UPGRADE) && !self.config.is_excluded(req.uri().path())
    }
}

/// What verbose logging does with one body
#[derive(Debug, PartialEq, Eq)]
enum BodyCapture {
    Empty,
    /// Logged as this placeholder, the body is passed on unread
    Skip(String),
    Buffer,
}

fn body_size(headers: &HeaderMap, body: &Body) -> Option<u64> {
    body.size_hint().exact().or_else(|| {
        headers
            .get(header::CONTENT_LENGTH)?
            .to_str()
            .ok()?
            .trim()
            .parse()
            .ok()
    })
}

fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json")
}

fn log_body(ctx: &RequestContext, kind: &str, body: &str) {
    tracing::debug!(
        method = %ctx.method,
        path = %ctx.path,
        "{} {} {} body: {}",
        ctx.method,
        ctx.path,
        kind,
        body
    );
}

impl Default for RequestLogging {
    fn default() -> Self {
        Self::new(RequestLoggingConfig::default())
    }
}

/// Wrap every route of `router` in the request logging middleware
pub fn with_request_logging<S>(router: Router<S>, config: RequestLoggingConfig) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(axum::middleware::from_fn_with_state(
        RequestLogging::new(config),
        request_logging,
    ))
}

/// Request logging middleware, for use with `axum::middleware::from_fn_with_state`
pub async fn request_logging(
    State(logging): State<RequestLogging>,
    mut req: Request,
    next: Next,
) -> Response {
    if !logging.should_log(&req) {
        return next.run(req).await;
    }

    let ctx = RequestContext::from_request(&req);
    req.extensions_mut().insert(ctx.clone());

    if logging.config.verbose_logging {
        req = match log_request_body(&logging, &ctx, req).await {
            Ok(req) => req,
            Err(response) => return response,
        };
    }

    let response = next.run(req).await;
    let status = response.status().as_u16();
    let duration_ms = ctx.elapsed_ms();

    if let Some(failure) = RequestFailure::from_response(&response) {
        tracing::error!(
            method = %ctx.method,
            path = %ctx.path,
            status,
            duration_ms,
            "{} {} - {}ms - {}",
            ctx.method,
            ctx.path,
            duration_ms,
            failure.message
        );
        return response;
    }

    tracing::info!(
        method = %ctx.method,
        path = %ctx.path,
        status,
        duration_ms,
        "{} {} {} - {}ms",
        ctx.method,
        ctx.path,
        status,
        duration_ms
    );

    if logging.config.verbose_logging {
        return log_response_body(&logging, &ctx, response).await;
    }

    response
}

async fn log_request_body(
    logging: &RequestLogging,
    ctx: &RequestContext,
    req: Request,
) -> Result<Request, Response> {
    let (parts, body) = req.into_parts();

    let body = match logging.capture_for(&parts.headers, &body) {
        BodyCapture::Empty => body,
        BodyCapture::Skip(placeholder) => {
            log_body(ctx, "request", &placeholder);
            body
        }
        BodyCapture::Buffer => {
            let bytes = match axum::body::to_bytes(body, logging.config.max_logged_body_bytes).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    let message = format!("Failed to read request body: {}", e);
                    tracing::error!(
                        method = %ctx.method,
                        path = %ctx.path,
                        duration_ms = ctx.elapsed_ms(),
                        "{} {} - {}ms - {}",
                        ctx.method,
                        ctx.path,
                        ctx.elapsed_ms(),
                        message
                    );
                    let response = (StatusCode::BAD_REQUEST, message.clone()).into_response();
                    return Err(RequestFailure::new(message).attach(response));
                }
            };

            if let Some(described) = logging.describe_body(&bytes) {
                log_body(ctx, "request", &described);
            }
            Body::from(bytes)
        }
    };

    Ok(Request::from_parts(parts, body))
}

async fn log_response_body(
    logging: &RequestLogging,
    ctx: &RequestContext,
    response: Response,
) -> Response {
    let (parts, body) = response.into_parts();

    let body = match logging.capture_for(&parts.headers, &body) {
        BodyCapture::Empty => body,
        BodyCapture::Skip(placeholder) => {
            log_body(ctx, "response", &placeholder);
            body
        }
        BodyCapture::Buffer => {
            let bytes = match axum::body::to_bytes(body, logging.config.max_logged_body_bytes).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    let message = format!("Failed to read response body: {}", e);
                    tracing::error!(
                        method = %ctx.method,
                        path = %ctx.path,
                        "{} {} - {}ms - {}",
                        ctx.method,
                        ctx.path,
                        ctx.elapsed_ms(),
                        message
                    );
                    return (StatusCode::INTERNAL_SERVER_ERROR, message).into_response();
                }
            };

            if let Some(described) = logging.describe_body(&bytes) {
                log_body(ctx, "response", &described);
            }
            Body::from(bytes)
        }
    };

    Response::from_parts(parts, body)
}
