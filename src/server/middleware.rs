//! HTTP middleware: bearer-token gate and request logging.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::error::Unauthorized;
use crate::auth::{unix_now, AccessGate, AuthError, Verdict};

/// Consult the access gate before the request reaches a handler.
pub async fn require_bearer(
    State(gate): State<Arc<AccessGate>>,
    request: Request,
    next: Next,
) -> Response {
    let verdict = match request.headers().get(AUTHORIZATION).map(HeaderValue::to_str) {
        Some(Err(_)) => Verdict::Denied(AuthError::MalformedCredential),
        header => gate.decide(header.and_then(Result::ok), unix_now()),
    };

    match verdict {
        Verdict::Admitted => next.run(request).await,
        Verdict::Denied(reason) => {
            log::warn!(
                "denied {} {}: {}",
                request.method(),
                request.uri().path(),
                reason
            );
            Unauthorized(reason).into_response()
        }
    }
}

/// Log every request and its outcome at debug level.
pub async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    log::debug!(
        "{} {} -> {} ({} ms)",
        method,
        path,
        response.status().as_u16(),
        start.elapsed().as_millis()
    );
    response
}
