//! HTTP server for BucketKV.
//!
//! Exposes the namespaced store over REST. Every route except `/health` sits
//! behind the bearer-token gate.

mod error;
mod handlers;
mod middleware;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;

use crate::auth::AccessGate;
use crate::store::Store;

pub use error::{ApiError, Unauthorized};
pub use handlers::{AppState, BucketsResponse, KeysResponse};

/// Build the application router.
pub fn router(store: Arc<Store>, gate: Arc<AccessGate>) -> Router {
    let protected = Router::new()
        .route("/_list", get(handlers::handle_list))
        .route(
            "/:bucket/:key",
            get(handlers::handle_get)
                .post(handlers::handle_put)
                .delete(handlers::handle_delete),
        )
        .route(
            "/:bucket/",
            get(handlers::handle_missing_key)
                .post(handlers::handle_missing_key)
                .delete(handlers::handle_missing_key),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            gate,
            middleware::require_bearer,
        ))
        .with_state(AppState { store });

    Router::new()
        .route("/health", get(handlers::handle_health))
        .merge(protected)
        // values are opaque and unbounded at this layer
        .layer(DefaultBodyLimit::disable())
        .layer(axum::middleware::from_fn(middleware::log_request))
}
