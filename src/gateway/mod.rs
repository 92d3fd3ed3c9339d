//! HTTP surface: router, shared state and handlers.

mod handlers;

use std::any::Any;
use std::sync::Arc;

use anyhow::Result;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as CorsAny, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::credentials::CredentialVault;
use crate::routing::RoutingTable;
use crate::upstream::HttpFetcher;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Application state shared across handlers. Immutable after startup.
pub struct AppState {
    pub routing: RoutingTable,
    pub fetcher: HttpFetcher,
    pub vault: CredentialVault,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            routing: RoutingTable::new(&config.upstreams)?,
            fetcher: HttpFetcher::new(&config.upstreams)?,
            vault: CredentialVault::from_config(&config.credentials),
        })
    }
}

pub const ALLOWED_METHODS: &str = "GET, OPTIONS";

/// Build the full router with CORS, content-type, panic and trace layers.
///
/// `OPTIONS` on any path is answered by the CORS layer with an empty 200 and
/// never reaches a handler.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(CorsAny)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(CorsAny);

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/proxy",
            get(handlers::proxy).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/search",
            get(handlers::local_search).fallback(handlers::method_not_allowed),
        )
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_TYPE,
            HeaderValue::from_static(JSON_CONTENT_TYPE),
        ))
        .layer(TraceLayer::new_for_http())
}

/// Last-resort boundary: a panic becomes a plain 500 without internals.
fn panic_response(_err: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("Handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "status": 500,
            "error": "internal error",
        })),
    )
        .into_response()
}
