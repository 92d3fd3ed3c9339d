use std::sync::Arc;
use std::time::Instant;

use axum::extract::{RawQuery, State};
use axum::http::{header, Method, Uri};
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::{AppState, ALLOWED_METHODS};
use crate::error::ProxyError;
use crate::models::{ProxyResult, RouteRequest};
use crate::normalize::normalize_local_search;
use crate::routing::Route;
use crate::search::AdaptiveSearch;

#[derive(Serialize)]
pub(super) struct HealthResponse {
    status: &'static str,
}

/// Health check endpoint
pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Aggregation proxy: route by `api`, fetch, wrap in the envelope.
pub(super) async fn proxy(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Result<Json<ProxyResult>, ProxyError> {
    let started = Instant::now();
    let request = RouteRequest::from_query(parse_query(query.as_deref()))?;

    match state.routing.route(&request, &state.vault)? {
        Route::Adaptive(point) => {
            let outcome = AdaptiveSearch::new(&state.routing, &state.fetcher)
                .resolve(point)
                .await?;

            info!(
                "coord ({}, {}): {} records after {} attempts in {}ms",
                point.lat,
                point.lng,
                outcome.records.len(),
                outcome.attempts,
                outcome.elapsed_ms
            );

            Ok(Json(ProxyResult::ok(
                Value::Array(outcome.records),
                outcome.elapsed_ms,
            )))
        }
        Route::Direct(descriptor) => {
            let fetched = state.fetcher.fetch(&descriptor).await?;
            let elapsed_ms = started.elapsed().as_millis();

            info!(
                "{} -> {} ({}) in {}ms",
                request.api_kind,
                descriptor.url,
                fetched.status,
                elapsed_ms
            );

            Ok(Json(ProxyResult {
                success: true,
                status: fetched.status,
                data: fetched.body,
                elapsed_ms,
            }))
        }
    }
}

/// Free-text local search; returns the provider's own shape, normalized.
pub(super) async fn local_search(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Result<Json<Value>, ProxyError> {
    let started = Instant::now();
    let params = parse_query(query.as_deref());

    let descriptor = state.routing.local_search(&params, &state.vault)?;
    let fetched = state.fetcher.fetch(&descriptor).await?;

    info!(
        "local search ({}) in {}ms",
        fetched.status,
        started.elapsed().as_millis()
    );

    Ok(Json(normalize_local_search(fetched.body)))
}

pub(super) async fn method_not_allowed(method: Method) -> Response {
    (
        [(header::ALLOW, ALLOWED_METHODS)],
        ProxyError::MethodNotAllowed(method.to_string()),
    )
        .into_response()
}

pub(super) async fn not_found(uri: Uri) -> ProxyError {
    ProxyError::NotFound(uri.path().to_string())
}

fn parse_query(query: Option<&str>) -> Vec<(String, String)> {
    query
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}
