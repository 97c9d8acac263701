use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use tower_http::cors::CorsLayer;

use crate::classify::ClassifierTables;
use crate::ingest;
use crate::ingest::types::UpdateFetcher;
use crate::model::ReliefLocation;
use crate::normalize::normalize;
use crate::store::AidPointStore;

/// Explicitly constructed, dependency-injected state — no singletons. Built
/// once in the entrypoint from `AppConfig` and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<dyn UpdateFetcher>,
    pub store: Arc<dyn AidPointStore>,
    pub tables: Arc<ClassifierTables>,
    pub secret: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/ingest-data", post(ingest_data))
        .route("/relief-locations", get(relief_locations))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct IngestResp {
    message: String,
    upserted_count: usize,
    deleted_count: usize,
}

#[derive(serde::Serialize)]
struct ErrorResp {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResp>);

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    (status, Json(ErrorResp { error: msg.into() }))
}

async fn ingest_data(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<IngestResp>, ApiError> {
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    if presented != format!("Bearer {}", state.secret) {
        return Err(api_error(StatusCode::UNAUTHORIZED, "unauthorized"));
    }

    match ingest::run_once(
        Utc::now(),
        state.fetcher.as_ref(),
        state.store.as_ref(),
        &state.tables,
    )
    .await
    {
        Ok(outcome) => Ok(Json(IngestResp {
            message: "ingest cycle complete".to_string(),
            upserted_count: outcome.upserted,
            deleted_count: outcome.deleted,
        })),
        Err(e) => {
            tracing::error!(error = ?e, "ingest cycle failed");
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// Map view: aggregated live from the AidPoint rows on every read.
async fn relief_locations(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReliefLocation>>, ApiError> {
    match state.store.all() {
        Ok(rows) => Ok(Json(normalize(&rows))),
        Err(e) => {
            tracing::error!(error = ?e, "reading aid points failed");
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
