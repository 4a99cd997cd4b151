use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::json;
use tracing::{debug, warn};

use quilt_protocol::{HealthResponse, PullRequest, PullResponse, PushRequest, PushResponse};
use quilt_sync::{apply_rows, local_clock, rows_since};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

pub async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stores = state.stores.read().await;
    let mut names: Vec<&String> = stores.keys().collect();
    names.sort();
    Json(json!({
        "name": "quilt-server",
        "version": env!("CARGO_PKG_VERSION"),
        "protocol_version": quilt_protocol::PROTOCOL_VERSION,
        "stores": names,
    }))
}

/// Return every row past the client's clock. Unknown stores are 404.
pub async fn pull_handler(
    State(state): State<AppState>,
    Path(store): Path<String>,
    Json(request): Json<PullRequest>,
) -> ServerResult<Json<PullResponse>> {
    let stores = state.stores.read().await;
    let hosted = stores
        .get(&store)
        .ok_or_else(|| ServerError::StoreNotFound(store.clone()))?;

    let rows = rows_since(&request.clock, &hosted.store, &hosted.log, &hosted.graph);
    let clock = local_clock(&hosted.store, &hosted.log, &hosted.graph);
    debug!(store = %store, rows = rows.len(), "served pull");
    Ok(Json(PullResponse { rows, clock }))
}

/// Accept offered rows, creating the hosted store on first push. Rows the
/// server already has are skipped; a row batch that cannot be applied (a
/// cycle-closing edge) rejects the whole push.
///
/// The batch lands in a working copy of the hosted store, which replaces
/// the live one only after every row applied and the blob persisted. A
/// rejected push never creates the store and never leaves it half-filled.
pub async fn push_handler(
    State(state): State<AppState>,
    Path(store): Path<String>,
    Json(request): Json<PushRequest>,
) -> ServerResult<(StatusCode, Json<PushResponse>)> {
    let mut stores = state.stores.write().await;
    let mut working = stores.get(&store).cloned().unwrap_or_default();

    let stats = apply_rows(
        request.rows,
        &mut working.store,
        &mut working.log,
        &mut working.graph,
    )
    .map_err(|e| {
        warn!(store = %store, error = %e, "rejected push");
        ServerError::MalformedPush(e.to_string())
    })?;

    let clock = local_clock(&working.store, &working.log, &working.graph);
    state.persist(&store, &working)?;
    stores.insert(store.clone(), working);
    debug!(
        store = %store,
        inserted = stats.inserted,
        skipped = stats.skipped,
        "accepted push"
    );
    Ok((
        StatusCode::CREATED,
        Json(PushResponse {
            inserted: stats.inserted,
            skipped: stats.skipped,
            clock,
        }),
    ))
}
