//! SET / GET / DELETE handlers (spec §6).

use axum::extract::{Path, Query, State};
use axum::Json;

use crate::error::ApiError;
use crate::state::AppState;
use crate::types::{DeleteResponse, GetResponse, NamespaceQuery, SetRequest, SetResponse};

/// Query `ns` takes precedence over the body's `namespace` field (spec §6).
fn resolve_namespace(query_ns: Option<String>, body_ns: Option<String>) -> String {
    query_ns.or(body_ns).unwrap_or_default()
}

pub async fn set(
    State(state): State<AppState>,
    Query(query): Query<NamespaceQuery>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>, ApiError> {
    let namespace = resolve_namespace(query.ns, req.namespace.clone());
    state
        .store
        .set(&namespace, &req.key, req.value, req.ttl)
        .await?;
    Ok(Json(SetResponse {
        status: "ok",
        key: req.key,
        namespace: non_default(&namespace),
    }))
}

pub async fn get(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<NamespaceQuery>,
) -> Result<Json<GetResponse>, ApiError> {
    let namespace = query.ns.unwrap_or_default();
    let value = state.store.get(&namespace, &key).await?;
    Ok(Json(GetResponse {
        key,
        value,
        namespace: non_default(&namespace),
    }))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<NamespaceQuery>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let namespace = query.ns.unwrap_or_default();
    let existed = state.store.delete(&namespace, &key).await?;
    if !existed {
        return Err(nskv_common::Error::NotFound.into());
    }
    Ok(Json(DeleteResponse {
        status: "deleted",
        key,
        namespace: non_default(&namespace),
    }))
}

fn non_default(namespace: &str) -> Option<String> {
    if namespace.is_empty() {
        None
    } else {
        Some(namespace.to_string())
    }
}
