//! LIST-NAMESPACES / NAMESPACE-SIZE / CLEAR-NAMESPACE handlers (spec §6).

use axum::extract::{Path, State};
use axum::Json;

use crate::error::ApiError;
use crate::state::AppState;
use crate::types::{ClearNamespaceResponse, ListNamespacesResponse, NamespaceSizeResponse};

pub async fn list_namespaces(
    State(state): State<AppState>,
) -> Result<Json<ListNamespacesResponse>, ApiError> {
    let namespaces = state.store.list_namespaces().await;
    Ok(Json(ListNamespacesResponse {
        count: namespaces.len(),
        namespaces,
    }))
}

pub async fn namespace_size(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
) -> Result<Json<NamespaceSizeResponse>, ApiError> {
    let total_keys = state.store.namespace_size(&namespace).await;
    Ok(Json(NamespaceSizeResponse {
        namespace,
        total_keys,
    }))
}

pub async fn clear_namespace(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
) -> Result<Json<ClearNamespaceResponse>, ApiError> {
    let keys_deleted = state.store.clear_namespace(&namespace).await?;
    Ok(Json(ClearNamespaceResponse {
        status: "cleared",
        namespace,
        keys_deleted,
    }))
}
