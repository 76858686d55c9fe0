//! STATS / HEALTH / COMPACT / PERFORMANCE handlers (spec §6).

use std::time::UNIX_EPOCH;

use axum::extract::{Query, State};
use axum::Json;

use crate::error::ApiError;
use crate::state::AppState;
use crate::types::{
    CompactResponse, HealthResponse, NamespaceQuery, NamespaceStatsBody, PerformanceResponse,
    StatsResponse,
};

pub async fn stats(
    State(state): State<AppState>,
    Query(query): Query<NamespaceQuery>,
) -> Json<StatsResponse> {
    let snapshot = state.store.stats().await;
    let namespaces = snapshot
        .namespaces
        .iter()
        .map(|(ns, n)| {
            (
                ns.clone(),
                NamespaceStatsBody {
                    cache_hits: n.cache_hits,
                    cache_misses: n.cache_misses,
                    total_keys: n.total_keys,
                },
            )
        })
        .collect();

    let namespace_stats = query.ns.as_ref().and_then(|ns| {
        snapshot.namespaces.get(ns).map(|n| NamespaceStatsBody {
            cache_hits: n.cache_hits,
            cache_misses: n.cache_misses,
            total_keys: n.total_keys,
        })
    });

    Json(StatsResponse {
        total_keys: snapshot.total_keys,
        cache_hits: snapshot.cache_hits,
        cache_misses: snapshot.cache_misses,
        evictions: snapshot.evictions,
        log_size: snapshot.log_size,
        last_compaction: snapshot
            .last_compaction
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs_f64()),
        uptime_seconds: snapshot.uptime.as_secs_f64(),
        namespaces,
        namespace: query.ns.clone(),
        namespace_stats,
    })
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.store.stats().await;
    Json(HealthResponse {
        status: "healthy",
        store_size: snapshot.total_keys,
    })
}

pub async fn compact(State(state): State<AppState>) -> Result<Json<CompactResponse>, ApiError> {
    state.store.compact_now().await?;
    Ok(Json(CompactResponse {
        status: "compaction_started",
    }))
}

pub async fn performance(State(state): State<AppState>) -> Json<PerformanceResponse> {
    let snapshot = state.metrics.snapshot();
    let uptime_secs = state.metrics.uptime().as_secs_f64().max(0.001);
    Json(PerformanceResponse {
        operations_per_second: snapshot.requests_total as f64 / uptime_secs,
        avg_latency_ms: snapshot.latency.avg_ms(),
        p95_latency_ms: snapshot.latency.percentile_ms(0.95),
        p99_latency_ms: snapshot.latency.percentile_ms(0.99),
        error_rate: if snapshot.requests_total == 0 {
            0.0
        } else {
            snapshot.errors_total as f64 / snapshot.requests_total as f64
        },
        total_operations: snapshot.requests_total,
    })
}
