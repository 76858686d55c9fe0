//! Request and response bodies for the HTTP surface (spec §6).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SetRequest {
    pub key: String,
    pub value: String,
    pub ttl: Option<i64>,
    pub namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NamespaceQuery {
    pub ns: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SetResponse {
    pub status: &'static str,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GetResponse {
    pub key: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub status: &'static str,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListNamespacesResponse {
    pub namespaces: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct NamespaceSizeResponse {
    pub namespace: String,
    pub total_keys: usize,
}

#[derive(Debug, Serialize)]
pub struct ClearNamespaceResponse {
    pub status: &'static str,
    pub namespace: String,
    pub keys_deleted: usize,
}

#[derive(Debug, Serialize)]
pub struct NamespaceStatsBody {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub total_keys: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_keys: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub evictions: u64,
    pub log_size: u64,
    pub last_compaction: Option<f64>,
    pub uptime_seconds: f64,
    pub namespaces: HashMap<String, NamespaceStatsBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace_stats: Option<NamespaceStatsBody>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store_size: usize,
}

#[derive(Debug, Serialize)]
pub struct CompactResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PerformanceResponse {
    pub operations_per_second: f64,
    pub avg_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub p99_latency_ms: f64,
    pub error_rate: f64,
    pub total_operations: u64,
}
