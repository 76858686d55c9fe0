//! # nskv-client
//!
//! A lightweight, async HTTP client for the namespaced key-value store
//! service, built on a pooled `reqwest::Client`.

mod client;

pub use client::{
    ClearNamespaceResponse, ClientError, ClientResult, HealthResponse, KVClient,
    ListNamespacesResponse, NamespaceSizeResponse, NamespaceStats, PerformanceResponse,
    StatsResponse,
};
