//! Peer Protocol Handlers
//!
//! Bridge between the axum router and the group read path. Peer reads map
//! lookup outcomes onto status codes: 400 for a malformed path, 404 for an
//! unknown group, 500 for a failed load, and the raw value bytes otherwise.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path};
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use sysinfo::System;

use super::pool::HttpPool;
use super::protocol::{DEFAULT_BASE_PATH, GroupStatus, NodeStatus};
use crate::group::registry::Registry;

/// Serves one peer read: `GET <base_path><group>/<key>`.
pub async fn handle_group_fetch(
    Extension(registry): Extension<Arc<Registry>>,
    Path((group_name, key)): Path<(String, String)>,
) -> Response {
    tracing::debug!(group = %group_name, key = %key, "serving peer read");

    let Some(group) = registry.get_group(&group_name) else {
        return (
            StatusCode::NOT_FOUND,
            format!("no such group {group_name}"),
        )
            .into_response();
    };

    match group.get(&key).await {
        Ok(view) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            view.to_vec(),
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")).into_response(),
    }
}

/// Fallback for everything the peer route does not match. A request under
/// the base path is a malformed peer read; anything else is simply not
/// served here.
pub async fn handle_unmatched(uri: Uri) -> Response {
    if uri.path().starts_with(DEFAULT_BASE_PATH) {
        (StatusCode::BAD_REQUEST, "bad request").into_response()
    } else {
        (StatusCode::NOT_FOUND, "not found").into_response()
    }
}

/// Reports this node's groups, peers and process figures.
pub async fn handle_status(
    Extension(registry): Extension<Arc<Registry>>,
    Extension(pool): Extension<Arc<HttpPool>>,
) -> Json<NodeStatus> {
    let groups = registry
        .groups()
        .iter()
        .map(|group| GroupStatus {
            name: group.name().to_owned(),
            entries: group.cache_entries(),
            used_bytes: group.cache_used_bytes(),
            cache_bytes: group.cache_bytes(),
        })
        .collect();

    let mut sys = System::new_all();
    sys.refresh_cpu();
    sys.refresh_memory();
    let cpu_usage = sys.global_cpu_info().cpu_usage();
    // sysinfo returns bytes for memory values.
    let mem_total_mb = sys.total_memory() / (1024 * 1024);
    let mem_used_mb = sys.used_memory() / (1024 * 1024);

    Json(NodeStatus {
        self_url: pool.self_url().to_owned(),
        peers: pool.peers(),
        groups,
        cpu_usage,
        mem_used_mb,
        mem_total_mb,
    })
}
