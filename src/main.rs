use anyhow::{Result, anyhow};
use axum::extract::{Extension, Query};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Router, routing::get};
use peercache::group::loader::FnLoader;
use peercache::group::registry::{self, Registry};
use peercache::group::service::Group;
use peercache::http::handlers;
use peercache::http::pool::HttpPool;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;

/// Stand-in for a slow backing store, identical on every node.
const SCORES: &[(&str, &str)] = &[("Tom", "630"), ("Jack", "589"), ("Sam", "567")];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} --listen <url> [--peer <url>]... [--api <addr>]", args[0]);
        eprintln!("Example: {} --listen http://127.0.0.1:8001", args[0]);
        eprintln!(
            "Example: {} --listen http://127.0.0.1:8002 --peer http://127.0.0.1:8001 --peer http://127.0.0.1:8002 --api 127.0.0.1:9999",
            args[0]
        );

        std::process::exit(1);
    }

    let mut listen_url: Option<String> = None;
    let mut peer_urls: Vec<String> = vec![];
    let mut api_addr: Option<SocketAddr> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--listen" => {
                listen_url = Some(args[i + 1].clone());
                i += 2;
            }
            "--peer" => {
                peer_urls.push(args[i + 1].clone());
                i += 2;
            }
            "--api" => {
                api_addr = Some(args[i + 1].parse()?);
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    let listen_url = listen_url.expect("--listen is required");
    if peer_urls.is_empty() {
        peer_urls.push(listen_url.clone());
    }

    tracing::info!("Starting cache node at {}", listen_url);
    tracing::info!("Cluster peers: {:?}", peer_urls);

    // 1. The demonstration group over the static scores table:
    let cache_bytes = std::env::var("CACHE_BYTES")
        .ok()
        .and_then(|value| value.parse::<i64>().ok())
        .unwrap_or(2 << 10);

    let group = registry::add_group(
        "scores",
        cache_bytes,
        Arc::new(FnLoader(|key: &str| {
            tracing::info!("slow datastore lookup for {}", key);
            SCORES
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_bytes().to_vec())
                .ok_or_else(|| anyhow!("{key} not found"))
        })),
    );

    // 2. Peer pool wiring:
    let pool = Arc::new(HttpPool::new(&listen_url, Registry::global()));
    pool.set_peers(&peer_urls)?;
    group.register_peers(pool.clone());

    // 3. Optional front-end API server:
    if let Some(api_addr) = api_addr {
        let api_group = group.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_api(api_addr, api_group).await {
                tracing::error!("API server failed: {}", e);
            }
        });
    }

    // 4. The cache server itself:
    let app = pool
        .router()
        .route("/status", get(handlers::handle_status))
        .layer(Extension(Registry::global()))
        .layer(Extension(pool.clone()));

    let bind_addr = bind_addr_of(&listen_url)?;
    tracing::info!("Cache server listening on {}", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Extracts `host:port` from the node's public base URL.
fn bind_addr_of(listen_url: &str) -> Result<String> {
    let url = reqwest::Url::parse(listen_url)?;
    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("--listen url {listen_url} has no host"))?;
    let port = url
        .port()
        .ok_or_else(|| anyhow!("--listen url {listen_url} has no port"))?;
    Ok(format!("{host}:{port}"))
}

async fn serve_api(addr: SocketAddr, group: Arc<Group>) -> Result<()> {
    let app = Router::new()
        .route("/api", get(handle_api_get))
        .layer(Extension(group));

    tracing::info!("API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Deserialize)]
struct ApiParams {
    key: String,
}

async fn handle_api_get(
    Extension(group): Extension<Arc<Group>>,
    Query(params): Query<ApiParams>,
) -> Response {
    match group.get(&params.key).await {
        Ok(view) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            view.to_vec(),
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")).into_response(),
    }
}
