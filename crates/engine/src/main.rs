//! State DB Engine - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{HeaderName, AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use statedb_engine::api::{self, auth::API_KEY_HEADER};
use statedb_engine::app::{App, Repositories};
use statedb_engine::infrastructure::{
    config::{AppConfig, CorsOrigins},
    postgres::{self, AgeGraph, PostgresRepositories},
    proxy::{GmClient, ProxyClient, ReqwestTransport, RuleEngineClient},
    random::SystemRandom,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the engine is usually run from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "statedb_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting State DB Engine");

    let config = AppConfig::load()?;
    tracing::info!(env = %config.app_env, "Configuration loaded");

    // Connect to PostgreSQL (AGE is loaded on every pooled connection)
    tracing::info!(
        host = %config.db_host,
        port = config.db_port,
        database = %config.db_name,
        "Connecting to PostgreSQL"
    );
    let pool = postgres::connect(&config).await?;
    let graph = AgeGraph::new(config.age_graph_name.clone());

    // Ensure tables, functions and the graph exist
    postgres::ensure_schema(&pool, &graph).await?;

    let repos = PostgresRepositories::new(pool, graph);

    // Peer services share one retrying client
    let retry_config = config.proxy_retry_policy();
    tracing::info!(
        "Proxy configured with retry: max_attempts={}, base_delay_ms={}, timeout_s={}",
        retry_config.max_attempts,
        retry_config.base_delay_ms,
        config.proxy_timeout
    );
    let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(
        config.proxy_timeout,
    )));
    let proxy = Arc::new(ProxyClient::new(transport, retry_config));
    let rule_engine = Arc::new(RuleEngineClient::new(
        proxy.clone(),
        &config.rule_engine_url,
    ));
    let gm = Arc::new(GmClient::new(proxy, &config.gm_url));

    if config.require_api_key {
        tracing::info!("API key required on /state routes");
    }

    // Create application
    let app = Arc::new(App::new(
        Repositories::from(repos),
        rule_engine,
        gm,
        Arc::new(SystemRandom::new()),
        config.require_api_key,
    ));

    let mut router = api::router(app).layer(TraceLayer::new_for_http());

    if let Some(cors) = config.cors_origins().and_then(build_cors_layer) {
        router = router.layer(cors);
    }

    // Start server
    let addr: SocketAddr = config.listen_addr().parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

fn build_cors_layer(allowed: CorsOrigins) -> Option<CorsLayer> {
    let mut cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        // API key, bearer token passthrough and JSON bodies all trigger preflights.
        .allow_headers([
            HeaderName::from_static(API_KEY_HEADER),
            AUTHORIZATION,
            CONTENT_TYPE,
        ]);

    match allowed {
        CorsOrigins::Any => cors = cors.allow_origin(Any),
        CorsOrigins::List(list) => {
            let origins: Vec<HeaderValue> = list
                .iter()
                .filter_map(|s| HeaderValue::from_str(s).ok())
                .collect();
            if origins.is_empty() {
                tracing::warn!("CORS_ALLOWED_ORIGINS has no valid origin; CORS disabled");
                return None;
            }
            cors = cors.allow_origin(origins);
        }
    }

    Some(cors)
}
