mod applications;
mod cache;
mod chat;
mod config;
mod db;
mod documents;
mod envelope;
mod errors;
mod intelligence;
mod llm_client;
mod models;
mod routes;
mod state;
mod storage;
#[cfg(test)]
mod test_support;
mod upload;
mod users;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::AnalysisCache;
use crate::config::{Config, S3Settings, StorageBackendKind};
use crate::db::create_pool;
use crate::intelligence::DocumentProcessor;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{DocumentStorage, LocalStorage, S3Storage};
use crate::upload::MULTIPART_OVERHEAD_BYTES;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Mortgage API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis-backed analysis cache
    let redis = redis::Client::open(config.redis_url.clone())?;
    let cache = AnalysisCache::connect(redis, config.analysis_cache_ttl_secs).await;

    // Initialize document storage
    let storage: Arc<dyn DocumentStorage> = match (&config.storage_backend, &config.s3) {
        (StorageBackendKind::S3, Some(s3)) => {
            let client = build_s3_client(s3).await;
            Arc::new(S3Storage::new(client, s3.bucket.clone()))
        }
        (StorageBackendKind::S3, None) => anyhow::bail!("STORAGE_BACKEND=s3 requires S3 settings"),
        (StorageBackendKind::Local, _) => Arc::new(
            LocalStorage::new(config.upload_dir.clone())
                .await
                .with_context(|| format!("cannot create upload dir {}", config.upload_dir.display()))?,
        ),
    };
    info!("Document storage initialized ({})", storage.backend_name());

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Initialize extraction chain
    let processor = DocumentProcessor::with_tesseract(&config.tesseract_lang);
    info!("Extraction tools: {:?}", processor.tool_status());

    let cors = build_cors(&config.cors_allowed_origins)?;
    let body_limit = config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    // Build app state
    let state = AppState {
        db,
        cache,
        storage,
        llm,
        config: config.clone(),
        processor,
    };

    // Build router
    let app = build_router(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Permissive when no origins are configured (local development).
fn build_cors(origins: &[String]) -> Result<CorsLayer> {
    if origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }
    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin '{o}'"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(settings: &S3Settings) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &settings.access_key_id,
        &settings.secret_access_key,
        None,
        None,
        "mortgage-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&settings.endpoint)
        .load()
        .await;

    // MinIO serves buckets by path, not virtual host
    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
