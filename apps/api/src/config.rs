use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Where uploaded documents are kept.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackendKind {
    Local,
    S3,
}

/// S3 / MinIO settings, only required when `STORAGE_BACKEND=s3`.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub storage_backend: StorageBackendKind,
    pub upload_dir: PathBuf,
    pub s3: Option<S3Settings>,
    pub max_upload_bytes: usize,
    pub cors_allowed_origins: Vec<String>,
    pub tesseract_lang: String,
    pub enable_llm_document_review: bool,
    pub analysis_cache_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let storage_backend = match optional_env("STORAGE_BACKEND", "local").as_str() {
            "local" => StorageBackendKind::Local,
            "s3" => StorageBackendKind::S3,
            other => bail!("STORAGE_BACKEND must be 'local' or 's3', got '{other}'"),
        };

        let s3 = if storage_backend == StorageBackendKind::S3 {
            Some(S3Settings {
                bucket: require_env("S3_BUCKET")?,
                endpoint: require_env("S3_ENDPOINT")?,
                access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            })
        } else {
            None
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: optional_env("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG", "info"),
            storage_backend,
            upload_dir: PathBuf::from(optional_env("UPLOAD_DIR", "./uploads")),
            s3,
            max_upload_bytes: optional_env("MAX_UPLOAD_BYTES", "10485760")
                .parse::<usize>()
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            cors_allowed_origins: parse_origins(&optional_env("CORS_ALLOWED_ORIGINS", "")),
            tesseract_lang: optional_env("TESSERACT_LANG", "eng"),
            enable_llm_document_review: parse_bool(&optional_env(
                "ENABLE_LLM_DOCUMENT_REVIEW",
                "true",
            ))
            .context("ENABLE_LLM_DOCUMENT_REVIEW must be true or false")?,
            analysis_cache_ttl_secs: optional_env("ANALYSIS_CACHE_TTL_SECS", "86400")
                .parse::<u64>()
                .context("ANALYSIS_CACHE_TTL_SECS must be a number of seconds")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("not a boolean: '{other}'"),
    }
}
