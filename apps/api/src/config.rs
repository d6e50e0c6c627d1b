use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Which backend holds uploaded PDF artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactBackend {
    Filesystem,
    S3,
    Memory,
}

/// S3 / MinIO settings, required only when `ARTIFACT_BACKEND=s3`.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub redis_url: String,
    pub anthropic_api_key: String,
    pub artifact_backend: ArtifactBackend,
    pub upload_dir: PathBuf,
    pub s3: Option<S3Settings>,
    pub max_upload_bytes: usize,
    pub site_output_dir: PathBuf,
    pub public_base_url: String,
    pub parse_min_text_chars: usize,
    /// Terminal jobs older than this are evicted. `None` disables the sweeper.
    pub job_ttl: Option<Duration>,
    pub job_sweep_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let artifact_backend = match optional_env("ARTIFACT_BACKEND")
            .unwrap_or_else(|| "fs".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "fs" | "filesystem" => ArtifactBackend::Filesystem,
            "s3" => ArtifactBackend::S3,
            "memory" => ArtifactBackend::Memory,
            other => bail!("ARTIFACT_BACKEND must be one of fs, s3, memory (got '{other}')"),
        };

        let s3 = if artifact_backend == ArtifactBackend::S3 {
            Some(S3Settings {
                bucket: require_env("S3_BUCKET")?,
                endpoint: require_env("S3_ENDPOINT")?,
                access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            })
        } else {
            None
        };

        let job_ttl_secs: u64 = parse_env("JOB_TTL_SECS", 86_400)?;

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            redis_url: require_env("REDIS_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            artifact_backend,
            upload_dir: optional_env("UPLOAD_DIR")
                .unwrap_or_else(|| "uploads".to_string())
                .into(),
            s3,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            site_output_dir: optional_env("SITE_OUTPUT_DIR")
                .unwrap_or_else(|| "generated_websites".to_string())
                .into(),
            public_base_url: optional_env("PUBLIC_BASE_URL")
                .unwrap_or_else(|| "http://localhost:8080".to_string())
                .trim_end_matches('/')
                .to_string(),
            parse_min_text_chars: parse_env("PARSE_MIN_TEXT_CHARS", 50)?,
            job_ttl: (job_ttl_secs > 0).then(|| Duration::from_secs(job_ttl_secs)),
            job_sweep_interval: Duration::from_secs(parse_env("JOB_SWEEP_INTERVAL_SECS", 300)?),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number (got '{raw}')")),
        None => Ok(default),
    }
}
