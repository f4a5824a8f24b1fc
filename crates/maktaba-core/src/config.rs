//! Configuration module
//!
//! Environment-driven configuration for the API service: server, database,
//! upload storage, and file size limits.

use std::env;

const DEFAULT_SERVER_PORT: u16 = 3000;
const DEFAULT_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_BOOK_SIZE_BYTES: usize = 100 * 1024 * 1024; // 100 MB
const DEFAULT_MAX_VIDEO_SIZE_BYTES: usize = 2 * 1024 * 1024 * 1024; // 2 GB

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    server_port: u16,
    database_url: String,
    db_max_connections: u32,
    db_timeout_seconds: u64,
    cors_origins: Vec<String>,
    upload_dir: String,
    max_book_size_bytes: usize,
    max_video_size_bytes: usize,
    video_allowed_content_types: Vec<String>,
    environment: String,
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables (reads `.env` when present).
    ///
    /// Required: `DATABASE_URL`. Everything else has a default.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let video_allowed_content_types = env::var("VIDEO_ALLOWED_CONTENT_TYPES")
            .unwrap_or_else(|_| "video/mp4,video/webm,video/quicktime".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Config {
            server_port: env_parsed("SERVER_PORT", DEFAULT_SERVER_PORT),
            database_url,
            db_max_connections: env_parsed("DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS),
            db_timeout_seconds: env_parsed("DB_TIMEOUT_SECONDS", DEFAULT_CONNECTION_TIMEOUT_SECS),
            cors_origins,
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string()),
            max_book_size_bytes: env_parsed("MAX_BOOK_SIZE_BYTES", DEFAULT_MAX_BOOK_SIZE_BYTES),
            max_video_size_bytes: env_parsed("MAX_VIDEO_SIZE_BYTES", DEFAULT_MAX_VIDEO_SIZE_BYTES),
            video_allowed_content_types,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        })
    }

    /// Fail fast on misconfiguration.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.upload_dir.trim().is_empty() {
            anyhow::bail!("UPLOAD_DIR must not be empty");
        }
        if self.max_book_size_bytes == 0 || self.max_video_size_bytes == 0 {
            anyhow::bail!("file size limits must be positive");
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.to_lowercase().as_str(), "production" | "prod")
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.db_timeout_seconds
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    pub fn upload_dir(&self) -> &str {
        &self.upload_dir
    }

    pub fn max_book_size_bytes(&self) -> usize {
        self.max_book_size_bytes
    }

    pub fn max_video_size_bytes(&self) -> usize {
        self.max_video_size_bytes
    }

    pub fn video_allowed_content_types(&self) -> &[String] {
        &self.video_allowed_content_types
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Build a config directly (tests and embedded use).
    pub fn new(
        server_port: u16,
        database_url: String,
        upload_dir: String,
        max_book_size_bytes: usize,
        max_video_size_bytes: usize,
    ) -> Self {
        Config {
            server_port,
            database_url,
            db_max_connections: 5,
            db_timeout_seconds: DEFAULT_CONNECTION_TIMEOUT_SECS,
            cors_origins: vec!["*".to_string()],
            upload_dir,
            max_book_size_bytes,
            max_video_size_bytes,
            video_allowed_content_types: vec![
                "video/mp4".to_string(),
                "video/webm".to_string(),
                "video/quicktime".to_string(),
            ],
            environment: "test".to_string(),
        }
    }
}
