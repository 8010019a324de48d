use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::AppError;

/// Environment variables prefixed with `LMS` override file values,
/// e.g. `LMS__DATABASE__URI` or `LMS__AUTH__ADMIN_EMAILS`.
const ENV_PREFIX: &str = "LMS";

/// Top-level configuration, assembled from defaults, an optional TOML file
/// and the environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub faq: FaqConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind: String,
    /// Comma-separated list of origins allowed by CORS. Empty means same-origin only.
    pub cors_origins: String,
    /// Largest accepted document upload, in bytes.
    pub max_upload_bytes: usize,
    /// Set the `Secure` attribute on session cookies.
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
            cors_origins: String::new(),
            max_upload_bytes: 25 * 1024 * 1024,
            secure_cookies: false,
        }
    }
}

impl ServerConfig {
    pub fn cors_origin_list(&self) -> Vec<String> {
        split_list(&self.cors_origins)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub uri: String,
    pub name: String,
    /// Server selection timeout for the lazily created connection.
    pub connect_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            name: "lms".to_string(),
            connect_timeout_ms: 5_000,
        }
    }
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    /// Custom S3 endpoint (MinIO, LocalStack, R2, ...).
    pub endpoint: Option<String>,
    /// Base URL under which uploaded objects are publicly reachable.
    pub public_base_url: String,
    /// Key prefix for uploaded documents.
    pub key_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: "us-east-1".to_string(),
            endpoint: None,
            public_base_url: String::new(),
            key_prefix: "lms-notes".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub oidc_issuer_url: Option<String>,
    pub oidc_client_id: Option<String>,
    pub oidc_client_secret: Option<String>,
    pub oidc_redirect_uri: Option<String>,
    /// HMAC secret used to sign session cookies.
    pub session_secret: String,
    pub session_ttl_secs: i64,
    /// Comma-separated admin allow-list.
    pub admin_emails: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            oidc_issuer_url: None,
            oidc_client_id: None,
            oidc_client_secret: None,
            oidc_redirect_uri: None,
            session_secret: String::new(),
            session_ttl_secs: 30 * 24 * 60 * 60,
            admin_emails: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub enabled: bool,
    pub api_url: String,
    pub api_key: Option<String>,
    pub sender_name: String,
    pub sender_email: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: "https://api.brevo.com/v3/smtp/email".to_string(),
            api_key: None,
            sender_name: "SeerBharat LMS".to_string(),
            sender_email: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FaqConfig {
    /// Optional YAML file replacing the built-in dialogue graph.
    pub script_path: Option<String>,
}

impl AppConfig {
    /// Load configuration: defaults, then `path` (if given), then `LMS__*` env vars.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        );
        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, AppError> {
        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the server cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.auth.session_secret.len() < 32 {
            return Err(AppError::Config(
                "auth.session_secret must be at least 32 characters".into(),
            ));
        }
        if self.storage.bucket.is_empty() {
            return Err(AppError::Config("storage.bucket is required".into()));
        }
        if url::Url::parse(&self.storage.public_base_url).is_err() {
            return Err(AppError::Config(
                "storage.public_base_url must be an absolute URL".into(),
            ));
        }

        let oidc = [
            &self.auth.oidc_issuer_url,
            &self.auth.oidc_client_id,
            &self.auth.oidc_client_secret,
            &self.auth.oidc_redirect_uri,
        ];
        let configured = oidc.iter().filter(|v| v.is_some()).count();
        if configured != 0 && configured != oidc.len() {
            return Err(AppError::Config(
                "auth.oidc_* settings must be provided together".into(),
            ));
        }

        if self.notify.enabled
            && (self.notify.api_key.is_none() || self.notify.sender_email.is_empty())
        {
            return Err(AppError::Config(
                "notify.api_key and notify.sender_email are required when notify.enabled".into(),
            ));
        }

        Ok(())
    }

    pub fn oidc_enabled(&self) -> bool {
        self.auth.oidc_issuer_url.is_some()
    }
}

/// Split a comma-separated value, trimming entries and dropping empty ones.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
