use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use clap::Parser;
use tower_http::cors::CorsLayer;

use lms::auth::gate::{AccessGate, AdminAllowList};
use lms::auth::oidc::{IdentityProvider, OidcConfig, OidcIdentityProvider};
use lms::auth::session::SessionKeys;
use lms::config::AppConfig;
use lms::db::connection::MongoConnection;
use lms::db::repository::{MongoDocumentRepository, MongoVideoRepository};
use lms::faq::FaqEngine;
use lms::notify::{BrevoNotifier, DisabledNotifier, Notifier};
use lms::state::AppState;
use lms::storage::client::S3MediaStore;

#[derive(Debug, Parser)]
#[command(name = "lms", about = "Learning content portal server")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, env = "LMS_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen address from the configuration.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lms=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let bind = cli.bind.unwrap_or_else(|| config.server.bind.clone());

    tracing::info!("Starting LMS server...");

    let state = build_state(&config).await?;
    let mut app = lms::app::router(state);

    let origins = config.server.cors_origin_list();
    if !origins.is_empty() {
        let origins = origins
            .iter()
            .map(|o| HeaderValue::from_str(o))
            .collect::<Result<Vec<_>, _>>()
            .context("Invalid CORS origin")?;
        app = app.layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .allow_credentials(true),
        );
    }

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    tracing::info!("Listening on http://{}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    // Connects on first use; a database outage must not stop the server from starting.
    let connection = Arc::new(MongoConnection::new(
        config.database.uri.clone(),
        config.database.name.clone(),
        config.database.connect_timeout(),
    ));

    let media_store = S3MediaStore::from_config(&config.storage).await?;
    tracing::info!(bucket = %config.storage.bucket, "Media store initialized");

    let notifier: Arc<dyn Notifier> = if config.notify.enabled {
        Arc::new(BrevoNotifier::new(&config.notify)?)
    } else {
        tracing::info!("Sign-in notifications disabled");
        Arc::new(DisabledNotifier)
    };

    let identity_provider: Option<Arc<dyn IdentityProvider>> =
        match OidcConfig::from_auth_config(&config.auth) {
            Some(oidc) => {
                let provider = OidcIdentityProvider::discover(&oidc).await?;
                tracing::info!(issuer = %oidc.issuer_url, "OIDC provider discovered");
                Some(Arc::new(provider))
            }
            None => {
                tracing::warn!("OIDC not configured, sign-in is disabled");
                None
            }
        };

    let allow_list = AdminAllowList::parse(&config.auth.admin_emails);
    if allow_list.is_empty() {
        tracing::warn!("Admin allow-list is empty, nobody can sign in");
    } else {
        tracing::info!(admins = allow_list.len(), "Admin allow-list loaded");
    }

    let faq = match &config.faq.script_path {
        Some(path) => FaqEngine::from_path(path.as_ref())?,
        None => FaqEngine::builtin()?,
    };

    Ok(AppState {
        document_repo: Arc::new(MongoDocumentRepository::new(connection.clone())),
        video_repo: Arc::new(MongoVideoRepository::new(connection)),
        media_store: Arc::new(media_store),
        notifier,
        identity_provider,
        gate: Arc::new(AccessGate::new(allow_list)),
        sessions: Arc::new(SessionKeys::new(
            &config.auth.session_secret,
            config.auth.session_ttl_secs,
        )),
        faq: Arc::new(faq),
        secure_cookies: config.server.secure_cookies,
        max_upload_bytes: config.server.max_upload_bytes,
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    tracing::info!("Shutdown signal received");
}
