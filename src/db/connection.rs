use std::time::Duration;

use mongodb::bson::doc;
use mongodb::error::ErrorKind;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use tokio::sync::OnceCell;

use crate::error::AppError;

/// Process-wide MongoDB handle, created on first use.
///
/// Concurrent first callers wait on the same initialisation; a failed attempt
/// leaves the cell empty so a later request can try again. Nothing else is
/// retried.
pub struct MongoConnection {
    uri: String,
    database_name: String,
    connect_timeout: Duration,
    database: OnceCell<Database>,
}

impl MongoConnection {
    pub fn new(uri: impl Into<String>, database_name: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            uri: uri.into(),
            database_name: database_name.into(),
            connect_timeout,
            database: OnceCell::new(),
        }
    }

    /// Wrap an already connected database (tests, tooling).
    pub fn from_database(database: Database) -> Self {
        Self {
            uri: String::new(),
            database_name: database.name().to_string(),
            connect_timeout: Duration::ZERO,
            database: OnceCell::new_with(Some(database)),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.database.initialized()
    }

    /// The shared database handle, connecting if this is the first call.
    pub async fn database(&self) -> Result<&Database, AppError> {
        self.database.get_or_try_init(|| self.connect()).await
    }

    async fn connect(&self) -> Result<Database, AppError> {
        let mut options = ClientOptions::parse(&self.uri)
            .await
            .map_err(|e| AppError::Unavailable(format!("Invalid MongoDB URI: {e}")))?;
        options.server_selection_timeout = Some(self.connect_timeout);
        options.app_name = Some("lms".to_string());

        let client = Client::with_options(options)
            .map_err(|e| AppError::Unavailable(e.to_string()))?;
        let database = client.database(&self.database_name);

        // The driver connects lazily; ping so a dead server fails here and not
        // halfway through the first query.
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| {
                tracing::error!("MongoDB connection error: {e}");
                AppError::Unavailable(e.to_string())
            })?;

        tracing::info!(database = %self.database_name, "MongoDB connected successfully");
        Ok(database)
    }
}

/// Map a driver error, separating "cannot reach the server" from other failures.
pub(crate) fn map_mongo_error(err: mongodb::error::Error) -> AppError {
    match err.kind.as_ref() {
        ErrorKind::ServerSelection { .. } => AppError::Unavailable(err.to_string()),
        _ => AppError::Database(err.to_string()),
    }
}
