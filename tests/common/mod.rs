#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::minio::MinIO;
use testcontainers_modules::mongo::Mongo;

use lms::auth::gate::{AccessGate, AdminAllowList};
use lms::auth::models::VerifiedIdentity;
use lms::auth::oidc::{AuthorizationRequest, IdentityProvider};
use lms::auth::session::SessionKeys;
use lms::db::connection::MongoConnection;
use lms::db::repository::{
    DocumentRepository, MongoDocumentRepository, MongoVideoRepository, VideoRepository,
};
use lms::error::AppError;
use lms::faq::FaqEngine;
use lms::notify::Notifier;
use lms::state::AppState;
use lms::storage::client::{MediaStore, S3MediaStore};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const SESSION_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const BUCKET: &str = "lms-test";

/// Stands in for the OIDC provider: authorizes everything and reports `email`.
pub struct FakeIdentityProvider {
    pub email: String,
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    fn authorization_request(&self) -> AuthorizationRequest {
        AuthorizationRequest {
            url: "https://idp.example.com/authorize?state=csrf-1".to_string(),
            csrf_state: "csrf-1".to_string(),
            nonce: "nonce-1".to_string(),
        }
    }

    async fn exchange_code(&self, code: &str, nonce: &str) -> Result<VerifiedIdentity, AppError> {
        if code != "good-code" || nonce != "nonce-1" {
            return Err(AppError::Auth("Failed to exchange code".into()));
        }
        Ok(VerifiedIdentity {
            email: self.email.clone(),
            name: Some("Test Admin".to_string()),
        })
    }
}

/// Records recipients instead of sending mail.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_sign_in(&self, to: &str, _name: Option<String>) -> Result<String, AppError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(to.to_string());
        Ok(format!("msg-{}", sent.len()))
    }
}

fn unused_s3_client() -> aws_sdk_s3::Client {
    let config = aws_sdk_s3::Config::builder()
        .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
        .region(aws_sdk_s3::config::Region::new("us-east-1"))
        .build();
    aws_sdk_s3::Client::from_conf(config)
}

/// Assemble an `AppState` around the given collaborators.
pub fn build_state(
    connection: Arc<MongoConnection>,
    media_store: Arc<dyn MediaStore>,
    notifier: Arc<RecordingNotifier>,
    sign_in_email: &str,
) -> AppState {
    AppState {
        document_repo: Arc::new(MongoDocumentRepository::new(connection.clone())),
        video_repo: Arc::new(MongoVideoRepository::new(connection)),
        media_store,
        notifier,
        identity_provider: Some(Arc::new(FakeIdentityProvider {
            email: sign_in_email.to_string(),
        })),
        gate: Arc::new(AccessGate::new(AdminAllowList::parse(&format!(
            " {ADMIN_EMAIL} , second@example.com,"
        )))),
        sessions: Arc::new(SessionKeys::new(SESSION_SECRET, 3600)),
        faq: Arc::new(FaqEngine::builtin().expect("builtin FAQ script")),
        secure_cookies: false,
        max_upload_bytes: 1024 * 1024,
    }
}

/// A state whose database is unreachable. Nothing here needs Docker.
pub fn offline_state(sign_in_email: &str) -> (AppState, Arc<RecordingNotifier>) {
    let connection = Arc::new(MongoConnection::new(
        "mongodb://127.0.0.1:1/?directConnection=true",
        "lms_offline",
        Duration::from_millis(200),
    ));
    let media_store = Arc::new(S3MediaStore::new(
        unused_s3_client(),
        BUCKET.to_string(),
        "http://127.0.0.1:1/lms-test".to_string(),
        "lms-notes".to_string(),
    ));
    let notifier = Arc::new(RecordingNotifier::default());
    let state = build_state(connection, media_store, notifier.clone(), sign_in_email);
    (state, notifier)
}

pub fn admin_token(state: &AppState) -> String {
    state.sessions.issue(ADMIN_EMAIL).expect("issue session")
}

/// A session for an email that is not (or no longer) on the allow-list.
pub fn outsider_token(state: &AppState) -> String {
    state
        .sessions
        .issue("outsider@example.com")
        .expect("issue session")
}

pub fn server(router: Router) -> axum_test::TestServer {
    axum_test::TestServer::builder()
        .save_cookies()
        .expect_success_by_default()
        .try_build(router)
        .expect("Failed to build TestServer")
}

/// A `TestServer` that does NOT expect success by default (for error tests).
pub fn server_permissive(router: Router) -> axum_test::TestServer {
    axum_test::TestServer::builder()
        .save_cookies()
        .try_build(router)
        .expect("Failed to build TestServer")
}

/// Holds running containers and the router wired to them.
///
/// Containers are kept alive for as long as this struct lives.
pub struct TestEnv {
    _mongo: ContainerAsync<Mongo>,
    _minio: ContainerAsync<MinIO>,
    pub state: AppState,
    pub router: Router,
    pub documents: Arc<dyn DocumentRepository>,
    pub videos: Arc<dyn VideoRepository>,
    pub s3: aws_sdk_s3::Client,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestEnv {
    /// Spin up MongoDB and MinIO and build a router wired to real services.
    pub async fn start() -> Self {
        let (mongo_container, minio_container) =
            tokio::join!(Mongo::default().start(), MinIO::default().start());
        let mongo_container = mongo_container.expect("Failed to start MongoDB container");
        let minio_container = minio_container.expect("Failed to start MinIO container");

        // --- MongoDB ---
        let mongo_port = mongo_container
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get MongoDB port");
        let mongo_uri = format!("mongodb://127.0.0.1:{}", mongo_port);
        let mongo_client = mongodb::Client::with_uri_str(&mongo_uri)
            .await
            .expect("Failed to connect to MongoDB");
        let connection = Arc::new(MongoConnection::from_database(
            mongo_client.database("lms_test"),
        ));

        // --- MinIO (S3) ---
        let minio_port = minio_container
            .get_host_port_ipv4(9000)
            .await
            .expect("Failed to get MinIO port");
        let minio_endpoint = format!("http://127.0.0.1:{}", minio_port);

        let credentials =
            aws_sdk_s3::config::Credentials::new("minioadmin", "minioadmin", None, None, "test");
        let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .endpoint_url(&minio_endpoint)
            .region(aws_config::Region::new("us-east-1"))
            .credentials_provider(credentials)
            .load()
            .await;
        let s3 = aws_sdk_s3::Client::from_conf(
            aws_sdk_s3::config::Builder::from(&s3_config)
                .force_path_style(true)
                .build(),
        );

        s3.create_bucket()
            .bucket(BUCKET)
            .send()
            .await
            .expect("Failed to create test bucket");

        let media_store = Arc::new(S3MediaStore::new(
            s3.clone(),
            BUCKET.to_string(),
            format!("{minio_endpoint}/{BUCKET}"),
            "lms-notes".to_string(),
        ));

        let notifier = Arc::new(RecordingNotifier::default());
        let state = build_state(connection, media_store, notifier.clone(), ADMIN_EMAIL);
        let router = lms::app::router(state.clone());

        Self {
            _mongo: mongo_container,
            _minio: minio_container,
            documents: state.document_repo.clone(),
            videos: state.video_repo.clone(),
            state,
            router,
            s3,
            notifier,
        }
    }

    pub fn server(&self) -> axum_test::TestServer {
        server(self.router.clone())
    }

    pub fn server_permissive(&self) -> axum_test::TestServer {
        server_permissive(self.router.clone())
    }

    pub fn admin_token(&self) -> String {
        admin_token(&self.state)
    }

    /// Whether an object exists in the test bucket.
    pub async fn object_exists(&self, key: &str) -> bool {
        self.s3
            .head_object()
            .bucket(BUCKET)
            .key(key)
            .send()
            .await
            .is_ok()
    }
}
