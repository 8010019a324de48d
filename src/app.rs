use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::api::{documents, faq, videos};
use crate::auth;
use crate::state::AppState;

/// Build the HTTP router. CORS is layered on by the binary, which knows the
/// configured origins.
pub fn router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        // Content API
        .route(
            "/api/documents",
            get(documents::list_documents_handler)
                .post(documents::create_document_handler)
                .layer(upload_limit),
        )
        .route(
            "/api/documents/{id}",
            get(documents::get_document_handler)
                .put(documents::update_document_handler)
                .delete(documents::delete_document_handler),
        )
        .route(
            "/api/videos",
            get(videos::list_videos_handler).post(videos::create_video_handler),
        )
        .route(
            "/api/videos/{id}",
            get(videos::get_video_handler)
                .put(videos::update_video_handler)
                .delete(videos::delete_video_handler),
        )
        // Sign-in
        .route("/api/auth/login", get(auth::login_handler))
        .route("/api/auth/callback", get(auth::callback_handler))
        .route("/api/auth/me", get(auth::me_handler))
        .route("/api/auth/logout", post(auth::logout_handler))
        .route("/api/auth/notify", post(auth::notify_handler))
        .route("/auth/error", get(auth::auth_error_handler))
        // FAQ
        .route("/api/faq", get(faq::faq_script_handler))
        .route("/api/faq/step", post(faq::faq_step_handler))
        .route("/api/chatbot", post(faq::chatbot_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
