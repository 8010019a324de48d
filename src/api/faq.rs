use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::faq::engine::{FaqEngine, Reply};
use crate::faq::keywords::{keyword_reply, KeywordReply};
use crate::faq::script::FaqScript;
use crate::faq::FaqError;
use crate::state::AppState;

impl From<FaqError> for AppError {
    fn from(err: FaqError) -> Self {
        match err {
            FaqError::InvalidScript(msg) => AppError::Config(msg),
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

/// One interpreter step. Without `state` the conversation starts over.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepRequest {
    #[serde(default)]
    pub state: Option<String>,
    /// Target state of the selected option.
    #[serde(default)]
    pub choice: Option<String>,
    /// Free text for an input state.
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatbotRequest {
    pub message: String,
}

pub fn process_step(engine: &FaqEngine, request: StepRequest) -> Result<Reply, AppError> {
    let reply = match (request.state.as_deref(), request.choice, request.text) {
        (None, _, _) => engine.start()?,
        (Some(current), Some(choice), None) => engine.choose(current, &choice)?,
        (Some(current), None, Some(text)) => engine.submit(current, &text)?,
        _ => {
            return Err(AppError::BadRequest(
                "Provide either a choice or text".into(),
            ))
        }
    };
    Ok(reply)
}

/// `GET /api/faq`
pub async fn faq_script_handler(State(state): State<AppState>) -> Json<FaqScript> {
    Json(state.faq.script().clone())
}

/// `POST /api/faq/step`
pub async fn faq_step_handler(
    State(state): State<AppState>,
    Json(request): Json<StepRequest>,
) -> Result<Json<Reply>, AppError> {
    Ok(Json(process_step(&state.faq, request)?))
}

/// `POST /api/chatbot`
pub async fn chatbot_handler(Json(request): Json<ChatbotRequest>) -> Json<KeywordReply> {
    Json(keyword_reply(&request.message))
}
