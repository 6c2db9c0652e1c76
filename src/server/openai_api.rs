//! OpenAI-compatible response synthesis.
//!
//! Implements the subset of the OpenAI API a provider client needs:
//! - POST /v1/chat/completions, POST /v1/completions
//! - GET /v1/models
//! - GET /health, GET /ready
//!
//! Replies are canned; only the model name is taken from the request.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::server::auth::{self, AuthError};
use crate::server::variability::{RandomVariability, Variability, CANNED_REPLIES};

/// `owned_by` value reported for the simulated model.
pub const OWNER: &str = "provider-sim";

/// Application state shared across handlers.
pub struct AppState {
    pub config: Arc<Config>,
    pub variability: Arc<dyn Variability>,
}

impl AppState {
    /// State with random token counts and replies.
    pub fn new(config: Arc<Config>) -> Self {
        Self::with_variability(config, Arc::new(RandomVariability))
    }

    pub fn with_variability(config: Arc<Config>, variability: Arc<dyn Variability>) -> Self {
        Self {
            config,
            variability,
        }
    }
}

// ─── Request/Response Types ────────────────────────────────────────────────

/// The only part of a completion request the simulator reads.
#[derive(Debug, Default, Deserialize)]
pub struct CompletionRequest {
    #[serde(default)]
    pub model: Option<String>,
}

/// Chat completion response (non-streaming).
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub model: String,
    pub choices: Vec<ChatChoice>,
    pub usage: Usage,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatChoice {
    pub index: usize,
    pub message: ChatMessage,
    pub finish_reason: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Model listing response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelList {
    pub object: String,
    pub data: Vec<ModelInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub owned_by: String,
    pub ready: bool,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
}

/// Error envelope returned on authentication failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(rename = "type")]
    pub r#type: String,
    pub code: String,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Model named in a completion body, or `fallback` when the body is absent,
/// malformed, or names no model.
pub fn requested_model(body: &[u8], fallback: &str) -> String {
    let req = match serde_json::from_slice::<CompletionRequest>(body) {
        Ok(req) => req,
        Err(e) => {
            if !body.is_empty() {
                debug!(error = %e, "Unparseable completion body, using default model");
            }
            CompletionRequest::default()
        }
    };

    match req.model {
        Some(model) if !model.is_empty() => model,
        _ => fallback.to_string(),
    }
}

/// Build a chat completion for `model`.
pub fn build_chat_completion(model: String, variability: &dyn Variability) -> ChatCompletionResponse {
    let prompt_tokens = variability.prompt_tokens();
    let completion_tokens = variability.completion_tokens();
    let content = CANNED_REPLIES[variability.reply_index(CANNED_REPLIES.len())];

    ChatCompletionResponse {
        id: format!("chatcmpl-{}", Uuid::new_v4()),
        object: "chat.completion".to_string(),
        created: unix_now(),
        model,
        choices: vec![ChatChoice {
            index: 0,
            message: ChatMessage {
                role: "assistant".to_string(),
                content: content.to_string(),
            },
            finish_reason: "stop".to_string(),
        }],
        usage: Usage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        },
    }
}

/// Build the single-entry model listing for `model`.
pub fn build_model_list(model: &str) -> ModelList {
    ModelList {
        object: "list".to_string(),
        data: vec![ModelInfo {
            id: model.to_string(),
            object: "model".to_string(),
            created: unix_now(),
            owned_by: OWNER.to_string(),
            ready: true,
        }],
    }
}

// ─── Route Handlers ────────────────────────────────────────────────────────

pub fn chat_completions(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Json<ChatCompletionResponse>, AuthError> {
    auth::validate(headers, &state.config.api_key)?;

    let model = requested_model(body, &state.config.model);
    let response = build_chat_completion(model, state.variability.as_ref());

    info!(
        request_id = response.id,
        model = response.model,
        total_tokens = response.usage.total_tokens,
        "Chat completion request"
    );

    Ok(Json(response))
}

pub fn list_models(state: &AppState, headers: &HeaderMap) -> Result<Json<ModelList>, AuthError> {
    auth::validate(headers, &state.config.api_key)?;
    Ok(Json(build_model_list(&state.config.model)))
}

pub fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}
