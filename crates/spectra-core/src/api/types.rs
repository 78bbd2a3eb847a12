//! Wire types for the Spectra backend's `/api` endpoints.

use serde::{Deserialize, Serialize};

/// Conversation role as the backend understands it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One prior turn of the conversation, reduced to what the backend needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

/// Body of `POST /chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<HistoryEntry>,
}

/// Reply envelope of `POST /chat`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub error: Option<String>,
    pub model_used: Option<String>,
    pub status: Option<String>,
    pub timestamp: Option<String>,
}

impl ChatResponse {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            error: None,
            model_used: None,
            status: None,
            timestamp: None,
        }
    }
}

/// Payload of `GET /status`. Only reachability matters to the UI, so every
/// field is optional on decode.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiStatus {
    #[serde(default)]
    pub status: String,
    pub ai_provider: Option<String>,
    pub personality_loaded: Option<bool>,
    pub ollama_status: Option<String>,
    pub model: Option<String>,
    #[serde(default)]
    pub available_models: Vec<String>,
}

/// Payload of `GET /health`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: Option<String>,
    pub timestamp: Option<String>,
}

/// Payload of `GET /models`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelList {
    pub current: String,
    #[serde(default)]
    pub available: Vec<String>,
    pub preferred: Option<String>,
    pub timestamp: Option<String>,
}

/// Body of `POST /models/select`
#[derive(Debug, Clone, Serialize)]
pub struct ModelSelectRequest {
    pub model: String,
}

/// Payload of `POST /models/select`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelSelection {
    pub status: String,
    pub selected: String,
    pub previous: String,
    #[serde(default)]
    pub available: Vec<String>,
    #[serde(default)]
    pub message: String,
    pub timestamp: Option<String>,
}
