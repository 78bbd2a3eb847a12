pub mod client;
pub mod error;
pub mod types;

pub use client::{ApiClient, ChatBackend, DEFAULT_API_URL, DEFAULT_TIMEOUT};
pub use error::TransportError;
pub use types::{
    ApiStatus, ChatRequest, ChatResponse, HealthStatus, HistoryEntry, ModelList, ModelSelectRequest,
    ModelSelection, Role,
};
