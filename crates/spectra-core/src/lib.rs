pub mod api;
pub mod config;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use api::{ApiClient, ApiStatus, ChatBackend, ChatResponse, HistoryEntry, Role, TransportError};
pub use config::Config;
pub use session::{Phase, Session};
pub use state::{Connectivity, Message, MessageId, MessageStore, Sender, HISTORY_WINDOW};
