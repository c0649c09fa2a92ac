/// Constants module to avoid magic numbers and strings in the codebase

// Storage layout
pub const DEFAULT_STORAGE_NAMESPACE: &str = "chatbox";
pub const SESSIONS_KEY: &str = "chat_sessions";
pub const SESSION_META_KEY: &str = "chat_session_meta";
pub const ACTIVE_SESSION_KEY: &str = "active_session_id";
pub const IDENTITY_KEY: &str = "identity";

// Network Configuration
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000/api/chat";
pub const DEFAULT_API_KEY_ENV: &str = "CHATBOX_API_KEY";

// Timeouts
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 120;

// Chat notices shown as bot messages
pub const LOGIN_REQUIRED_NOTICE: &str = "🔒 Please log in to continue using the chatbot.";
pub const EXCHANGE_ERROR_NOTICE: &str = "Error talking to AI";

// Sessions
pub const SESSION_ID_PREFIX: &str = "session_";
pub const MESSAGE_TIME_FORMAT: &str = "%H:%M";
pub const EXPORT_EXTENSION: &str = "json";

// Models offered to the user. The exchange forwards any id unchanged.
pub const DEFAULT_MODEL: &str = "openai/gpt-3.5-turbo";
pub const SUPPORTED_MODELS: &[(&str, &str)] = &[
    ("openai/gpt-3.5-turbo", "GPT-3.5 Turbo"),
    ("openai/gpt-4", "GPT-4"),
    ("mistralai/mixtral-8x7b-instruct", "Mistral 7B"),
    ("anthropic/claude-3-haiku", "Claude 3 Haiku"),
];

/// Whether a model id is on the fixed menu
pub fn is_supported_model(model: &str) -> bool {
    SUPPORTED_MODELS.iter().any(|(id, _)| *id == model)
}
