//! Error types for the todo-chat client.

/// Top-level error type for the client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors raised by the backend REST client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The backend host could not be reached at all (connection refused, DNS,
    /// timeout). Carries the configured base URL for diagnostics.
    #[error("Cannot reach backend at {base_url}: {reason}")]
    Unreachable { base_url: String, reason: String },

    /// The backend answered with a non-success status.
    #[error("Backend returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Failed to decode backend response: {0}")]
    Decode(String),

    #[error("Failed to build request: {0}")]
    Request(String),
}

impl ApiError {
    /// HTTP status code, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is a network-level failure rather than a backend answer.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}

/// Session / authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Tool-call dispatch errors.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("No signed-in user and demo identity is disabled")]
    Unauthenticated,

    #[error("Tool {name} has invalid arguments: {reason}")]
    InvalidArguments { name: String, reason: String },

    #[error("Tool {name} failed: {source}")]
    Api {
        name: String,
        #[source]
        source: ApiError,
    },
}

/// Result type alias for the client.
pub type Result<T> = std::result::Result<T, Error>;
