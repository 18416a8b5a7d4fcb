use thiserror::Error;

/// Startup failures. Any of these aborts construction and the server never
/// serves a request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required credential resolved to nothing (flag unset, env var unset or blank)
    #[error("missing required credential {name}: pass it explicitly or set the {name} environment variable")]
    MissingCredential { name: &'static str },
    /// Credential contains bytes that cannot travel in an HTTP header
    #[error("credential {name} is not a valid HTTP header value")]
    InvalidCredential { name: &'static str },
    /// The configured API base URL does not parse
    #[error("invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Failures a dispatch hands back to its caller instead of folding into a
/// result envelope. These are protocol or programming errors, not marketplace
/// rejections.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),
    #[error("invalid arguments for '{operation}': {message}")]
    InvalidArguments { operation: String, message: String },
    #[error("request for '{operation}' could not be issued: {message}")]
    Transport { operation: String, message: String },
}

impl DispatchError {
    pub fn invalid_arguments(operation: &str, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    /// Machine-readable code, see [`codes`].
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::UnknownOperation(_) => codes::UNKNOWN_OPERATION,
            DispatchError::InvalidArguments { .. } => codes::VALIDATION_FAILED,
            DispatchError::Transport { .. } => codes::INTERNAL_ERROR,
        }
    }
}

/// Error codes used across the server
pub mod codes {
    pub const UNKNOWN_OPERATION: &str = "unknown_operation";
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const AUTHORIZATION_REQUIRED: &str = "authorization_required";
    pub const INTERNAL_ERROR: &str = "internal_error";
}
