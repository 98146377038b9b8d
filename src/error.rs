use thiserror::Error;

/// Errors surfaced by the advisory service
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("User must be authenticated")]
    Unauthenticated,

    #[error("Not authorized to access {0}")]
    Authorization(String),

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported language: {0}. Supported languages: en, hi, ta, te")]
    UnsupportedLanguage(String),

    #[error("Text too long: {length} characters (maximum {max})")]
    TextTooLong { length: usize, max: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid AI response: {0}")]
    InvalidAiResponse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    #[error("Failed to create Redis pool: {0}")]
    PoolCreation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AdvisorError>;

/// Externally visible error kinds of the callable protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Unauthenticated,
    PermissionDenied,
    InvalidArgument,
    FailedPrecondition,
    NotFound,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Unauthenticated => "unauthenticated",
            ErrorCode::PermissionDenied => "permission-denied",
            ErrorCode::InvalidArgument => "invalid-argument",
            ErrorCode::FailedPrecondition => "failed-precondition",
            ErrorCode::NotFound => "not-found",
            ErrorCode::Internal => "internal",
        }
    }

    pub fn http_status(&self) -> http::StatusCode {
        match self {
            ErrorCode::Unauthenticated => http::StatusCode::UNAUTHORIZED,
            ErrorCode::PermissionDenied => http::StatusCode::FORBIDDEN,
            ErrorCode::InvalidArgument | ErrorCode::FailedPrecondition => {
                http::StatusCode::BAD_REQUEST
            }
            ErrorCode::NotFound => http::StatusCode::NOT_FOUND,
            ErrorCode::Internal => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl AdvisorError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AdvisorError::Unauthenticated => ErrorCode::Unauthenticated,
            AdvisorError::Authorization(_) => ErrorCode::PermissionDenied,
            AdvisorError::MissingFields(_)
            | AdvisorError::InvalidInput(_)
            | AdvisorError::UnsupportedLanguage(_)
            | AdvisorError::TextTooLong { .. } => ErrorCode::InvalidArgument,
            AdvisorError::Configuration(_) => ErrorCode::FailedPrecondition,
            AdvisorError::NotFound(_) => ErrorCode::NotFound,
            _ => ErrorCode::Internal,
        }
    }

    /// True for failures caused by the caller rather than the service
    pub fn is_client_error(&self) -> bool {
        !matches!(self.code(), ErrorCode::Internal | ErrorCode::FailedPrecondition)
    }
}
