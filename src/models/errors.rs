//! Centralized Error Handling Module
//!
//! Every failure carries a unique, all-caps kind token plus a human message.
//! Callers branch on the kind, never on message text.
//!
//! Kinds fall into these groups:
//! - Retrieval: MISSING_API_KEY, INVALID_API_KEY, NOT_VERIFIED, NOT_FOUND,
//!   RATE_LIMIT, NETWORK_TIMEOUT, NETWORK_ERROR, INDEXER_ERROR
//! - Analysis: ANALYSIS_PARSE_ERROR, ANALYSIS_FAILED
//! - Input / storage / config / API surface

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Failure kind
    pub code: ErrorCode,
    /// Human-readable message, without the kind prefix
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    /// Whether the user should be sent to credential configuration
    pub fn requires_credential_setup(&self) -> bool {
        self.code.requires_credential_setup()
    }

    /// Whether re-running the same request can succeed
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Failure kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // ============================================
    // Retrieval Errors
    // ============================================
    /// No credential stored for the chain
    MissingApiKey,
    /// Upstream rejected the credential
    InvalidApiKey,
    /// Contract exists but source is not verified
    NotVerified,
    /// No record at the given address
    NotFound,
    /// Upstream signalled throttling
    RateLimit,
    /// Request exceeded the timeout
    NetworkTimeout,
    /// Any other transport failure
    NetworkError,
    /// Upstream returned an uncategorized error payload
    IndexerError,

    // ============================================
    // Analysis Errors
    // ============================================
    /// Model output did not parse against the audit schema
    AnalysisParseError,
    /// Model call failed before producing output
    AnalysisFailed,

    // ============================================
    // Input / Storage / Config
    // ============================================
    /// Address does not match the chain's format
    InvalidAddress,
    /// Key-value substrate failure
    StorageError,
    /// Missing environment variable
    ConfigMissingEnv,
    /// Invalid configuration value
    ConfigInvalidValue,

    // ============================================
    // API Errors
    // ============================================
    /// Invalid request format
    ApiBadRequest,
    /// A scan is already running
    ApiConflict,
    /// Internal server error
    ApiInternalError,
}

impl ErrorCode {
    /// Get the kind token
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingApiKey => "MISSING_API_KEY",
            Self::InvalidApiKey => "INVALID_API_KEY",
            Self::NotVerified => "NOT_VERIFIED",
            Self::NotFound => "NOT_FOUND",
            Self::RateLimit => "RATE_LIMIT",
            Self::NetworkTimeout => "NETWORK_TIMEOUT",
            Self::NetworkError => "NETWORK_ERROR",
            Self::IndexerError => "INDEXER_ERROR",

            Self::AnalysisParseError => "ANALYSIS_PARSE_ERROR",
            Self::AnalysisFailed => "ANALYSIS_FAILED",

            Self::InvalidAddress => "INVALID_ADDRESS",
            Self::StorageError => "STORAGE_ERROR",
            Self::ConfigMissingEnv => "CFG_MISSING_ENV",
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",

            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiConflict => "API_CONFLICT",
            Self::ApiInternalError => "API_INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest | Self::InvalidAddress | Self::ConfigInvalidValue => 400,
            Self::MissingApiKey | Self::InvalidApiKey => 401,
            Self::NotFound => 404,
            Self::ApiConflict => 409,
            Self::NotVerified => 422,
            Self::RateLimit => 429,
            Self::NetworkError | Self::IndexerError | Self::AnalysisFailed => 502,
            Self::NetworkTimeout => 504,
            _ => 500,
        }
    }

    /// Check if a user-initiated retry can reasonably succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkTimeout | Self::NetworkError | Self::RateLimit | Self::AnalysisFailed
        )
    }

    /// Kinds that open the credential settings as a side effect
    pub fn requires_credential_setup(&self) -> bool {
        matches!(self, Self::MissingApiKey | Self::InvalidApiKey)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for ErrorCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    pub fn missing_api_key(chain_name: &str) -> Self {
        Self::new(
            ErrorCode::MissingApiKey,
            format!(
                "Authentication failed. Please configure your {} API Key in the settings panel.",
                chain_name
            ),
        )
    }

    pub fn invalid_api_key(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidApiKey, msg)
    }

    pub fn not_verified(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotVerified, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, msg)
    }

    pub fn rate_limit(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RateLimit, msg)
    }

    pub fn network_timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NetworkTimeout, msg)
    }

    pub fn network_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NetworkError, msg)
    }

    pub fn indexer_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::IndexerError, msg)
    }

    pub fn analysis_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::AnalysisFailed, msg)
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAddress, msg)
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, msg)
    }

    pub fn missing_env(var: &str) -> Self {
        Self::new(
            ErrorCode::ConfigMissingEnv,
            format!("Missing environment variable: {}", var),
        )
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiConflict, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiInternalError, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::StorageError, "IO error", err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorCode::AnalysisParseError,
            format!("Structured response could not be parsed: {}", err),
            err,
        )
    }
}
