// ABOUTME: Unified error types and result alias shared by every engine module
// ABOUTME: Maps failure classes to codes, retryability, and transport status hints
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Unified Error Handling
//!
//! Every public operation in the engine returns [`AppResult`]. Failures carry a
//! stable [`ErrorCode`] so callers embedding the engine behind an API layer can
//! map them to a transport response without string matching.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Standard error codes used throughout the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Validation (3000-3999)
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,
    #[serde(rename = "VALUE_OUT_OF_RANGE")]
    ValueOutOfRange = 3001,

    // Resource Management (4000-4999)
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound = 4000,
    #[serde(rename = "CONCURRENCY_CONFLICT")]
    ConcurrencyConflict = 4001,

    // External Services (5000-5999)
    #[serde(rename = "UPSTREAM_UNAVAILABLE")]
    UpstreamUnavailable = 5000,

    // Configuration (6000-6999)
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 6000,

    // Internal Errors (9000-9999)
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError = 9001,
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError = 9002,
}

impl ErrorCode {
    /// Get the HTTP status code callers should map this error to
    pub fn http_status(&self) -> u16 {
        match self {
            // 400 Bad Request
            ErrorCode::InvalidInput | ErrorCode::ValueOutOfRange => 400,

            // 404 Not Found
            ErrorCode::ResourceNotFound => 404,

            // 409 Conflict
            ErrorCode::ConcurrencyConflict => 409,

            // 502 Bad Gateway
            ErrorCode::UpstreamUnavailable => 502,

            // 500 Internal Server Error
            ErrorCode::ConfigError
            | ErrorCode::InternalError
            | ErrorCode::DatabaseError
            | ErrorCode::SerializationError => 500,
        }
    }

    /// Whether the same call may succeed if retried without changes
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::ConcurrencyConflict | ErrorCode::UpstreamUnavailable
        )
    }

    /// Get a user-friendly description of this error
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "The provided input is invalid",
            ErrorCode::ValueOutOfRange => "The provided value is outside the acceptable range",
            ErrorCode::ResourceNotFound => "The requested resource was not found",
            ErrorCode::ConcurrencyConflict => {
                "A conflicting update for the same user is in progress"
            }
            ErrorCode::UpstreamUnavailable => "An upstream service is currently unavailable",
            ErrorCode::ConfigError => "Configuration error encountered",
            ErrorCode::InternalError => "An internal error occurred",
            ErrorCode::DatabaseError => "Database operation failed",
            ErrorCode::SerializationError => "Data serialization/deserialization failed",
        }
    }
}

/// Additional context that can be attached to errors
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ErrorContext {
    /// User ID if available
    pub user_id: Option<Uuid>,
    /// Resource ID if applicable
    pub resource_id: Option<String>,
}

/// Unified error type for the engine
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    pub context: ErrorContext,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add a user ID to the error context
    pub fn with_user_id(mut self, user_id: Uuid) -> Self {
        self.context.user_id = Some(user_id);
        self
    }

    /// Add a resource ID to the error context
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.context.resource_id = Some(resource_id.into());
        self
    }

    /// Add a source error for error chaining
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Whether the same call may succeed if retried without changes
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Error payload format for callers that surface engine errors over a wire
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorResponseDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message,
                resource_id: error.context.resource_id,
            },
        }
    }
}

/// Convenience functions for creating common errors
impl AppError {
    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Conflicting concurrent update for the same user
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConcurrencyConflict, message)
    }

    /// Upstream service failed or is unreachable
    pub fn upstream(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::UpstreamUnavailable,
            format!("{}: {}", service.into(), message.into()),
        )
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

/// Conversion from `sqlx::Error`, preserving the not-found distinction
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => AppError::not_found("row"),
            other => AppError::new(ErrorCode::DatabaseError, other.to_string()).with_source(other),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::new(ErrorCode::SerializationError, error.to_string()).with_source(error)
    }
}

/// Conversion from `anyhow::Error` used at the database seam
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::new(ErrorCode::DatabaseError, error.to_string())
    }
}
