// ABOUTME: Unified error handling for the nutrition core
// ABOUTME: ErrorCode taxonomy, AppError type, and remote response formatting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrikit Project

//! # Unified Error Handling
//!
//! Central error taxonomy shared by the repository, remote client, and
//! aggregator. Non-critical read paths absorb `Unreachable`/`Timeout`
//! internally (cache fallback); critical account operations propagate them.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Validation (3000-3999)
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,
    #[serde(rename = "MISSING_REQUIRED_FIELD")]
    MissingRequiredField = 3001,
    #[serde(rename = "INVALID_TIME_RANGE")]
    InvalidTimeRange = 3002,

    // Resources (4000-4999)
    #[serde(rename = "NOT_FOUND")]
    NotFound = 4000,

    // Remote service (5000-5999)
    #[serde(rename = "UNREACHABLE")]
    Unreachable = 5000,
    #[serde(rename = "TIMEOUT")]
    Timeout = 5001,
    #[serde(rename = "SERVER_REJECTED")]
    ServerRejected = 5002,

    // Configuration (6000-6999)
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 6000,

    // Internal (9000-9999)
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError = 9001,
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError = 9002,
}

impl ErrorCode {
    /// Get the HTTP status code this error maps to when surfaced over the wire
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidInput | Self::MissingRequiredField | Self::InvalidTimeRange => 400,
            Self::NotFound => 404,
            Self::ServerRejected => 502,
            Self::Unreachable | Self::Timeout => 503,
            Self::ConfigError
            | Self::InternalError
            | Self::DatabaseError
            | Self::SerializationError => 500,
        }
    }

    /// Get a user-facing description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidInput => "The provided input is invalid",
            Self::MissingRequiredField => "A required field is missing from the request",
            Self::InvalidTimeRange => "The requested time range is invalid",
            Self::NotFound => "The requested resource was not found",
            Self::Unreachable => "The remote service could not be reached",
            Self::Timeout => "The remote service did not respond in time",
            Self::ServerRejected => "The remote service rejected the request",
            Self::ConfigError => "Configuration error encountered",
            Self::InternalError => "An internal error occurred",
            Self::DatabaseError => "Local store operation failed",
            Self::SerializationError => "Data serialization/deserialization failed",
        }
    }

    /// Whether a call failing with this code may be retried safely
    /// (idempotent reads only; writes are never retried)
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unreachable | Self::Timeout)
    }
}

/// Unified error type for the nutrition core
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new error with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Attach a source error for chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, format!("{} not found", resource.into()))
    }

    /// Remote service unreachable (connection-level failure)
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unreachable, message)
    }

    /// Remote call exceeded its deadline
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, message)
    }

    /// Remote service answered with a non-2xx status
    pub fn server_rejected(status: u16, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ServerRejected,
            format!("remote returned {status}: {}", message.into()),
        )
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Invalid time range (custom range with end before start)
    pub fn invalid_time_range(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidTimeRange, message)
    }

    /// Local store error
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Wire-level error response format used by the remote service
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error payload
    pub error: ErrorResponseDetails,
}

/// Body of a wire-level error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message,
            },
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(ErrorCode::InternalError, error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(ErrorCode::SerializationError, error.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        Self::new(ErrorCode::DatabaseError, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::InvalidTimeRange.http_status(), 400);
        assert_eq!(ErrorCode::NotFound.http_status(), 404);
        assert_eq!(ErrorCode::ServerRejected.http_status(), 502);
        assert_eq!(ErrorCode::Timeout.http_status(), 503);
        assert_eq!(ErrorCode::DatabaseError.http_status(), 500);
    }

    #[test]
    fn test_retryable_codes() {
        assert!(ErrorCode::Unreachable.is_retryable());
        assert!(ErrorCode::Timeout.is_retryable());
        assert!(!ErrorCode::ServerRejected.is_retryable());
        assert!(!ErrorCode::NotFound.is_retryable());
    }

    #[test]
    fn test_error_response_serialization() -> Result<(), serde_json::Error> {
        let error = AppError::server_rejected(409, "email already registered");
        let response = ErrorResponse::from(error);

        let json = serde_json::to_string(&response)?;
        assert!(json.contains("SERVER_REJECTED"));
        assert!(json.contains("email already registered"));
        Ok(())
    }
}
