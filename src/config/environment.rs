// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses NUTRIKIT_* environment variables with documented defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrikit Project

//! Environment-based configuration management

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Default remote API base URL (local development server)
const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000/";

/// Default local database URL
const DEFAULT_DATABASE_URL: &str = "sqlite:nutrikit.db";

/// Default overall read deadline in seconds
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 8;

/// Allowed read-deadline window in seconds
const HTTP_TIMEOUT_RANGE_SECS: (u64, u64) = (5, 10);

/// Strongly typed log level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Default operational logging
    #[default]
    Info,
    /// Verbose diagnostics
    Debug,
    /// Full tracing output
    Trace,
}

impl LogLevel {
    /// Convert to `tracing::Level`
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }

    /// Parse from string with fallback to `Info`
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }
}

/// Deployment configuration for the nutrition core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Remote service base URL
    pub api_base_url: String,
    /// Third-party food catalogue API key, if provisioned
    pub catalog_api_key: Option<String>,
    /// Overall deadline for remote reads, clamped to the 5-10 s window
    pub http_timeout_secs: u64,
    /// Local cache database URL
    pub database_url: String,
    /// Log level
    pub log_level: LogLevel,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            catalog_api_key: None,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            database_url: DEFAULT_DATABASE_URL.to_owned(),
            log_level: LogLevel::Info,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Every setting has a documented default; the function only fails when
    /// a set variable cannot be parsed.
    ///
    /// # Errors
    ///
    /// Returns an error if `NUTRIKIT_HTTP_TIMEOUT_SECS` is set but is not an
    /// integer
    pub fn from_env() -> Result<Self> {
        let http_timeout_secs = match env::var("NUTRIKIT_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .map_err(|e| anyhow::anyhow!("invalid NUTRIKIT_HTTP_TIMEOUT_SECS '{raw}': {e}"))?
                .clamp(HTTP_TIMEOUT_RANGE_SECS.0, HTTP_TIMEOUT_RANGE_SECS.1),
            Err(_) => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            api_base_url: env_or_default("NUTRIKIT_API_BASE_URL", DEFAULT_API_BASE_URL),
            catalog_api_key: env::var("NUTRIKIT_CATALOG_API_KEY").ok(),
            http_timeout_secs,
            database_url: env_or_default("NUTRIKIT_DATABASE_URL", DEFAULT_DATABASE_URL),
            log_level: LogLevel::from_str_or_default(
                &env_or_default("NUTRIKIT_LOG_LEVEL", "info"),
            ),
        })
    }
}

fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}
