// ABOUTME: Configuration management module for the nutrition core
// ABOUTME: Environment-variable driven settings for the remote API, store, and logging
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrikit Project

//! Configuration module
//!
//! Environment-only configuration: the remote base URL, the optional food
//! catalogue API key, HTTP timeouts, and the local database URL are all
//! overridable at deploy time and never part of the runtime API.

/// Environment and deployment configuration
pub mod environment;

pub use environment::{LogLevel, ServerConfig};
