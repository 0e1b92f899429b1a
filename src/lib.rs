// ABOUTME: Main library entry point for the Nutrikit nutrition-tracking core
// ABOUTME: Metrics engine, profile repository, and progress aggregation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrikit Project

#![deny(unsafe_code)]

//! # Nutrikit Core
//!
//! The computation and data layer of the Nutrikit tracking client: everything
//! below the screens. The UI shell is the composition root - it constructs
//! one repository and one aggregator at startup and injects them into the
//! screens that render their results.
//!
//! ## Architecture
//!
//! Three components, composed bottom-up:
//!
//! - **[`metrics`]**: pure BMR/TDEE/calorie-target/macro/BMI functions with
//!   no I/O and no failure modes
//! - **[`repository`]**: profile and log access over a local SQLite cache
//!   ([`store`]) and the remote authoritative service ([`remote`]),
//!   with write-through local writes and best-effort background sync
//! - **[`progress`]**: per-`(user, range)` progress snapshots with caching
//!   ([`cache`]) and explicit forced refresh
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use nutrikit_core::config::ServerConfig;
//! use nutrikit_core::remote::HttpRemoteClient;
//! use nutrikit_core::repository::ProfileRepository;
//! use nutrikit_core::store::{sqlite::SqliteStore, LocalStore};
//!
//! # async fn compose() -> anyhow::Result<()> {
//! let config = ServerConfig::from_env()?;
//! let store = SqliteStore::new(&config.database_url).await?;
//! let remote = Arc::new(HttpRemoteClient::from_config(&config)?);
//! let repository = ProfileRepository::new(store, remote);
//! # let _ = repository;
//! # Ok(())
//! # }
//! ```

/// Snapshot cache abstraction and in-memory backend
pub mod cache;

/// Environment-driven configuration
pub mod config;

/// Unified error taxonomy
pub mod errors;

/// Structured logging setup
pub mod logging;

/// Pure nutrition metrics engine
pub mod metrics;

/// Core data models
pub mod models;

/// Progress aggregation
pub mod progress;

/// Remote authoritative service contract and HTTP client
pub mod remote;

/// Profile and log repository
pub mod repository;

/// Local persisted store
pub mod store;

pub use errors::{AppError, AppResult, ErrorCode};
pub use models::{MetricSnapshot, ProgressData, TimeRange, UserProfile};
