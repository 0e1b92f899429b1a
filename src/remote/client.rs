// ABOUTME: reqwest-based implementation of the RemoteApi contract
// ABOUTME: Shared pooled client, per-call deadlines, one-retry policy for idempotent reads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrikit Project

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;
use uuid::Uuid;

use super::{DailyGoalRequest, DailyGoalResponse, LoginRequest, RegisterRequest, RemoteApi};
use crate::config::environment::ServerConfig;
use crate::errors::{AppError, AppResult, ErrorResponse};
use crate::models::{
    sanitize_json, ExerciseLog, FoodItem, FoodLog, LogKind, NutritionGoal, ProfilePatch,
    UserProfile, WeightLog,
};

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 8;

/// Default connection timeout in seconds
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Backoff before the single retry of an idempotent read
const RETRY_BACKOFF: Duration = Duration::from_millis(300);

/// Configured timeout values for the shared client
static CLIENT_TIMEOUTS: OnceLock<(u64, u64)> = OnceLock::new();

/// Global shared HTTP client with configured timeouts
static SHARED_CLIENT: OnceLock<Client> = OnceLock::new();

/// Initialize the shared HTTP client timeout configuration
///
/// Must be called once at startup before the first client is created. If not
/// called, reasonable defaults are used (8 s timeout, 5 s connect timeout).
pub fn initialize_shared_client(timeout_secs: u64, connect_timeout_secs: u64) {
    let _ = CLIENT_TIMEOUTS.set((timeout_secs, connect_timeout_secs));
}

/// Get the shared HTTP client for remote API calls
///
/// The client uses connection pooling and the configured timeouts. Falls back
/// to defaults when `initialize_shared_client()` was not called.
pub fn shared_client() -> &'static Client {
    SHARED_CLIENT.get_or_init(|| {
        let (timeout, connect_timeout) = CLIENT_TIMEOUTS
            .get()
            .copied()
            .unwrap_or((DEFAULT_TIMEOUT_SECS, DEFAULT_CONNECT_TIMEOUT_SECS));

        ClientBuilder::new()
            .timeout(Duration::from_secs(timeout))
            .connect_timeout(Duration::from_secs(connect_timeout))
            .build()
            .unwrap_or_else(|_| Client::new())
    })
}

/// HTTP client for the authoritative nutrition service
#[derive(Clone)]
pub struct HttpRemoteClient {
    client: Client,
    base_url: Url,
    catalog_api_key: Option<String>,
    read_timeout: Duration,
}

impl HttpRemoteClient {
    /// Build a client from environment-derived configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the base URL does not parse
    pub fn from_config(config: &ServerConfig) -> AppResult<Self> {
        initialize_shared_client(config.http_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
        Self::new(
            &config.api_base_url,
            config.catalog_api_key.clone(),
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    /// Build a client against an explicit base URL
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the base URL does not parse
    pub fn new(
        base_url: &str,
        catalog_api_key: Option<String>,
        read_timeout: Duration,
    ) -> AppResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::config(format!("invalid API base URL '{base_url}': {e}")))?;
        Ok(Self {
            client: shared_client().clone(),
            base_url,
            catalog_api_key,
            read_timeout,
        })
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| AppError::internal(format!("invalid endpoint path '{path}': {e}")))
    }

    /// Map a transport-level reqwest failure onto the error taxonomy
    fn map_transport_error(error: &reqwest::Error, url: &Url) -> AppError {
        if error.is_timeout() {
            AppError::timeout(format!("request to {url} timed out"))
        } else {
            AppError::unreachable(format!("request to {url} failed: {error}"))
        }
    }

    /// Handle non-success API responses
    fn handle_api_error(status: StatusCode, text: &str, url: &Url) -> AppError {
        error!(
            "remote request failed - status: {status}, url: {url}, body_length: {} bytes",
            text.len()
        );

        if status == StatusCode::NOT_FOUND {
            return AppError::not_found(url.path().to_owned());
        }

        // Prefer the structured error body when the service provides one
        if let Ok(body) = serde_json::from_str::<ErrorResponse>(text) {
            return AppError::server_rejected(status.as_u16(), body.error.message);
        }

        AppError::server_rejected(status.as_u16(), text.to_owned())
    }

    /// Parse a successful response or map the failure
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
        url: &Url,
    ) -> AppResult<T> {
        let status = response.status();
        debug!("received HTTP response with status: {status}");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Self::handle_api_error(status, &text, url));
        }

        // Strip nulls before deserializing: absent and null are
        // indistinguishable to callers (sanitization policy)
        let raw: serde_json::Value = response.json().await.map_err(|e| {
            error!("failed to parse JSON response from {url}: {e}");
            AppError::server_rejected(status.as_u16(), format!("malformed response body: {e}"))
        })?;
        Ok(serde_json::from_value(sanitize_json(raw))?)
    }

    /// Run a request future under the configured deadline
    async fn with_deadline<T, F>(&self, url: &Url, fut: F) -> AppResult<T>
    where
        F: Future<Output = Result<reqwest::Response, reqwest::Error>> + Send,
        T: DeserializeOwned,
    {
        let response = tokio::time::timeout(self.read_timeout, fut)
            .await
            .map_err(|_| AppError::timeout(format!("request to {url} exceeded deadline")))?
            .map_err(|e| Self::map_transport_error(&e, url))?;
        Self::parse_response(response, url).await
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url.clone());
        // Catalogue lookups carry the third-party API key when configured
        if url.path().starts_with("/foods") {
            if let Some(key) = &self.catalog_api_key {
                return builder.header("x-api-key", key);
            }
        }
        builder
    }

    /// GET with the single-retry policy for idempotent reads
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let first = self
            .with_deadline(
                &url,
                self.request(Method::GET, url.clone()).query(query).send(),
            )
            .await;

        match first {
            Err(e) if e.code.is_retryable() => {
                debug!("retrying GET {url} after {}ms: {e}", RETRY_BACKOFF.as_millis());
                tokio::time::sleep(RETRY_BACKOFF).await;
                self.with_deadline(
                    &url,
                    self.request(Method::GET, url.clone()).query(query).send(),
                )
                .await
            }
            other => other,
        }
    }

    /// Single-attempt write (no retry, to avoid duplicate remote side effects)
    async fn send_json<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> AppResult<T> {
        let mut builder = self.request(method, url.clone());
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.with_deadline(&url, builder.send()).await
    }

    /// Write returning no payload
    async fn send_no_content<B: Serialize + Sync>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> AppResult<()> {
        let mut builder = self.request(method, url.clone());
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = tokio::time::timeout(self.read_timeout, builder.send())
            .await
            .map_err(|_| AppError::timeout(format!("request to {url} exceeded deadline")))?
            .map_err(|e| Self::map_transport_error(&e, &url))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Self::handle_api_error(status, &text, &url));
        }
        Ok(())
    }

    fn range_query(
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<(&'static str, String)> {
        vec![
            ("user_id", user_id.to_string()),
            ("from", start.to_rfc3339()),
            ("to", end.to_rfc3339()),
        ]
    }
}

#[async_trait]
impl RemoteApi for HttpRemoteClient {
    async fn login(&self, request: &LoginRequest) -> AppResult<UserProfile> {
        let url = self.endpoint("login")?;
        self.send_json(Method::POST, url, Some(request)).await
    }

    async fn register(&self, request: &RegisterRequest) -> AppResult<UserProfile> {
        let url = self.endpoint("register")?;
        self.send_json(Method::POST, url, Some(request)).await
    }

    async fn delete_user(&self, user_id: Uuid) -> AppResult<()> {
        let url = self.endpoint(&format!("user/{user_id}"))?;
        self.send_no_content::<()>(Method::DELETE, url, None).await
    }

    async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let url = self.endpoint(&format!("user/{user_id}"))?;
        let body = serde_json::json!({
            "old_password": old_password,
            "new_password": new_password,
        });
        self.send_no_content(Method::PUT, url, Some(&body)).await
    }

    async fn change_email(&self, user_id: Uuid, new_email: &str) -> AppResult<()> {
        let url = self.endpoint(&format!("user/{user_id}"))?;
        let body = serde_json::json!({ "email": new_email });
        self.send_no_content(Method::PUT, url, Some(&body)).await
    }

    async fn fetch_user(&self, user_id: Uuid) -> AppResult<UserProfile> {
        let url = self.endpoint(&format!("user/{user_id}"))?;
        self.get_json(url, &[]).await
    }

    async fn update_user(&self, user_id: Uuid, patch: &ProfilePatch) -> AppResult<()> {
        let url = self.endpoint(&format!("user/{user_id}"))?;
        self.send_no_content(Method::PUT, url, Some(patch)).await
    }

    async fn push_food_log(&self, entry: &FoodLog) -> AppResult<()> {
        let url = self.endpoint("log/food")?;
        self.send_no_content(Method::POST, url, Some(entry)).await
    }

    async fn push_exercise_log(&self, entry: &ExerciseLog) -> AppResult<()> {
        let url = self.endpoint("log/exercise")?;
        self.send_no_content(Method::POST, url, Some(entry)).await
    }

    async fn push_weight_log(&self, entry: &WeightLog) -> AppResult<()> {
        let url = self.endpoint("log/weight")?;
        self.send_no_content(Method::POST, url, Some(entry)).await
    }

    async fn delete_log(&self, kind: LogKind, entry_id: Uuid) -> AppResult<()> {
        let url = self.endpoint(&format!("log/{kind}/{entry_id}"))?;
        self.send_no_content::<()>(Method::DELETE, url, None).await
    }

    async fn fetch_food_logs(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<FoodLog>> {
        let url = self.endpoint("log/food")?;
        self.get_json(url, &Self::range_query(user_id, start, end))
            .await
    }

    async fn fetch_exercise_logs(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<ExerciseLog>> {
        let url = self.endpoint("log/exercise")?;
        self.get_json(url, &Self::range_query(user_id, start, end))
            .await
    }

    async fn fetch_weight_logs(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<WeightLog>> {
        let url = self.endpoint("log/weight")?;
        self.get_json(url, &Self::range_query(user_id, start, end))
            .await
    }

    async fn calculate_daily_goal(&self, request: &DailyGoalRequest) -> AppResult<f64> {
        let url = self.endpoint("calculate/daily_goal")?;
        let response: DailyGoalResponse = self.send_json(Method::POST, url, Some(request)).await?;
        Ok(response.daily_calorie_goal)
    }

    async fn search_foods(&self, query: &str) -> AppResult<Vec<FoodItem>> {
        let url = self.endpoint("foods/search")?;
        self.get_json(url, &[("q", query.to_owned())]).await
    }

    async fn food_info(&self, food_id: &str) -> AppResult<FoodItem> {
        let url = self.endpoint("foods/info")?;
        self.get_json(url, &[("id", food_id.to_owned())]).await
    }

    async fn recommend_foods(&self, goal: NutritionGoal) -> AppResult<Vec<FoodItem>> {
        let url = self.endpoint("foods/recommend")?;
        self.get_json(url, &[("goal", goal.as_str().to_owned())])
            .await
    }
}
