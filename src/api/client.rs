use std::time::Duration;

use anyhow::Context;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::db::{helpers::format_date, Database};
use crate::models::StepRecord;

use super::error::ApiError;
use super::models::{
    AuthResponse, LoginRequest, ProfileUpdate, RegisterRequest, SocialLoginRequest, TodaySummary,
    UserProfile, WeeklyEntry,
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// Applied to every call; expiry surfaces as [`ApiError::Timeout`].
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL including the `/api` prefix, without a trailing slash.
    pub base_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Backend client. The bearer token is read from the store on every call,
/// so a login or logout elsewhere takes effect immediately.
#[derive(Clone)]
pub struct ApiClient {
    config: ApiConfig,
    client: Client,
    db: Database,
}

impl ApiClient {
    pub fn new(config: ApiConfig, db: Database) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { config, client, db })
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.db.token().await {
            Ok(Some(token)) => builder.bearer_auth(token),
            Ok(None) => builder,
            Err(err) => {
                log_warn!("Could not read auth token, sending request without it: {err:?}");
                builder
            }
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = self.authorized(builder).await.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = backend_message(&text).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized { message });
        }

        Err(ApiError::Status {
            status: status.as_u16(),
            message,
            retryable: status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS,
        })
    }

    async fn decode<T: DeserializeOwned>(
        response: Response,
        what: &'static str,
    ) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|source| ApiError::Decode { what, source })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        what: &'static str,
    ) -> Result<T, ApiError> {
        log_debug!("GET {path}");
        let response = self.send(self.client.get(self.url(path))).await?;
        Self::decode(response, what).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        what: &'static str,
    ) -> Result<T, ApiError> {
        log_debug!("POST {path}");
        let response = self
            .send(self.client.post(self.url(path)).json(body))
            .await?;
        Self::decode(response, what).await
    }

    pub async fn me(&self) -> Result<UserProfile, ApiError> {
        self.get_json("/user/me", "user profile").await
    }

    pub async fn steps_for_date(&self, date: NaiveDate) -> Result<TodaySummary, ApiError> {
        log_debug!("GET /user/steps?date={date}");
        let request = self
            .client
            .get(self.url("/user/steps"))
            .query(&[("date", format_date(date))]);
        let response = self.send(request).await?;

        // An empty body or `null` means no steps recorded for that day.
        let text = response.text().await?;
        if text.trim().is_empty() || text.trim() == "null" {
            return Ok(TodaySummary::default());
        }
        serde_json::from_str(&text).map_err(|source| ApiError::Decode {
            what: "daily steps",
            source,
        })
    }

    pub async fn weekly_steps(&self) -> Result<Vec<WeeklyEntry>, ApiError> {
        let value: serde_json::Value = self.get_json("/user/steps/weekly", "weekly steps").await?;
        // Anything other than an array is treated as "no data".
        if !value.is_array() {
            return Ok(Vec::new());
        }
        serde_json::from_value(value).map_err(|source| ApiError::Decode {
            what: "weekly steps",
            source,
        })
    }

    pub async fn record_steps(&self, record: &StepRecord) -> Result<(), ApiError> {
        log_debug!("POST /user/steps");
        self.send(self.client.post(self.url("/user/steps")).json(record))
            .await?;
        Ok(())
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.post_json("/auth/login", request, "login response").await
    }

    pub async fn social_login(
        &self,
        request: &SocialLoginRequest,
    ) -> Result<AuthResponse, ApiError> {
        self.post_json("/auth/social-login", request, "social login response")
            .await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.post_json("/auth/register", request, "register response")
            .await
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        self.send(self.client.post(self.url("/auth/logout"))).await?;
        Ok(())
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ApiError> {
        log_debug!("PUT /user/profile");
        self.send(self.client.put(self.url("/user/profile")).json(update))
            .await?;
        Ok(())
    }
}

/// The backend reports failures as `{"message": "..."}`.
fn backend_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(str::to_string)
}
