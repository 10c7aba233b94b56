//! HTTP implementation of the admin API over `reqwest`

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::UserApi;
use crate::users::{ApiError, ApiResult, AppointmentBatch, NewUser, User};

/// Header carrying the per-request correlation ID
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Connection settings for the admin API
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the admin API (e.g., "http://localhost:8000/admin_api")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000/admin_api".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

/// Admin API client
pub struct HttpUserApi {
    client: Client,
    base_url: String,
}

impl HttpUserApi {
    pub fn new(config: ClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// The health check lives at the server root, not under the API prefix
    fn health_url(&self) -> ApiResult<String> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::Network(format!("Invalid base URL {}: {}", self.base_url, e)))?;
        url.set_path("/healthcheck");
        url.set_query(None);
        Ok(url.to_string())
    }

    /// Send a request and accept the response if `accept(status)` holds
    async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        accept: fn(StatusCode) -> bool,
    ) -> ApiResult<Response> {
        let request_id = uuid::Uuid::new_v4().to_string();

        let response = request
            .header(REQUEST_ID_HEADER, &request_id)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        tracing::debug!(operation, %request_id, %status, "Admin API response");

        if accept(status) {
            Ok(response)
        } else {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(operation, %request_id, %status, "Admin API rejected request");
            Err(ApiError::Server {
                status: status.as_u16(),
                message,
            })
        }
    }
}

fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Network("Request timed out".to_string())
    } else if e.is_connect() {
        ApiError::Network(format!("Connection failed: {}", e))
    } else {
        ApiError::Network(e.to_string())
    }
}

fn is_ok(status: StatusCode) -> bool {
    status == StatusCode::OK
}

fn is_created(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::CREATED
}

fn is_success(status: StatusCode) -> bool {
    status.is_success()
}

#[derive(Debug, Serialize)]
struct CouponIncrement<'a> {
    user_name: &'a str,
    increment: i64,
}

#[async_trait]
impl UserApi for HttpUserApi {
    async fn fetch_users(&self) -> ApiResult<Vec<User>> {
        let request = self.client.get(self.url("/user"));
        let response = self.execute("fetch_users", request, is_ok).await?;

        response
            .json::<Vec<User>>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn patch_user(&self, user: &User) -> ApiResult<()> {
        let request = self.client.patch(self.url("/user")).json(user);
        self.execute("patch_user", request, is_ok).await?;
        Ok(())
    }

    async fn add_user(&self, user: &NewUser) -> ApiResult<()> {
        let request = self.client.put(self.url("/user")).json(user);
        self.execute("add_user", request, is_created).await?;
        Ok(())
    }

    async fn add_appointments(&self, batch: &AppointmentBatch) -> ApiResult<()> {
        let request = self.client.put(self.url("/appointments")).json(batch);
        self.execute("add_appointments", request, is_created).await?;
        Ok(())
    }

    async fn increment_coupons(&self, user_name: &str, increment: i64) -> ApiResult<()> {
        let request = self
            .client
            .patch(self.url("/coupon"))
            .json(&CouponIncrement { user_name, increment });
        self.execute("increment_coupons", request, is_success).await?;
        Ok(())
    }

    async fn health(&self) -> ApiResult<()> {
        let request = self.client.get(self.health_url()?);
        self.execute("health", request, is_success).await?;
        Ok(())
    }
}
